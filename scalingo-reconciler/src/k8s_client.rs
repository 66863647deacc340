//! Kubernetes-backed resource and secret stores

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret as CoreSecret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use kube::api::{Api, PostParams};
use kube::{Client, ResourceExt};
use scalingo_models::Secret;
use std::collections::BTreeMap;
use tracing::debug;

use crate::crd::PostgreSQL;
use crate::store::{ResourceStore, SecretStore, StoreError};

/// Get a Kubernetes client
pub async fn get_k8s_client() -> Result<Client> {
    Client::try_default()
        .await
        .context("Failed to create Kubernetes client")
}

fn store_error(err: kube::Error, object: &str) -> StoreError {
    match err {
        kube::Error::Api(response) if response.code == 409 => StoreError::Conflict(object.to_string()),
        kube::Error::Api(response) if response.code == 404 => StoreError::NotFound(object.to_string()),
        other => StoreError::Kube(other),
    }
}

/// PostgreSQL resources through the API server
#[derive(Clone)]
pub struct KubeResourceStore {
    client: Client,
}

impl KubeResourceStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api_for(&self, pg: &PostgreSQL) -> Result<(Api<PostgreSQL>, String), StoreError> {
        let namespace = pg
            .namespace()
            .ok_or_else(|| StoreError::InvalidData(format!("{} has no namespace", pg.name_any())))?;
        let key = format!("{}/{}", namespace, pg.name_any());
        Ok((Api::namespaced(self.client.clone(), &namespace), key))
    }
}

#[async_trait]
impl ResourceStore for KubeResourceStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<PostgreSQL>, StoreError> {
        let api: Api<PostgreSQL> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| store_error(e, &format!("{namespace}/{name}")))
    }

    async fn update(&self, resource: &PostgreSQL) -> Result<PostgreSQL, StoreError> {
        let (api, key) = self.api_for(resource)?;
        debug!(resource = %key, "Replacing resource");
        api.replace(&resource.name_any(), &PostParams::default(), resource)
            .await
            .map_err(|e| store_error(e, &key))
    }

    async fn update_status(&self, resource: &PostgreSQL) -> Result<PostgreSQL, StoreError> {
        let (api, key) = self.api_for(resource)?;
        debug!(resource = %key, "Replacing resource status");
        let data = serde_json::to_vec(resource)?;
        api.replace_status(&resource.name_any(), &PostParams::default(), data)
            .await
            .map_err(|e| store_error(e, &key))
    }
}

/// Core secrets through the API server
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn merge_owner(refs: &mut Vec<OwnerReference>, owner: OwnerReference) {
    if !refs.iter().any(|existing| existing.uid == owner.uid) {
        refs.push(owner);
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<String, StoreError> {
        let object = format!("secret {namespace}/{name}");
        let api: Api<CoreSecret> = Api::namespaced(self.client.clone(), namespace);

        let secret = api
            .get_opt(name)
            .await
            .map_err(|e| store_error(e, &object))?
            .ok_or_else(|| StoreError::NotFound(object.clone()))?;

        let value = secret
            .data
            .as_ref()
            .and_then(|data| data.get(key))
            .ok_or_else(|| StoreError::InvalidData(format!("{object} has no key {key}")))?;

        String::from_utf8(value.0.clone())
            .map_err(|_| StoreError::InvalidData(format!("{object} key {key} is not utf-8")))
    }

    async fn set(&self, secret: &Secret, owner: Option<OwnerReference>) -> Result<(), StoreError> {
        let object = format!("secret {}/{}", secret.namespace, secret.name);
        let api: Api<CoreSecret> = Api::namespaced(self.client.clone(), &secret.namespace);
        let value = ByteString(secret.value.clone().into_bytes());

        match api.get_opt(&secret.name).await.map_err(|e| store_error(e, &object))? {
            Some(mut existing) => {
                existing
                    .data
                    .get_or_insert_with(BTreeMap::new)
                    .insert(secret.key.clone(), value);
                if let Some(owner) = owner {
                    merge_owner(existing.owner_references_mut(), owner);
                }
                debug!(secret = %secret, "Updating secret");
                api.replace(&secret.name, &PostParams::default(), &existing)
                    .await
                    .map_err(|e| store_error(e, &object))?;
            }
            None => {
                let created = CoreSecret {
                    metadata: ObjectMeta {
                        name: Some(secret.name.clone()),
                        namespace: Some(secret.namespace.clone()),
                        owner_references: owner.map(|owner| vec![owner]),
                        ..Default::default()
                    },
                    data: Some(BTreeMap::from([(secret.key.clone(), value)])),
                    type_: Some("Opaque".to_string()),
                    ..Default::default()
                };
                debug!(secret = %secret, "Creating secret");
                api.create(&PostParams::default(), &created)
                    .await
                    .map_err(|e| store_error(e, &object))?;
            }
        }
        Ok(())
    }
}

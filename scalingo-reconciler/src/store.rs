//! Capabilities consumed from the declarative resource store

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use scalingo_models::Secret;
use thiserror::Error;

use crate::crd::PostgreSQL;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The object changed since it was read
    #[error("conflict writing {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Kube(#[from] kube::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// Reads and writes PostgreSQL resources.
///
/// Writes are compare-and-swap on the resource version carried by the
/// object and return the stored object with its new version.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<PostgreSQL>, StoreError>;

    /// Persists metadata and spec
    async fn update(&self, resource: &PostgreSQL) -> Result<PostgreSQL, StoreError>;

    /// Persists the status sub-resource
    async fn update_status(&self, resource: &PostgreSQL) -> Result<PostgreSQL, StoreError>;
}

/// Reads and writes single keys of namespaced secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<String, StoreError>;

    /// Creates the secret or updates the one key, leaving other keys untouched
    async fn set(&self, secret: &Secret, owner: Option<OwnerReference>) -> Result<(), StoreError>;
}

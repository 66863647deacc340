//! Validated access to the secret store

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use scalingo_models::Secret;

use crate::error::{Error, Result, WrapErr};
use crate::store::SecretStore;

fn require(value: &str, field: &'static str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Empty(field));
    }
    Ok(())
}

/// Reads one key of a secret
pub async fn get_secret(
    store: &dyn SecretStore,
    namespace: &str,
    name: &str,
    key: &str,
) -> Result<String> {
    require(namespace, "namespace")?;
    require(name, "name")?;
    require(key, "key")?;

    store.get(namespace, name, key).await.wrap("get secret")
}

/// Creates or updates one key of a secret, owned by `owner` when given
pub async fn set_secret(
    store: &dyn SecretStore,
    secret: &Secret,
    owner: Option<OwnerReference>,
) -> Result<()> {
    require(&secret.namespace, "namespace")?;
    require(&secret.name, "name")?;
    require(&secret.key, "key")?;
    require(&secret.value, "value")?;

    store.set(secret, owner).await.wrap("create or update secret")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSecretStore;

    #[tokio::test]
    async fn test_get_secret_rejects_empty_fields() {
        let store = FakeSecretStore::default();

        let err = get_secret(&store, "", "auth", "token").await.unwrap_err();
        assert_eq!(err.to_string(), "empty namespace");
        let err = get_secret(&store, "default", "", "token").await.unwrap_err();
        assert_eq!(err.to_string(), "empty name");
        let err = get_secret(&store, "default", "auth", "").await.unwrap_err();
        assert_eq!(err.to_string(), "empty key");
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = FakeSecretStore::default();
        let secret = Secret {
            namespace: "default".to_string(),
            name: "pg-conn".to_string(),
            key: "DB_URL".to_string(),
            value: "postgres://db".to_string(),
        };

        set_secret(&store, &secret, None).await.unwrap();
        let value = get_secret(&store, "default", "pg-conn", "DB_URL").await.unwrap();
        assert_eq!(value, "postgres://db");
    }

    #[tokio::test]
    async fn test_set_secret_rejects_empty_value() {
        let store = FakeSecretStore::default();
        let secret = Secret {
            namespace: "default".to_string(),
            name: "pg-conn".to_string(),
            key: "DB_URL".to_string(),
            value: String::new(),
        };

        let err = set_secret(&store, &secret, None).await.unwrap_err();
        assert_eq!(err.to_string(), "empty value");
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret_is_not_found() {
        let store = FakeSecretStore::default();
        let err = get_secret(&store, "default", "missing", "token").await.unwrap_err();
        assert!(err.is_not_found());
    }
}

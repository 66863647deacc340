//! Capabilities consumed from the database provider

use async_trait::async_trait;
use scalingo_models::{Database, FeatureStatus, FirewallRule, ValidationError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("http transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("feature {name} failed: {message}")]
    FeatureFailed { name: String, message: String },

    #[error("empty token")]
    EmptyToken,

    #[error("{0}")]
    Other(String),
}

/// Remote database, firewall, feature and variable operations.
///
/// One implementation per backend API version. Calls are plain round trips:
/// no retry and no timeout handling happens behind this trait.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn create_database(&self, db: &Database) -> Result<Database, ProviderError>;

    async fn get_database(&self, db_id: &str) -> Result<Database, ProviderError>;

    /// Requests a plan change. The database re-enters provisioning afterwards.
    async fn update_database_plan(&self, db: &Database) -> Result<(), ProviderError>;

    async fn delete_database(&self, db_id: &str) -> Result<(), ProviderError>;

    async fn create_firewall_rule(
        &self,
        db_id: &str,
        addon_id: &str,
        rule: &FirewallRule,
    ) -> Result<(), ProviderError>;

    async fn list_firewall_rules(
        &self,
        db_id: &str,
        addon_id: &str,
    ) -> Result<Vec<FirewallRule>, ProviderError>;

    async fn delete_firewall_rule(
        &self,
        db_id: &str,
        addon_id: &str,
        rule_id: &str,
    ) -> Result<(), ProviderError>;

    async fn enable_database_feature(
        &self,
        db: &Database,
        feature: &str,
    ) -> Result<FeatureStatus, ProviderError>;

    async fn disable_database_feature(
        &self,
        db: &Database,
        feature: &str,
    ) -> Result<FeatureStatus, ProviderError>;

    async fn find_application_variable(
        &self,
        app_id: &str,
        name: &str,
    ) -> Result<String, ProviderError>;
}

/// Builds an authenticated client for one API token and region.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    async fn connect(
        &self,
        api_token: &str,
        region: &str,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError>;
}

//! Scalingo HTTP backend
//!
//! [`ScalingoFactory`] hands out one [`v1::Client`] per API token and region.
//! Endpoints follow the region unless overridden by configuration.

pub mod v1;

pub use v1::Client;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::provider::{ProviderClient, ProviderError, ProviderFactory};

pub const STAGING_REGION: &str = "osc-st-fr1";
const DEFAULT_AUTH_URL: &str = "https://auth.scalingo.com";
const STAGING_AUTH_URL: &str = "https://auth.st-sc.fr";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("scalingo-operator/", env!("CARGO_PKG_VERSION"));

/// Base URLs of the three Scalingo services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub api: String,
    pub db_api: String,
}

impl Endpoints {
    pub fn for_region(region: &str) -> Self {
        let auth = if region == STAGING_REGION {
            STAGING_AUTH_URL
        } else {
            DEFAULT_AUTH_URL
        };
        Self {
            auth: auth.to_string(),
            api: format!("https://api.{region}.scalingo.com"),
            db_api: format!("https://db-api.{region}.scalingo.com"),
        }
    }

    pub fn with_overrides(mut self, overrides: &EndpointOverrides) -> Self {
        if let Some(url) = &overrides.auth_url {
            self.auth = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = &overrides.api_url {
            self.api = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = &overrides.db_api_url {
            self.db_api = url.trim_end_matches('/').to_string();
        }
        self
    }
}

/// Fixed endpoints that take precedence over the region-derived ones
#[derive(Debug, Clone, Default)]
pub struct EndpointOverrides {
    pub auth_url: Option<String>,
    pub api_url: Option<String>,
    pub db_api_url: Option<String>,
}

/// Shares one HTTP connection pool between all clients it builds
pub struct ScalingoFactory {
    http: reqwest::Client,
    overrides: EndpointOverrides,
}

impl ScalingoFactory {
    pub fn new(overrides: EndpointOverrides) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self { http, overrides })
    }
}

#[async_trait]
impl ProviderFactory for ScalingoFactory {
    async fn connect(
        &self,
        api_token: &str,
        region: &str,
    ) -> Result<Arc<dyn ProviderClient>, ProviderError> {
        if api_token.is_empty() {
            return Err(ProviderError::EmptyToken);
        }
        if region.is_empty() {
            return Err(ProviderError::Other("empty region".to_string()));
        }

        let endpoints = Endpoints::for_region(region).with_overrides(&self.overrides);
        let client: Arc<dyn ProviderClient> =
            Arc::new(Client::new(self.http.clone(), api_token, endpoints));
        Ok(client)
    }
}

use anyhow::{Context, Result};
use scalingo_reconciler::scalingo::EndpointOverrides;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub health_port: u16,
    pub requeue_delay: Duration,
    pub error_requeue_delay: Duration,
    /// Watch a single namespace instead of the whole cluster
    pub watch_namespace: Option<String>,
    pub endpoints: EndpointOverrides,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| get(key).filter(|value| !value.is_empty());
        let seconds = |key: &str, default: u64| -> Result<Duration> {
            match non_empty(key) {
                Some(value) => value
                    .parse()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{key} must be a number of seconds")),
                None => Ok(Duration::from_secs(default)),
            }
        };

        Ok(Self {
            health_port: non_empty("HEALTH_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("HEALTH_PORT must be a valid port number")?,
            requeue_delay: seconds("REQUEUE_DELAY_SECONDS", 30)?,
            error_requeue_delay: seconds("ERROR_REQUEUE_SECONDS", 15)?,
            watch_namespace: non_empty("WATCH_NAMESPACE"),
            endpoints: EndpointOverrides {
                auth_url: non_empty("SCALINGO_AUTH_URL"),
                api_url: non_empty("SCALINGO_API_URL"),
                db_api_url: non_empty("SCALINGO_DB_API_URL"),
            },
        })
    }
}

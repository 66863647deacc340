//! Public internet access through database features
//!
//! Public access is the `publicly-available` feature, which the provider only
//! accepts once `force-ssl` is on. `force-ssl` is never turned off here.

use scalingo_models::{features, Database, FeatureStatus};
use tracing::info;

use crate::error::{Result, WrapErr};
use crate::provider::{ProviderClient, ProviderError};

/// (force-ssl on, publicly-available on), Pending counting as on
fn internet_access_state(db: &Database) -> (bool, bool) {
    (
        db.features.is_active(features::FORCE_SSL),
        db.features.is_active(features::PUBLICLY_AVAILABLE),
    )
}

async fn enable(client: &dyn ProviderClient, db: &Database, feature: &str) -> Result<()> {
    info!(feature, "Enable database feature");
    let action = format!("enable feature {feature}");
    let status = client.enable_database_feature(db, feature).await.wrap(action.clone())?;
    if status == FeatureStatus::Failed {
        return Err(ProviderError::FeatureFailed {
            name: feature.to_string(),
            message: format!("provider reported status {status}"),
        })
        .wrap(action);
    }
    Ok(())
}

/// Turns public access on or off. Returns whether a toggle was issued.
pub(crate) async fn update_internet_access(
    client: &dyn ProviderClient,
    current: &Database,
    expected_enabled: bool,
) -> Result<bool> {
    let (force_ssl, enabled) = internet_access_state(current);
    if enabled == expected_enabled {
        return Ok(false);
    }

    if expected_enabled {
        if !force_ssl {
            enable(client, current, features::FORCE_SSL).await?;
        }
        enable(client, current, features::PUBLICLY_AVAILABLE).await?;
    } else {
        info!(feature = features::PUBLICLY_AVAILABLE, "Disable database feature");
        client
            .disable_database_feature(current, features::PUBLICLY_AVAILABLE)
            .await
            .wrap(format!("disable feature {}", features::PUBLICLY_AVAILABLE))?;
    }
    Ok(true)
}

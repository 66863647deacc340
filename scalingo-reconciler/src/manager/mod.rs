//! Database manager
//!
//! Converges one remote database towards a desired [`Database`]. The manager
//! is stateless and reentrant: every call re-reads remote state.

mod firewall;
mod internet_access;

pub use firewall::{diff_rules, RuleAction};

use scalingo_models::{features, Database, DatabaseType, DatabaseUrl};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{Error, Result, WrapErr};
use crate::provider::ProviderClient;

/// Result of [`Manager::update_database`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Remote state already matched
    Unchanged,
    /// Features or firewall rules were changed
    Updated,
    /// A plan change was accepted; the database is provisioning again
    Provisioning,
}

pub struct Manager {
    db_type: DatabaseType,
    client: Arc<dyn ProviderClient>,
}

impl Manager {
    pub fn new(db_type: DatabaseType, client: Arc<dyn ProviderClient>) -> Self {
        Self { db_type, client }
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    pub async fn create_database(&self, desired: &Database) -> Result<Database> {
        desired.validate_type()?;
        info!(name = %desired.name, plan = %desired.plan, "Creating database");
        self.client.create_database(desired).await.wrap("create database")
    }

    /// Fetches the database and its firewall rules
    pub async fn get_database(&self, db_id: &str) -> Result<Database> {
        if db_id.is_empty() {
            return Err(Error::Empty("database id"));
        }

        let mut db = self.client.get_database(db_id).await.wrap("get database")?;
        if db.addon_id.is_empty() {
            return Err(Error::Empty("addon id"));
        }

        db.firewall_rules = self
            .client
            .list_firewall_rules(&db.id, &db.addon_id)
            .await
            .wrap("list firewall rules")?;
        Ok(db)
    }

    /// Looks up the connection URL on the database's application
    pub async fn get_database_url(&self, db: &Database) -> Result<DatabaseUrl> {
        let name = db.validate_type()?.url_variable_name();
        if db.app_id.is_empty() {
            return Err(Error::Empty("application id"));
        }

        let value = self
            .client
            .find_application_variable(&db.app_id, name)
            .await
            .wrap("find application variable")?;
        Ok(DatabaseUrl {
            name: name.to_string(),
            value,
        })
    }

    /// Converges features, then firewall rules, then the plan.
    pub async fn update_database(&self, db_id: &str, desired: &Database) -> Result<UpdateOutcome> {
        let current = self.get_database(db_id).await.wrap("get current database")?;

        let expected_public = desired.features.is_active(features::PUBLICLY_AVAILABLE);
        let features_changed =
            internet_access::update_internet_access(self.client.as_ref(), &current, expected_public)
                .await
                .wrap("update internet access")?;

        let rules_changed =
            firewall::update_firewall_rules(self.client.as_ref(), &current, &desired.firewall_rules)
                .await
                .wrap("update firewall rules")?;

        if self.update_database_plan(&current, desired).await? {
            return Ok(UpdateOutcome::Provisioning);
        }

        if features_changed || rules_changed {
            Ok(UpdateOutcome::Updated)
        } else {
            debug!(db_id, "Database already up to date");
            Ok(UpdateOutcome::Unchanged)
        }
    }

    /// Returns true when a plan change was issued
    async fn update_database_plan(&self, current: &Database, desired: &Database) -> Result<bool> {
        if current.plan == desired.plan {
            return Ok(false);
        }

        if !current.is_running() {
            return Err(Error::Precondition(format!(
                "invalid status {} for plan update",
                current.status
            )));
        }

        info!(db_id = %current.id, from = %current.plan, to = %desired.plan, "Updating database plan");
        let target = Database {
            plan: desired.plan.clone(),
            ..current.clone()
        };
        self.client
            .update_database_plan(&target)
            .await
            .wrap("update database plan")?;
        Ok(true)
    }

    pub async fn delete_database(&self, db_id: &str) -> Result<()> {
        if db_id.is_empty() {
            return Err(Error::Empty("database id"));
        }
        info!(db_id, "Deleting database");
        self.client
            .delete_database(db_id)
            .await
            .wrap(format!("delete database {db_id}"))
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::firewall::FirewallRule;

/// Well-known database feature names
pub mod features {
    /// Forces TLS on every connection. Required before public access can be enabled.
    pub const FORCE_SSL: &str = "force-ssl";

    /// Exposes the database on the public internet
    pub const PUBLICLY_AVAILABLE: &str = "publicly-available";
}

/// Kind of managed database. Closed set, one member for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    #[serde(rename = "postgresql")]
    PostgreSql,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::PostgreSql => "postgresql",
        }
    }

    /// Addon provider used to provision this kind of database
    pub fn addon_provider_id(&self) -> &'static str {
        match self {
            DatabaseType::PostgreSql => "postgresql-ng",
        }
    }

    /// Application variable holding the connection string
    pub fn url_variable_name(&self) -> &'static str {
        match self {
            DatabaseType::PostgreSql => "SCALINGO_POSTGRESQL_URL",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgresql" => Ok(DatabaseType::PostgreSql),
            other => Err(ValidationError::UnknownDatabaseType(other.to_string())),
        }
    }
}

/// Lifecycle state of a remote database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    #[default]
    Provisioning,
    Running,
    Stopped,
}

impl DatabaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseStatus::Provisioning => "provisioning",
            DatabaseStatus::Running => "running",
            DatabaseStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for DatabaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provisioning" => Ok(DatabaseStatus::Provisioning),
            "running" => Ok(DatabaseStatus::Running),
            "stopped" => Ok(DatabaseStatus::Stopped),
            other => Err(ValidationError::UnknownDatabaseStatus(other.to_string())),
        }
    }
}

/// State of one toggleable database feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStatus {
    Activated,
    Pending,
    Failed,
}

impl FeatureStatus {
    /// Activated and Pending both count as "on": the change is done or underway.
    pub fn is_active(&self) -> bool {
        matches!(self, FeatureStatus::Activated | FeatureStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureStatus::Activated => "activated",
            FeatureStatus::Pending => "pending",
            FeatureStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "activated" => Ok(FeatureStatus::Activated),
            "pending" => Ok(FeatureStatus::Pending),
            "failed" => Ok(FeatureStatus::Failed),
            other => Err(ValidationError::UnknownFeatureStatus(other.to_string())),
        }
    }
}

/// Feature name to status map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseFeatures(BTreeMap<String, FeatureStatus>);

impl DatabaseFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, status: FeatureStatus) {
        self.0.insert(name.into(), status);
    }

    pub fn get(&self, name: &str) -> Option<FeatureStatus> {
        self.0.get(name).copied()
    }

    /// True when the feature is known and Activated or Pending
    pub fn is_active(&self, name: &str) -> bool {
        self.get(name).is_some_and(|status| status.is_active())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FeatureStatus)> {
        self.0.iter().map(|(name, status)| (name.as_str(), *status))
    }
}

impl<N: Into<String>> FromIterator<(N, FeatureStatus)> for DatabaseFeatures {
    fn from_iter<I: IntoIterator<Item = (N, FeatureStatus)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, status)| (name.into(), status)).collect())
    }
}

/// A managed database as seen from the provider.
///
/// Re-hydrated from the remote API on every read. `db_type` is `None` while a
/// freshly created database has not reported its type yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Remote identifier, empty before creation
    pub id: String,
    /// Owning application on the provider
    pub app_id: String,
    /// Addon identifier, discovered through lookup
    pub addon_id: String,
    pub name: String,
    pub db_type: Option<DatabaseType>,
    pub status: DatabaseStatus,
    pub plan: String,
    pub project_id: String,
    pub features: DatabaseFeatures,
    pub firewall_rules: Vec<FirewallRule>,
}

impl Database {
    /// Returns the database type, failing when it is not set.
    pub fn validate_type(&self) -> Result<DatabaseType, ValidationError> {
        self.db_type.ok_or(ValidationError::MissingDatabaseType)
    }

    pub fn is_running(&self) -> bool {
        self.status == DatabaseStatus::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_parse() {
        assert_eq!("postgresql".parse::<DatabaseType>(), Ok(DatabaseType::PostgreSql));
        assert_eq!(
            "mysql".parse::<DatabaseType>(),
            Err(ValidationError::UnknownDatabaseType("mysql".to_string()))
        );
        assert!("".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_database_type_conventions() {
        let db_type = DatabaseType::PostgreSql;
        assert_eq!(db_type.addon_provider_id(), "postgresql-ng");
        assert_eq!(db_type.url_variable_name(), "SCALINGO_POSTGRESQL_URL");
        assert_eq!(db_type.to_string(), "postgresql");
    }

    #[test]
    fn test_database_status_parse() {
        assert_eq!("running".parse::<DatabaseStatus>(), Ok(DatabaseStatus::Running));
        assert_eq!("stopped".parse::<DatabaseStatus>(), Ok(DatabaseStatus::Stopped));
        assert!("creating".parse::<DatabaseStatus>().is_err());
    }

    #[test]
    fn test_feature_status_is_active() {
        assert!(FeatureStatus::Activated.is_active());
        assert!(FeatureStatus::Pending.is_active());
        assert!(!FeatureStatus::Failed.is_active());
        assert!("bogus".parse::<FeatureStatus>().is_err());
    }

    #[test]
    fn test_database_features_lookup() {
        let set: DatabaseFeatures = [
            (features::FORCE_SSL, FeatureStatus::Pending),
            (features::PUBLICLY_AVAILABLE, FeatureStatus::Failed),
        ]
        .into_iter()
        .collect();

        assert!(set.is_active(features::FORCE_SSL));
        assert!(!set.is_active(features::PUBLICLY_AVAILABLE));
        assert!(!set.is_active("unknown"));
        assert!(DatabaseFeatures::new().is_empty());
    }

    #[test]
    fn test_validate_type() {
        let mut db = Database::default();
        assert_eq!(db.validate_type(), Err(ValidationError::MissingDatabaseType));

        db.db_type = Some(DatabaseType::PostgreSql);
        assert_eq!(db.validate_type(), Ok(DatabaseType::PostgreSql));
    }

    #[test]
    fn test_database_serialization_uses_wire_names() {
        let db = Database {
            id: "db-1".to_string(),
            db_type: Some(DatabaseType::PostgreSql),
            status: DatabaseStatus::Running,
            ..Default::default()
        };

        let json = serde_json::to_value(&db).unwrap();
        assert_eq!(json["db_type"], "postgresql");
        assert_eq!(json["status"], "running");
    }
}

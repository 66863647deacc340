//! PostgreSQL custom resource (`databases.scalingo.com/v1alpha1`)

use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use scalingo_models::{
    features, Database, DatabaseFeatures, DatabaseType, FeatureStatus, FirewallRule,
    ValidationError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REGION: &str = "osc-fr1";
pub const DEFAULT_AUTH_SECRET_KEY: &str = "token";

/// A PostgreSQL database managed on Scalingo
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(
    group = "databases.scalingo.com",
    version = "v1alpha1",
    kind = "PostgreSQL",
    plural = "postgresqls",
    shortname = "pg",
    namespaced,
    status = "PostgreSQLStatus",
    printcolumn = r#"{"name":"Available","type":"string","jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#,
    printcolumn = r#"{"name":"Provisioning","type":"string","jsonPath":".status.conditions[?(@.type==\"Provisioning\")].status"}"#,
    printcolumn = r#"{"name":"Database ID","type":"string","jsonPath":".status.scalingoDatabaseID"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PostgreSQLSpec {
    /// Secret holding the Scalingo API token
    pub auth_secret: AuthSecret,

    /// Secret receiving the connection URL once the database runs
    pub conn_info_secret_target: ConnInfoSecretTarget,

    /// Database name on Scalingo
    pub name: String,

    /// Plan name, e.g. "postgresql-dr-starter-4096"
    pub plan: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Scalingo project; the token's default project when absent
    #[serde(rename = "projectID", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking: Option<Networking>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct AuthSecret {
    pub name: String,
    #[serde(default = "default_auth_secret_key")]
    pub key: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct ConnInfoSecretTarget {
    pub name: String,
    /// Prefix of the secret key, added as is. The key becomes `<prefix>_URL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct Networking {
    #[serde(default)]
    pub internet_access: InternetAccess,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall: Option<Firewall>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct InternetAccess {
    pub enabled: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct Firewall {
    #[serde(default)]
    pub rules: Vec<FirewallRuleSpec>,
}

/// Firewall rule as declared. Validated into a [`FirewallRule`] before use.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct FirewallRuleSpec {
    /// `custom_range` or `managed_range`
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub range_id: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostgreSQLStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schemars(schema_with = "conditions_schema")]
    pub conditions: Vec<Condition>,

    #[serde(rename = "scalingoDatabaseID", default, skip_serializing_if = "String::is_empty")]
    pub scalingo_database_id: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_auth_secret_key() -> String {
    DEFAULT_AUTH_SECRET_KEY.to_string()
}

/// Schema mirror of `meta/v1` Condition, which does not implement `JsonSchema`
#[derive(JsonSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct ConditionSchema {
    #[serde(rename = "type")]
    type_: String,
    status: String,
    reason: String,
    message: String,
    last_transition_time: String,
    observed_generation: Option<i64>,
}

fn conditions_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
    gen.subschema_for::<Vec<ConditionSchema>>()
}

impl PostgreSQLSpec {
    pub fn internet_access_enabled(&self) -> bool {
        self.networking
            .as_ref()
            .is_some_and(|networking| networking.internet_access.enabled)
    }

    /// Validates the declared firewall rules
    pub fn firewall_rules(&self) -> Result<Vec<FirewallRule>, ValidationError> {
        let Some(firewall) = self.networking.as_ref().and_then(|n| n.firewall.as_ref()) else {
            return Ok(Vec::new());
        };

        firewall
            .rules
            .iter()
            .map(|rule| FirewallRule::parse(&rule.rule_type, &rule.cidr, &rule.range_id, &rule.label))
            .collect()
    }

    /// Desired feature set derived from the networking section
    pub fn features(&self) -> DatabaseFeatures {
        let mut desired = DatabaseFeatures::new();
        if self.internet_access_enabled() {
            desired.insert(features::PUBLICLY_AVAILABLE, FeatureStatus::Activated);
        }
        desired
    }

    /// Translates the declared spec into the desired [`Database`].
    pub fn to_database(&self) -> Result<Database, ValidationError> {
        Ok(Database {
            name: self.name.clone(),
            db_type: Some(DatabaseType::PostgreSql),
            plan: self.plan.clone(),
            project_id: self.project_id.clone().unwrap_or_default(),
            features: self.features(),
            firewall_rules: self.firewall_rules()?,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    fn spec_json() -> serde_json::Value {
        serde_json::json!({
            "authSecret": { "name": "scalingo-token" },
            "connInfoSecretTarget": { "name": "pg-conn", "prefix": "MY_DB" },
            "name": "db1",
            "plan": "postgresql-dr-starter-4096",
            "networking": {
                "internet_access": { "enabled": true },
                "firewall": {
                    "rules": [
                        { "type": "custom_range", "cidr": "10.0.0.0/8", "label": "office" },
                        { "type": "managed_range", "range_id": "scalingo-apps" }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_spec_defaults() {
        let spec: PostgreSQLSpec = serde_json::from_value(spec_json()).unwrap();
        assert_eq!(spec.region, DEFAULT_REGION);
        assert_eq!(spec.auth_secret.key, DEFAULT_AUTH_SECRET_KEY);
        assert_eq!(spec.conn_info_secret_target.prefix.as_deref(), Some("MY_DB"));
        assert!(spec.project_id.is_none());
    }

    #[test]
    fn test_to_database() {
        let spec: PostgreSQLSpec = serde_json::from_value(spec_json()).unwrap();
        let db = spec.to_database().unwrap();

        assert_eq!(db.name, "db1");
        assert_eq!(db.db_type, Some(DatabaseType::PostgreSql));
        assert!(db.id.is_empty());
        assert!(db.features.is_active(features::PUBLICLY_AVAILABLE));
        assert_eq!(db.firewall_rules.len(), 2);
        assert_eq!(db.firewall_rules[1].range.range_id(), Some("scalingo-apps"));
    }

    #[test]
    fn test_to_database_rejects_invalid_rule() {
        let mut json = spec_json();
        json["networking"]["firewall"]["rules"][0]["cidr"] = serde_json::json!("");
        let spec: PostgreSQLSpec = serde_json::from_value(json).unwrap();

        assert_eq!(spec.to_database().unwrap_err(), ValidationError::MissingCidr);
    }

    #[test]
    fn test_internet_access_disabled_without_networking() {
        let mut json = spec_json();
        json.as_object_mut().unwrap().remove("networking");
        let spec: PostgreSQLSpec = serde_json::from_value(json).unwrap();

        assert!(!spec.internet_access_enabled());
        assert!(spec.to_database().unwrap().features.is_empty());
    }

    #[test]
    fn test_crd_metadata() {
        let crd = PostgreSQL::crd();
        assert_eq!(crd.spec.group, "databases.scalingo.com");
        assert_eq!(crd.spec.names.kind, "PostgreSQL");
        assert_eq!(crd.spec.versions[0].name, "v1alpha1");
    }
}

//! Scalingo API v1 client
//!
//! Databases, addons, plans and variables live on the main API with a bearer
//! token obtained by exchanging the API token. Firewall rules and features
//! live on the database API with a per-addon token.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use scalingo_models::{
    Database, DatabaseFeatures, DatabaseStatus, DatabaseType, FeatureStatus, FirewallRule,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;

use super::Endpoints;
use crate::provider::{ProviderClient, ProviderError};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Debug, Serialize)]
struct DatabaseCreateRequest<'a> {
    database: DatabaseCreateParams<'a>,
}

#[derive(Debug, Serialize)]
struct DatabaseCreateParams<'a> {
    addon_provider_id: &'a str,
    plan_id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    project_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DatabaseEnvelope {
    database: DatabaseNg,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatabaseNg {
    id: String,
    name: String,
    plan: String,
    project_id: String,
    app: AppRef,
    /// Empty right after creation
    database: DatabaseInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppRef {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatabaseInfo {
    id: String,
    type_name: String,
    status: String,
    features: Vec<FeatureInfo>,
}

#[derive(Debug, Deserialize)]
struct FeatureInfo {
    name: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct AddonsResponse {
    addons: Vec<AddonRef>,
}

#[derive(Debug, Deserialize)]
struct AddonRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlansResponse {
    plans: Vec<Plan>,
}

#[derive(Debug, Deserialize)]
struct Plan {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct AddonUpdateRequest<'a> {
    addon: AddonPlan<'a>,
}

#[derive(Debug, Serialize)]
struct AddonPlan<'a> {
    plan_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct AddonTokenResponse {
    addon: AddonToken,
}

#[derive(Debug, Deserialize)]
struct AddonToken {
    token: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FirewallRuleWire {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    id: String,
    #[serde(rename = "type")]
    rule_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    cidr: String,
    #[serde(default)]
    label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    range_id: String,
}

#[derive(Debug, Serialize)]
struct FirewallRuleCreateRequest {
    firewall_rule: FirewallRuleWire,
}

#[derive(Debug, Deserialize)]
struct FirewallRulesResponse {
    rules: Vec<FirewallRuleWire>,
}

#[derive(Debug, Serialize)]
struct FeatureRequest<'a> {
    feature: FeatureName<'a>,
}

#[derive(Debug, Serialize)]
struct FeatureName<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct FeatureResponse {
    status: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct VariablesResponse {
    variables: Vec<Variable>,
}

#[derive(Debug, Deserialize)]
struct Variable {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: String,
    errors: serde_json::Value,
}

// ============================================================================
// Conversions
// ============================================================================

fn to_database_status(status: &str) -> Result<DatabaseStatus, ProviderError> {
    match status {
        "creating" | "updating" | "migrating" | "upgrading" => Ok(DatabaseStatus::Provisioning),
        "running" => Ok(DatabaseStatus::Running),
        "stopped" => Ok(DatabaseStatus::Stopped),
        other => Err(ProviderError::InvalidResponse(format!(
            "unknown database status {other}"
        ))),
    }
}

fn to_feature_status(status: &str) -> Result<FeatureStatus, ProviderError> {
    Ok(status.to_ascii_lowercase().parse::<FeatureStatus>()?)
}

fn to_database(ng: DatabaseNg) -> Result<Database, ProviderError> {
    let mut db = Database {
        id: ng.id,
        app_id: ng.app.id,
        name: ng.name,
        plan: ng.plan,
        project_id: ng.project_id,
        ..Default::default()
    };

    // a freshly created database has neither type nor status yet
    if ng.database.id.is_empty() {
        db.status = DatabaseStatus::Provisioning;
        return Ok(db);
    }

    db.db_type = Some(ng.database.type_name.parse::<DatabaseType>()?);
    db.status = to_database_status(&ng.database.status)?;
    let mut features = DatabaseFeatures::new();
    for feature in ng.database.features {
        features.insert(feature.name, to_feature_status(&feature.status)?);
    }
    db.features = features;
    Ok(db)
}

fn to_firewall_rule(wire: FirewallRuleWire) -> Result<FirewallRule, ProviderError> {
    let rule = FirewallRule::parse(&wire.rule_type, &wire.cidr, &wire.range_id, &wire.label)?;
    Ok(if wire.id.is_empty() { rule } else { rule.with_id(wire.id) })
}

fn to_wire_rule(rule: &FirewallRule) -> FirewallRuleWire {
    FirewallRuleWire {
        id: String::new(),
        rule_type: rule.rule_type().as_str().to_string(),
        cidr: rule.range.cidr().unwrap_or_default().to_string(),
        label: rule.label.clone(),
        range_id: rule.range.range_id().unwrap_or_default().to_string(),
    }
}

// ============================================================================
// Client
// ============================================================================

pub struct Client {
    http: reqwest::Client,
    api_token: String,
    endpoints: Endpoints,
    bearer: OnceCell<String>,
}

impl Client {
    /// No network I/O happens until the first call.
    pub fn new(http: reqwest::Client, api_token: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            http,
            api_token: api_token.into(),
            endpoints,
            bearer: OnceCell::new(),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn bearer(&self) -> Result<&str, ProviderError> {
        let token = self
            .bearer
            .get_or_try_init(|| self.exchange_token())
            .await?;
        Ok(token.as_str())
    }

    async fn exchange_token(&self) -> Result<String, ProviderError> {
        debug!(auth = %self.endpoints.auth, "Exchanging API token");
        let request = self
            .http
            .post(format!("{}/v1/tokens/exchange", self.endpoints.auth))
            .basic_auth("", Some(&self.api_token));
        let body: TokenResponse = send(request, "token exchange").await?;
        if body.token.is_empty() {
            return Err(ProviderError::EmptyToken);
        }
        Ok(body.token)
    }

    async fn api(&self, method: Method, path: &str) -> Result<RequestBuilder, ProviderError> {
        let bearer = self.bearer().await?;
        Ok(self
            .http
            .request(method, format!("{}/v1{path}", self.endpoints.api))
            .bearer_auth(bearer))
    }

    async fn db_api(
        &self,
        method: Method,
        app_id: &str,
        addon_id: &str,
        path: &str,
    ) -> Result<RequestBuilder, ProviderError> {
        let request = self
            .api(Method::POST, &format!("/apps/{app_id}/addons/{addon_id}/token"))
            .await?;
        let body: AddonTokenResponse = send(request, &format!("addon {addon_id} token")).await?;
        Ok(self
            .http
            .request(
                method,
                format!("{}/api/databases/{addon_id}{path}", self.endpoints.db_api),
            )
            .bearer_auth(body.addon.token))
    }

    /// A database is an app holding exactly one addon, itself.
    /// The database id is accepted wherever an app id is.
    async fn addon_id(&self, app_id: &str) -> Result<String, ProviderError> {
        let request = self.api(Method::GET, &format!("/apps/{app_id}/addons")).await?;
        let body: AddonsResponse = send(request, &format!("addons of {app_id}")).await?;
        let mut addons = body.addons.into_iter();
        match (addons.next(), addons.next()) {
            (None, _) => Err(ProviderError::Other(format!(
                "no addon found for database {app_id}"
            ))),
            (Some(addon), None) => Ok(addon.id),
            (Some(_), Some(_)) => Err(ProviderError::Other(format!(
                "multiple addons found for {app_id}, it may be an application"
            ))),
        }
    }

    async fn addon_id_of(&self, db: &Database) -> Result<String, ProviderError> {
        if db.addon_id.is_empty() {
            self.addon_id(&db.app_id).await
        } else {
            Ok(db.addon_id.clone())
        }
    }

    async fn find_plan_id(&self, provider_id: &str, plan_name: &str) -> Result<String, ProviderError> {
        let request = self
            .api(Method::GET, &format!("/addon_providers/{provider_id}/plans"))
            .await?;
        let body: PlansResponse = send(request, &format!("plans of {provider_id}")).await?;
        body.plans
            .into_iter()
            .find(|plan| plan.name == plan_name)
            .map(|plan| plan.id)
            .ok_or_else(|| {
                ProviderError::NotFound(format!("plan {plan_name} for addon {provider_id}"))
            })
    }
}

async fn check(response: Response, what: &str) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(what.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if !body.error.is_empty() => body.error,
        Ok(body) if !body.errors.is_null() => body.errors.to_string(),
        _ => text,
    };
    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T, ProviderError> {
    let response = check(request.send().await?, what).await?;
    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| ProviderError::InvalidResponse(format!("{what}: {e}")))
}

async fn send_empty(request: RequestBuilder, what: &str) -> Result<(), ProviderError> {
    check(request.send().await?, what).await?;
    Ok(())
}

#[async_trait]
impl ProviderClient for Client {
    async fn create_database(&self, db: &Database) -> Result<Database, ProviderError> {
        let provider_id = db.validate_type()?.addon_provider_id();
        let plan_id = self.find_plan_id(provider_id, &db.plan).await?;

        let request = self
            .api(Method::POST, "/databases")
            .await?
            .json(&DatabaseCreateRequest {
                database: DatabaseCreateParams {
                    addon_provider_id: provider_id,
                    plan_id: &plan_id,
                    name: &db.name,
                    project_id: &db.project_id,
                },
            });
        let body: DatabaseEnvelope = send(request, &format!("database {}", db.name)).await?;
        to_database(body.database)
    }

    async fn get_database(&self, db_id: &str) -> Result<Database, ProviderError> {
        let request = self.api(Method::GET, &format!("/databases/{db_id}")).await?;
        let body: DatabaseEnvelope = send(request, &format!("database {db_id}")).await?;
        let mut db = to_database(body.database)?;
        if !db.app_id.is_empty() {
            db.addon_id = self.addon_id(&db.app_id).await?;
        }
        Ok(db)
    }

    async fn update_database_plan(&self, db: &Database) -> Result<(), ProviderError> {
        let provider_id = db.validate_type()?.addon_provider_id();
        let plan_id = self.find_plan_id(provider_id, &db.plan).await?;
        let addon_id = self.addon_id_of(db).await?;

        let request = self
            .api(Method::PATCH, &format!("/apps/{}/addons/{addon_id}", db.app_id))
            .await?
            .json(&AddonUpdateRequest {
                addon: AddonPlan { plan_id: &plan_id },
            });
        send_empty(request, &format!("addon {addon_id}")).await
    }

    async fn delete_database(&self, db_id: &str) -> Result<(), ProviderError> {
        let request = self.api(Method::DELETE, &format!("/databases/{db_id}")).await?;
        send_empty(request, &format!("database {db_id}")).await
    }

    async fn create_firewall_rule(
        &self,
        db_id: &str,
        addon_id: &str,
        rule: &FirewallRule,
    ) -> Result<(), ProviderError> {
        let request = self
            .db_api(Method::POST, db_id, addon_id, "/firewall_rules")
            .await?
            .json(&FirewallRuleCreateRequest {
                firewall_rule: to_wire_rule(rule),
            });
        send_empty(request, "firewall rules").await
    }

    async fn list_firewall_rules(
        &self,
        db_id: &str,
        addon_id: &str,
    ) -> Result<Vec<FirewallRule>, ProviderError> {
        let request = self
            .db_api(Method::GET, db_id, addon_id, "/firewall_rules")
            .await?;
        let body: FirewallRulesResponse = send(request, "firewall rules").await?;
        body.rules.into_iter().map(to_firewall_rule).collect()
    }

    async fn delete_firewall_rule(
        &self,
        db_id: &str,
        addon_id: &str,
        rule_id: &str,
    ) -> Result<(), ProviderError> {
        let request = self
            .db_api(Method::DELETE, db_id, addon_id, &format!("/firewall_rules/{rule_id}"))
            .await?;
        send_empty(request, &format!("firewall rule {rule_id}")).await
    }

    async fn enable_database_feature(
        &self,
        db: &Database,
        feature: &str,
    ) -> Result<FeatureStatus, ProviderError> {
        let addon_id = self.addon_id_of(db).await?;
        let request = self
            .db_api(Method::POST, &db.app_id, &addon_id, "/features")
            .await?
            .json(&FeatureRequest {
                feature: FeatureName { name: feature },
            });
        let body: FeatureResponse = send(request, &format!("feature {feature}")).await?;

        let status = to_feature_status(&body.status)?;
        if status == FeatureStatus::Failed {
            return Err(ProviderError::FeatureFailed {
                name: feature.to_string(),
                message: body.message,
            });
        }
        Ok(status)
    }

    /// Disabling is asynchronous on the provider side
    async fn disable_database_feature(
        &self,
        db: &Database,
        feature: &str,
    ) -> Result<FeatureStatus, ProviderError> {
        let addon_id = self.addon_id_of(db).await?;
        let request = self
            .db_api(Method::DELETE, &db.app_id, &addon_id, "/features")
            .await?
            .query(&[("feature", feature)]);
        send_empty(request, &format!("feature {feature}")).await?;
        Ok(FeatureStatus::Pending)
    }

    async fn find_application_variable(
        &self,
        app_id: &str,
        name: &str,
    ) -> Result<String, ProviderError> {
        let request = self
            .api(Method::GET, &format!("/apps/{app_id}/variables"))
            .await?
            .query(&[("aliases", "false")]);
        let body: VariablesResponse = send(request, &format!("variables of {app_id}")).await?;
        body.variables
            .into_iter()
            .find(|variable| variable.name == name)
            .map(|variable| variable.value)
            .ok_or_else(|| ProviderError::NotFound(format!("variable {name}")))
    }
}

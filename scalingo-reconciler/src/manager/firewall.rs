//! Firewall rule convergence

use futures::future::join_all;
use scalingo_models::{Database, FirewallRule};
use tracing::{error, info};

use crate::error::{Error, Result, WrapErr};
use crate::provider::ProviderClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    Add(FirewallRule),
    /// Carries the current rule, with its remote id
    Delete(FirewallRule),
}

fn sorted(rules: &[FirewallRule]) -> Vec<FirewallRule> {
    let mut rules = rules.to_vec();
    rules.sort();
    rules.dedup();
    rules
}

/// Actions that bring `current` to `expected`.
///
/// Adds come first, then deletes, each in rule order. Labels and ids are
/// ignored when matching, so an already-converged pair yields nothing.
pub fn diff_rules(current: &[FirewallRule], expected: &[FirewallRule]) -> Vec<RuleAction> {
    let current = sorted(current);
    let expected = sorted(expected);

    let adds = expected
        .iter()
        .filter(|rule| current.binary_search(rule).is_err())
        .cloned()
        .map(RuleAction::Add);
    let deletes = current
        .iter()
        .filter(|rule| expected.binary_search(rule).is_err())
        .cloned()
        .map(RuleAction::Delete);

    adds.chain(deletes).collect()
}

async fn apply(client: &dyn ProviderClient, db: &Database, action: &RuleAction) -> Result<()> {
    match action {
        RuleAction::Add(rule) => {
            let result = client
                .create_firewall_rule(&db.id, &db.addon_id, rule)
                .await
                .wrap("add firewall rule");
            match &result {
                Ok(()) => info!(rule = %rule, "Add firewall rule"),
                Err(e) => error!(error = %e, app_id = %db.id, addon_id = %db.addon_id, rule = %rule, "Fail to add firewall rule"),
            }
            result
        }
        RuleAction::Delete(rule) => {
            let rule_id = rule.id.as_deref().ok_or(Error::Empty("firewall rule id"))?;
            let result = client
                .delete_firewall_rule(&db.id, &db.addon_id, rule_id)
                .await
                .wrap("delete firewall rule");
            match &result {
                Ok(()) => info!(rule = %rule, "Delete firewall rule"),
                Err(e) => error!(error = %e, app_id = %db.id, addon_id = %db.addon_id, rule = %rule, "Fail to delete firewall rule"),
            }
            result
        }
    }
}

/// Applies the diff concurrently.
///
/// Every action runs to completion even when a sibling fails; the first
/// error in diff order is returned. Returns whether anything was applied.
pub(crate) async fn update_firewall_rules(
    client: &dyn ProviderClient,
    current: &Database,
    expected: &[FirewallRule],
) -> Result<bool> {
    let actions = diff_rules(&current.firewall_rules, expected);
    if actions.is_empty() {
        return Ok(false);
    }

    let results = join_all(actions.iter().map(|action| apply(client, current, action))).await;
    results.into_iter().collect::<Result<Vec<_>>>()?;
    Ok(true)
}

//! Status, annotation and finalizer helpers
//!
//! Pure functions over a [`PostgreSQL`] object. Setters return whether they
//! changed anything so callers only persist real changes.

use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition, Time};
use kube::ResourceExt;

use crate::crd::{PostgreSQL, PostgreSQLStatus};
use crate::names::{annotations, conditions, finalizers, messages, reasons};

fn find_condition<'a>(all: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    all.iter().find(|c| c.type_ == condition_type)
}

fn conditions_of(pg: &PostgreSQL) -> &[Condition] {
    pg.status.as_ref().map(|s| s.conditions.as_slice()).unwrap_or_default()
}

fn is_condition(pg: &PostgreSQL, condition_type: &str, status: &str) -> bool {
    find_condition(conditions_of(pg), condition_type).is_some_and(|c| c.status == status)
}

fn status_mut(pg: &mut PostgreSQL) -> &mut PostgreSQLStatus {
    pg.status.get_or_insert_with(PostgreSQLStatus::default)
}

fn new_condition(
    condition_type: &str,
    status: bool,
    reason: &str,
    message: &str,
    generation: Option<i64>,
) -> Condition {
    Condition {
        type_: condition_type.to_string(),
        status: if status { conditions::STATUS_TRUE } else { conditions::STATUS_FALSE }.to_string(),
        reason: reason.to_string(),
        message: message.to_string(),
        last_transition_time: Time(Utc::now()),
        observed_generation: generation,
    }
}

/// Inserts or updates a condition by type.
///
/// `lastTransitionTime` only moves when the status flips.
pub fn set_status_condition(all: &mut Vec<Condition>, condition: Condition) -> bool {
    let Some(existing) = all.iter_mut().find(|c| c.type_ == condition.type_) else {
        all.push(condition);
        return true;
    };

    let mut changed = false;
    if existing.status != condition.status {
        existing.status = condition.status;
        existing.last_transition_time = condition.last_transition_time;
        changed = true;
    }
    if existing.reason != condition.reason {
        existing.reason = condition.reason;
        changed = true;
    }
    if existing.message != condition.message {
        existing.message = condition.message;
        changed = true;
    }
    if existing.observed_generation != condition.observed_generation {
        existing.observed_generation = condition.observed_generation;
        changed = true;
    }
    changed
}

fn set_condition(
    pg: &mut PostgreSQL,
    condition_type: &str,
    status: bool,
    reason: &str,
    message: &str,
) -> bool {
    let condition = new_condition(condition_type, status, reason, message, pg.metadata.generation);
    set_status_condition(&mut status_mut(pg).conditions, condition)
}

/// Conditions have been written at least once
pub fn is_status_initialized(pg: &PostgreSQL) -> bool {
    find_condition(conditions_of(pg), conditions::AVAILABLE).is_some()
}

pub fn is_database_available(pg: &PostgreSQL) -> bool {
    is_condition(pg, conditions::AVAILABLE, conditions::STATUS_TRUE)
}

pub fn is_database_provisioning(pg: &PostgreSQL) -> bool {
    is_condition(pg, conditions::PROVISIONING, conditions::STATUS_TRUE)
}

/// Available=false, Provisioning=false
pub fn set_initial_status(pg: &mut PostgreSQL) -> bool {
    let available = set_condition(
        pg,
        conditions::AVAILABLE,
        false,
        reasons::NOT_AVAILABLE,
        messages::NOT_AVAILABLE,
    );
    let provisioning = set_condition(
        pg,
        conditions::PROVISIONING,
        false,
        reasons::NOT_PROVISIONED,
        messages::NOT_PROVISIONED,
    );
    available || provisioning
}

/// Provisioning=true, Available untouched
pub fn set_provisioning(pg: &mut PostgreSQL) -> bool {
    set_condition(
        pg,
        conditions::PROVISIONING,
        true,
        reasons::PROVISIONING,
        messages::PROVISIONING,
    )
}

/// Available=true, Provisioning=false
pub fn set_provisioned(pg: &mut PostgreSQL) -> bool {
    let available = set_condition(
        pg,
        conditions::AVAILABLE,
        true,
        reasons::AVAILABLE,
        messages::AVAILABLE,
    );
    let provisioning = set_condition(
        pg,
        conditions::PROVISIONING,
        false,
        reasons::PROVISIONED,
        messages::PROVISIONED,
    );
    available || provisioning
}

/// Value of the running annotation, `None` while it was never set
pub fn running_flag(pg: &PostgreSQL) -> Option<bool> {
    pg.annotations()
        .get(annotations::DB_IS_RUNNING)
        .map(|value| value == annotations::TRUE)
}

pub fn is_database_running(pg: &PostgreSQL) -> bool {
    running_flag(pg).unwrap_or(false)
}

pub fn set_running_flag(pg: &mut PostgreSQL, running: bool) {
    let value = if running { annotations::TRUE } else { annotations::FALSE };
    pg.annotations_mut()
        .insert(annotations::DB_IS_RUNNING.to_string(), value.to_string());
}

pub fn is_deletion_requested(pg: &PostgreSQL) -> bool {
    pg.metadata.deletion_timestamp.is_some()
}

pub fn has_finalizer(pg: &PostgreSQL) -> bool {
    pg.finalizers().iter().any(|f| f == finalizers::POSTGRESQL)
}

pub fn add_finalizer(pg: &mut PostgreSQL) -> bool {
    if has_finalizer(pg) {
        return false;
    }
    pg.finalizers_mut().push(finalizers::POSTGRESQL.to_string());
    true
}

pub fn remove_finalizer(pg: &mut PostgreSQL) -> bool {
    let before = pg.finalizers().len();
    pg.finalizers_mut().retain(|f| f != finalizers::POSTGRESQL);
    before != pg.finalizers().len()
}

/// Remote database id recorded in status, empty before creation
pub fn remote_database_id(pg: &PostgreSQL) -> &str {
    pg.status
        .as_ref()
        .map(|s| s.scalingo_database_id.as_str())
        .unwrap_or_default()
}

pub fn set_remote_database_id(pg: &mut PostgreSQL, id: &str) {
    status_mut(pg).scalingo_database_id = id.to_string();
}

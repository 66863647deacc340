use thiserror::Error;

/// Local validation failures. These never reach a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid database type: {0}")]
    UnknownDatabaseType(String),

    #[error("empty database type")]
    MissingDatabaseType,

    #[error("invalid database status: {0}")]
    UnknownDatabaseStatus(String),

    #[error("invalid database feature status: {0}")]
    UnknownFeatureStatus(String),

    #[error("invalid firewall rule type: {0}")]
    UnknownFirewallRuleType(String),

    #[error("missing cidr")]
    MissingCidr,

    #[error("missing range_id")]
    MissingRangeId,
}

//! Name constants for the PostgreSQL resource
//!
//! Everything the reconciler writes into Kubernetes objects (finalizers,
//! annotations, condition types, reasons and messages) is declared here.

/// Finalizers placed on managed resources
pub mod finalizers {
    /// Blocks removal of a PostgreSQL resource until its remote database is deleted
    ///
    /// **Added:** on the first reconcile pass, before any remote call
    /// **Removed:** once the remote database is gone
    pub const POSTGRESQL: &str = "databases.scalingo.com/PostgresFinalizer";
}

/// Annotations placed on managed resources
pub mod annotations {
    /// Whether the post-availability work (connection secret) has been done
    ///
    /// **Values:** [`super::annotations::TRUE`] or [`super::annotations::FALSE`]
    pub const DB_IS_RUNNING: &str = "databases.scalingo.com/db-is-running";

    pub const TRUE: &str = "true";
    pub const FALSE: &str = "false";
}

/// Status condition types
pub mod conditions {
    /// The database exists remotely and reached the running state at least once
    pub const AVAILABLE: &str = "Available";

    /// An asynchronous remote operation (creation, plan change) is in flight
    pub const PROVISIONING: &str = "Provisioning";

    pub const STATUS_TRUE: &str = "True";
    pub const STATUS_FALSE: &str = "False";
}

/// Condition reasons
pub mod reasons {
    pub const NOT_AVAILABLE: &str = "DatabaseNotAvailable";
    pub const AVAILABLE: &str = "DatabaseAvailable";
    pub const NOT_PROVISIONED: &str = "DatabaseNotprovisioned";
    pub const PROVISIONING: &str = "DatabaseProvisioning";
    pub const PROVISIONED: &str = "Databaseprovisioned";
}

/// Condition messages
pub mod messages {
    pub const NOT_AVAILABLE: &str = "The database is not yet available on Scalingo.";
    pub const AVAILABLE: &str = "The database is available on Scalingo.";
    pub const NOT_PROVISIONED: &str = "The database is not yet provisioned on Scalingo.";
    pub const PROVISIONING: &str = "The database is being provisioned on Scalingo.";
    pub const PROVISIONED: &str = "The database is provisioned on Scalingo.";
}

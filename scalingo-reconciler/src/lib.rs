//! Scalingo Reconciler - drives Scalingo managed PostgreSQL databases from Kubernetes
//!
//! This crate holds the `PostgreSQL` custom resource, the reconciliation
//! state machine and the adapters it needs: a Kubernetes-backed resource and
//! secret store, and an HTTP client for the Scalingo API.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scalingo_reconciler::controller::{Reconciler, ReconcilerConfig};
//! use scalingo_reconciler::k8s_client::{get_k8s_client, KubeResourceStore, KubeSecretStore};
//! use scalingo_reconciler::scalingo::{EndpointOverrides, ScalingoFactory};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = get_k8s_client().await?;
//! let reconciler = Reconciler::new(
//!     Arc::new(KubeResourceStore::new(client.clone())),
//!     Arc::new(KubeSecretStore::new(client)),
//!     Arc::new(ScalingoFactory::new(EndpointOverrides::default())?),
//!     Arc::new(ReconcilerConfig::default()),
//! );
//!
//! let next = reconciler.reconcile("default", "my-database").await?;
//! # Ok(())
//! # }
//! ```

// Resource and state machine
pub mod controller;
pub mod crd;
pub mod names;
pub mod status;

// Database orchestration
pub mod manager;
pub mod provider;
pub mod scalingo;

// Kubernetes storage
pub mod k8s_client;
pub mod secrets;
pub mod store;

pub mod error;

#[cfg(test)]
mod testing;

pub use controller::{Reconciler, ReconcilerConfig, Requeue};
pub use crd::{PostgreSQL, PostgreSQLSpec, PostgreSQLStatus};
pub use error::{Error, Result};

//! Domain model for Scalingo managed databases
//!
//! Value types shared by the reconciler and the operator binary. Everything
//! here is pure data plus validation; no I/O happens in this crate.

mod database;
mod error;
mod firewall;
mod secret;

pub use database::*;
pub use error::ValidationError;
pub use firewall::*;
pub use secret::*;

//! Error types for the reconciler

use scalingo_models::ValidationError;
use thiserror::Error;

use crate::provider::ProviderError;
use crate::store::StoreError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed desired state, caught before any remote call
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// A required identifier was empty
    #[error("empty {0}")]
    Empty(&'static str),

    /// Remote state does not allow the requested change
    #[error("{0}")]
    Precondition(String),

    #[error("{action}: {source}")]
    Provider {
        action: String,
        #[source]
        source: ProviderError,
    },

    #[error("{action}: {source}")]
    Store {
        action: String,
        #[source]
        source: StoreError,
    },

    #[error("{action}: {source}")]
    Phase {
        action: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// True when the root cause is a missing remote or stored object
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Provider { source, .. } => matches!(source, ProviderError::NotFound(_)),
            Error::Store { source, .. } => matches!(source, StoreError::NotFound(_)),
            Error::Phase { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// True when the root cause is a lost optimistic-concurrency race
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Store { source, .. } => matches!(source, StoreError::Conflict(_)),
            Error::Phase { source, .. } => source.is_conflict(),
            _ => false,
        }
    }
}

/// Attach a short operation phrase to an error while keeping its kind.
pub trait WrapErr<T> {
    fn wrap(self, action: impl Into<String>) -> Result<T>;
}

impl<T> WrapErr<T> for std::result::Result<T, ProviderError> {
    fn wrap(self, action: impl Into<String>) -> Result<T> {
        self.map_err(|source| Error::Provider {
            action: action.into(),
            source,
        })
    }
}

impl<T> WrapErr<T> for std::result::Result<T, StoreError> {
    fn wrap(self, action: impl Into<String>) -> Result<T> {
        self.map_err(|source| Error::Store {
            action: action.into(),
            source,
        })
    }
}

impl<T> WrapErr<T> for std::result::Result<T, ValidationError> {
    fn wrap(self, action: impl Into<String>) -> Result<T> {
        self.map_err(Error::from).wrap(action)
    }
}

impl<T> WrapErr<T> for Result<T> {
    fn wrap(self, action: impl Into<String>) -> Result<T> {
        self.map_err(|source| Error::Phase {
            action: action.into(),
            source: Box::new(source),
        })
    }
}

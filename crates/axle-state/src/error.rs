use axle_keys::KeyError;
use axle_query::QueryError;
use thiserror::Error;

/// Errors produced by world-state operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    /// Record (de)serialization failed. Fatal to the operation; not retried.
    #[error("encoding error for key {key:?}: {reason}")]
    Encoding { key: String, reason: String },

    /// The Ledger Backend call itself failed. Propagated verbatim with
    /// operation context; retry policy belongs to the caller.
    #[error("backend error during {operation}: {reason}")]
    Backend { operation: String, reason: String },

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

pub type StateResult<T> = Result<T, StateError>;

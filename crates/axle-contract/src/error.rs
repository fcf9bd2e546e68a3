use axle_keys::KeyError;
use axle_state::StateError;
use thiserror::Error;

/// Errors produced by the entity services.
///
/// `NotFound` is often a valid empty result for the caller; `InvalidArgument`
/// is always rejected before the first backend call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("{entity} {key:?} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} {key:?} already exists")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl ContractError {
    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        ContractError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ContractError::InvalidArgument(reason.into())
    }
}

pub type ContractResult<T> = Result<T, ContractError>;

/// Reject an empty required string argument before touching the backend.
pub(crate) fn require(name: &str, value: &str) -> ContractResult<()> {
    if value.is_empty() {
        return Err(ContractError::invalid(format!("{name} must not be empty")));
    }
    Ok(())
}

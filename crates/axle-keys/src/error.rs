use thiserror::Error;

/// Errors produced by key construction and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("empty namespace")]
    EmptyNamespace,

    #[error("empty key segment in namespace {namespace:?}")]
    EmptySegment { namespace: String },

    #[error("key segment {segment:?} contains the reserved delimiter")]
    InvalidSegment { segment: String },

    #[error("empty simple key")]
    EmptyKey,

    #[error("not a composite key: {key:?}")]
    NotComposite { key: String },

    #[error("malformed composite key: {key:?}")]
    Malformed { key: String },
}

pub type KeyResult<T> = Result<T, KeyError>;

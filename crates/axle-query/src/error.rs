use thiserror::Error;

/// Errors produced by selector parsing, evaluation, and pagination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("invalid regex in $regex predicate: {0}")]
    InvalidRegex(String),

    #[error("invalid pagination bookmark: {0}")]
    InvalidBookmark(String),

    #[error("page size must be positive")]
    InvalidPageSize,
}

pub type QueryResult<T> = Result<T, QueryError>;

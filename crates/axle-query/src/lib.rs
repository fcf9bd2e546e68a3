//! Declarative selector queries over world-state records.
//!
//! This crate provides:
//! - A typed [`Selector`] builder: per-field `Eq` / range / `Regex` / `In`
//!   predicates, AND-only conjunction, single-field sort
//! - A wire codec for the backend's selector JSON shape
//!   (`{"selector": {...}, "sort": [{...}]}`), bit-compatible with queries
//!   already in production
//! - In-memory evaluation with CouchDB-style value collation and a stable
//!   tie-break by key
//! - Cursor-based pagination with an opaque bookmark
//!
//! Callers build selectors through the typed API; the JSON text is produced
//! only at the backend boundary, so caller input never reaches a query
//! string unescaped.

pub mod error;
pub mod eval;
pub mod page;
pub mod selector;

pub use error::{QueryError, QueryResult};
pub use eval::{run_query, value_cmp, CompiledSelector};
pub use page::{paginate, Page};
pub use selector::{Predicate, Selector, Sort, SortOrder};

//! World-state storage for Axle.
//!
//! This crate provides:
//! - [`WorldState`], the trait every Ledger Backend must satisfy: key-value
//!   mutation, lexicographic range scans, composite prefix scans, rich
//!   selector queries (plain and paginated), and per-key revision history
//! - [`StateStore`], the typed layer the entity services use: serde
//!   (de)serialization of records, heterogeneous-scan skip semantics
//! - [`InMemoryWorldState`], a reference backend for tests and embedding
//!
//! Versioning is owned by the backend: every `put` appends a revision under
//! the key and every `delete` appends a tombstone. This layer never models
//! versions as data — history is read-only.

pub mod error;
pub mod memory;
pub mod store;
pub mod traits;

pub use error::{StateError, StateResult};
pub use memory::InMemoryWorldState;
pub use store::{RecordPage, StateStore};
pub use traits::{KeyValue, QueryPage, Revision, RevisionIter, StateIter, WorldState};

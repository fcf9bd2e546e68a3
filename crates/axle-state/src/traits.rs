use axle_types::TxContext;
use chrono::{DateTime, Utc};

use crate::error::StateResult;

/// One `(key, value)` pair from a scan or query.
pub type KeyValue = (String, Vec<u8>);

/// Lazy scan result. Backends yield entries incrementally so large scans
/// need not be materialized; dropping the iterator releases the cursor.
pub type StateIter = Box<dyn Iterator<Item = StateResult<KeyValue>> + Send>;

/// Lazy history result, oldest revision first.
pub type RevisionIter = Box<dyn Iterator<Item = StateResult<Revision>> + Send>;

/// One committed revision of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// ID of the transaction that committed this revision.
    pub tx_id: String,
    /// Commit timestamp of that transaction.
    pub timestamp: DateTime<Utc>,
    /// `true` for a tombstone; the value is absent then.
    pub is_delete: bool,
    /// Serialized value at this revision. `None` for tombstones.
    pub value: Option<Vec<u8>>,
}

/// One page of a paginated rich query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPage {
    pub entries: Vec<KeyValue>,
    /// Number of entries actually fetched (≤ requested page size).
    pub fetched_count: u32,
    /// Opaque bookmark for the next page; empty when no further pages exist.
    pub bookmark: String,
}

/// The Ledger Backend contract: the current world-state snapshot plus its
/// append-only revision history.
///
/// All implementations must satisfy these invariants:
/// - Every `put` appends a new revision under the key; every `delete`
///   appends a tombstone. Versioning is the backend's, never the caller's.
/// - `get` of an absent or deleted key is `Ok(None)`, not an error.
/// - `scan_range` is ascending lexicographic over the *simple* keyspace;
///   composite keys (leading `\u{0000}`) are only visible to ranges that
///   start inside the composite keyspace, i.e. via `scan_prefix`.
/// - Reads are side-effect-free; the host may re-invoke an operation on
///   conflict and must observe identical results against the same snapshot.
pub trait WorldState: Send + Sync {
    /// Write `value` at `key`, appending a revision attributed to `ctx`.
    fn put(&self, ctx: &TxContext, key: &str, value: &[u8]) -> StateResult<()>;

    /// Read the current value at `key`. `Ok(None)` if absent.
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>>;

    /// Remove `key` from the current state and append a tombstone revision.
    fn delete(&self, ctx: &TxContext, key: &str) -> StateResult<()>;

    /// Ascending scan of `[start, end)`. Empty `start` means the beginning
    /// of the simple keyspace; empty `end` means no upper bound.
    fn scan_range(&self, start: &str, end: &str) -> StateResult<StateIter>;

    /// Scan all composite keys sharing `namespace` + `leading_segments`.
    ///
    /// Default implementation derives the range bounds from the key codec.
    fn scan_prefix(&self, namespace: &str, leading_segments: &[&str]) -> StateResult<StateIter> {
        let (start, end) = axle_keys::composite_range(namespace, leading_segments)?;
        self.scan_range(&start, &end)
    }

    /// Evaluate a selector (wire JSON form) over the whole state.
    ///
    /// Values that are not valid JSON records are skipped, matching the
    /// heterogeneous-namespace scan rule.
    fn rich_query(&self, selector_json: &str) -> StateResult<StateIter>;

    /// Paginated variant of [`rich_query`](Self::rich_query).
    fn rich_query_page(
        &self,
        selector_json: &str,
        page_size: u32,
        bookmark: &str,
    ) -> StateResult<QueryPage>;

    /// Full revision log of `key`, oldest first. Empty for unknown keys.
    fn history_of(&self, key: &str) -> StateResult<RevisionIter>;
}

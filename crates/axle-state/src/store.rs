//! Typed record layer over a [`WorldState`] backend.
//!
//! Entity services never touch raw bytes: this layer serializes records on
//! the way in and deserializes on the way out. Two decode policies apply,
//! per the scan rules:
//! - Single-key typed reads: a value that fails to decode as the expected
//!   record type is an `Encoding` error — the caller named the key and the
//!   type, so corruption there is fatal.
//! - Scans over heterogeneous populations: undecodable entries are skipped.

use std::sync::Arc;

use axle_query::Selector;
use axle_types::TxContext;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StateError, StateResult};
use crate::traits::{Revision, WorldState};

/// One page of typed query results.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage<T> {
    pub records: Vec<T>,
    /// Number of records actually fetched (≤ requested page size).
    pub fetched_count: u32,
    /// Opaque bookmark for the next page; empty when no further pages exist.
    pub bookmark: String,
}

/// Typed store handle shared by the entity services.
///
/// Cheap to clone; the backend is behind an `Arc`.
#[derive(Clone)]
pub struct StateStore {
    world: Arc<dyn WorldState>,
}

impl StateStore {
    pub fn new(world: Arc<dyn WorldState>) -> Self {
        Self { world }
    }

    /// The underlying backend, for operations this layer does not wrap.
    pub fn backend(&self) -> &Arc<dyn WorldState> {
        &self.world
    }

    /// Serialize `record` and write it at `key`.
    pub fn put_record<T: Serialize>(
        &self,
        ctx: &TxContext,
        key: &str,
        record: &T,
    ) -> StateResult<()> {
        let bytes = serde_json::to_vec(record).map_err(|e| StateError::Encoding {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.world.put(ctx, key, &bytes)
    }

    /// Read and decode the record at `key`. `Ok(None)` if absent; decode
    /// failure is fatal for this single-key typed read.
    pub fn get_record<T: DeserializeOwned>(&self, key: &str) -> StateResult<Option<T>> {
        match self.world.get(key)? {
            None => Ok(None),
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes).map_err(|e| StateError::Encoding {
                    key: key.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Some(record))
            }
        }
    }

    /// Remove `key`, leaving a tombstone in history.
    pub fn delete(&self, ctx: &TxContext, key: &str) -> StateResult<()> {
        self.world.delete(ctx, key)
    }

    /// Decode every record in the simple keyspace that parses as `T`,
    /// skipping entries of other shapes.
    pub fn scan_simple_records<T: DeserializeOwned>(&self) -> StateResult<Vec<(String, T)>> {
        let iter = self.world.scan_range("", "")?;
        collect_decodable(iter)
    }

    /// Decode every record under a composite prefix that parses as `T`,
    /// skipping entries of other shapes.
    pub fn scan_prefix_records<T: DeserializeOwned>(
        &self,
        namespace: &str,
        leading_segments: &[&str],
    ) -> StateResult<Vec<(String, T)>> {
        let iter = self.world.scan_prefix(namespace, leading_segments)?;
        collect_decodable(iter)
    }

    /// Run a typed selector query. The selector is serialized to wire JSON
    /// here, at the backend boundary — never earlier.
    pub fn query_records<T: DeserializeOwned>(
        &self,
        selector: &Selector,
    ) -> StateResult<Vec<(String, T)>> {
        let iter = self.world.rich_query(&selector.to_wire_json())?;
        collect_decodable(iter)
    }

    /// Paginated variant of [`query_records`](Self::query_records).
    pub fn query_records_page<T: DeserializeOwned>(
        &self,
        selector: &Selector,
        page_size: u32,
        bookmark: &str,
    ) -> StateResult<RecordPage<T>> {
        let page = self
            .world
            .rich_query_page(&selector.to_wire_json(), page_size, bookmark)?;
        let mut records = Vec::with_capacity(page.entries.len());
        for (_, bytes) in page.entries {
            if let Ok(record) = serde_json::from_slice(&bytes) {
                records.push(record);
            }
        }
        Ok(RecordPage {
            records,
            fetched_count: page.fetched_count,
            bookmark: page.bookmark,
        })
    }

    /// Paginated query in wire form, for callers that forward a selector
    /// received from outside (validated by parsing before execution).
    pub fn query_page_raw(
        &self,
        selector_json: &str,
        page_size: u32,
        bookmark: &str,
    ) -> StateResult<crate::traits::QueryPage> {
        // Reject malformed selectors before the backend sees them.
        Selector::parse_wire(selector_json)?;
        self.world.rich_query_page(selector_json, page_size, bookmark)
    }

    /// Full revision log of `key`, oldest first.
    pub fn history(&self, key: &str) -> StateResult<Vec<Revision>> {
        self.world.history_of(key)?.collect()
    }
}

fn collect_decodable<T: DeserializeOwned>(
    iter: crate::traits::StateIter,
) -> StateResult<Vec<(String, T)>> {
    let mut records = Vec::new();
    for entry in iter {
        let (key, bytes) = entry?;
        if let Ok(record) = serde_json::from_slice(&bytes) {
            records.push((key, record));
        }
    }
    Ok(records)
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryWorldState;
    use axle_keys::composite_key;
    use axle_query::Predicate;
    use axle_types::{TxContext, Vehicle};
    use chrono::Utc;
    use serde::Deserialize;

    fn store() -> StateStore {
        StateStore::new(Arc::new(InMemoryWorldState::new()))
    }

    fn ctx() -> TxContext {
        TxContext::generate()
    }

    #[test]
    fn put_and_get_typed_record() {
        let store = store();
        let vehicle = Vehicle::new("veh-001", "VIN1", "user-1", Utc::now());
        store.put_record(&ctx(), "veh-001", &vehicle).unwrap();

        let read: Vehicle = store.get_record("veh-001").unwrap().unwrap();
        assert_eq!(read, vehicle);
    }

    #[test]
    fn get_absent_record_is_none() {
        let store = store();
        let read: Option<Vehicle> = store.get_record("missing").unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn typed_read_of_wrong_shape_is_encoding_error() {
        let store = store();
        store
            .backend()
            .put(&ctx(), "veh-001", b"definitely not json")
            .unwrap();
        let err = store.get_record::<Vehicle>("veh-001").unwrap_err();
        assert!(matches!(err, StateError::Encoding { .. }));
    }

    #[test]
    fn prefix_scan_skips_foreign_shapes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Narrow {
            only_here: u32,
        }

        let store = store();
        let k1 = composite_key("ns", &["a", "1"]).unwrap();
        let k2 = composite_key("ns", &["a", "2"]).unwrap();
        store
            .backend()
            .put(&ctx(), &k1, br#"{"only_here":7}"#)
            .unwrap();
        store.backend().put(&ctx(), &k2, br#"{"other":1}"#).unwrap();

        let records: Vec<(String, Narrow)> = store.scan_prefix_records("ns", &["a"]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, Narrow { only_here: 7 });
    }

    #[test]
    fn query_records_decodes_matches() {
        let store = store();
        for (id, owner) in [("v1", "u1"), ("v2", "u2"), ("v3", "u1")] {
            let vehicle = Vehicle::new(id, format!("VIN-{id}"), owner, Utc::now());
            store.put_record(&ctx(), id, &vehicle).unwrap();
        }
        let selector = Selector::all().field("ownerUserId", Predicate::eq("u1"));
        let records: Vec<(String, Vehicle)> = store.query_records(&selector).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|(_, v)| v.owner_user_id == "u1"));
    }

    #[test]
    fn query_page_raw_rejects_malformed_selector() {
        let store = store();
        let err = store.query_page_raw("{broken", 5, "").unwrap_err();
        assert!(matches!(err, StateError::Query(_)));
    }

    #[test]
    fn history_reflects_overwrites() {
        let store = store();
        let v1 = Vehicle::new("veh-001", "VIN1", "user-1", Utc::now());
        let v2 = Vehicle::new("veh-001", "VIN1", "user-2", Utc::now());
        store.put_record(&ctx(), "veh-001", &v1).unwrap();
        store.put_record(&ctx(), "veh-001", &v2).unwrap();
        store.delete(&ctx(), "veh-001").unwrap();

        let history = store.history("veh-001").unwrap();
        assert_eq!(history.len(), 3);
        assert!(history[2].is_delete);
    }
}

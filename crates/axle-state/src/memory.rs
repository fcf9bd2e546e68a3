use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::RwLock;

use axle_keys::is_composite;
use axle_query::{paginate, run_query, Selector};
use axle_types::TxContext;
use serde_json::Value;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::traits::{KeyValue, QueryPage, Revision, RevisionIter, StateIter, WorldState};

/// In-memory world state for tests, local demos, and embedding.
///
/// Current state lives in a `BTreeMap` (so range scans are ordered for
/// free); every mutation also appends to the per-key revision log. Both are
/// guarded by one `RwLock` so a scan never observes a put/delete half
/// applied.
pub struct InMemoryWorldState {
    inner: RwLock<WorldStateInner>,
}

#[derive(Default)]
struct WorldStateInner {
    current: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<Revision>>,
}

impl InMemoryWorldState {
    /// Create a new empty world state.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(WorldStateInner::default()),
        }
    }

    /// Number of keys currently live (tombstoned keys excluded).
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").current.len()
    }

    /// Returns `true` if no key is currently live.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").current.is_empty()
    }

    /// Drop all state and history.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.current.clear();
        inner.history.clear();
    }

    /// Decoded `(key, record)` population for a rich query: every live
    /// entry whose value parses as JSON. Non-JSON values are skipped, not
    /// fatal — the state namespace is heterogeneous.
    fn json_population(&self) -> Vec<(String, Value)> {
        let inner = self.inner.read().expect("lock poisoned");
        inner
            .current
            .iter()
            .filter_map(|(key, bytes)| {
                serde_json::from_slice::<Value>(bytes)
                    .ok()
                    .map(|record| (key.clone(), record))
            })
            .collect()
    }
}

impl Default for InMemoryWorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState for InMemoryWorldState {
    fn put(&self, ctx: &TxContext, key: &str, value: &[u8]) -> StateResult<()> {
        if key.is_empty() {
            return Err(StateError::Backend {
                operation: "put".into(),
                reason: "empty key".into(),
            });
        }
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.current.insert(key.to_string(), value.to_vec());
        inner
            .history
            .entry(key.to_string())
            .or_default()
            .push(Revision {
                tx_id: ctx.tx_id.clone(),
                timestamp: ctx.timestamp,
                is_delete: false,
                value: Some(value.to_vec()),
            });
        debug!(key, bytes = value.len(), tx = %ctx.tx_id, "state put");
        Ok(())
    }

    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        let inner = self.inner.read().expect("lock poisoned");
        Ok(inner.current.get(key).cloned())
    }

    fn delete(&self, ctx: &TxContext, key: &str) -> StateResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.current.remove(key);
        inner
            .history
            .entry(key.to_string())
            .or_default()
            .push(Revision {
                tx_id: ctx.tx_id.clone(),
                timestamp: ctx.timestamp,
                is_delete: true,
                value: None,
            });
        debug!(key, tx = %ctx.tx_id, "state delete");
        Ok(())
    }

    fn scan_range(&self, start: &str, end: &str) -> StateResult<StateIter> {
        // A scan that starts in the simple keyspace never sees composite
        // keys; they live behind the leading delimiter and are reached only
        // through scan_prefix.
        let composite_scan = is_composite(start);
        let lower = Bound::Included(start.to_string());
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end.to_string())
        };

        let inner = self.inner.read().expect("lock poisoned");
        let entries: Vec<KeyValue> = inner
            .current
            .range((lower, upper))
            .filter(|(key, _)| composite_scan || !is_composite(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn rich_query(&self, selector_json: &str) -> StateResult<StateIter> {
        let selector = Selector::parse_wire(selector_json)?;
        let matched = run_query(self.json_population(), &selector)?;
        Ok(Box::new(matched.into_iter().map(encode_entry)))
    }

    fn rich_query_page(
        &self,
        selector_json: &str,
        page_size: u32,
        bookmark: &str,
    ) -> StateResult<QueryPage> {
        let selector = Selector::parse_wire(selector_json)?;
        let matched = run_query(self.json_population(), &selector)?;
        let page = paginate(matched, selector.sort(), page_size, bookmark)?;

        let entries = page
            .entries
            .into_iter()
            .map(encode_entry)
            .collect::<StateResult<Vec<KeyValue>>>()?;
        Ok(QueryPage {
            entries,
            fetched_count: page.fetched_count,
            bookmark: page.bookmark,
        })
    }

    fn history_of(&self, key: &str) -> StateResult<RevisionIter> {
        let inner = self.inner.read().expect("lock poisoned");
        let revisions = inner.history.get(key).cloned().unwrap_or_default();
        Ok(Box::new(revisions.into_iter().map(Ok)))
    }
}

fn encode_entry((key, record): (String, Value)) -> StateResult<KeyValue> {
    let bytes = serde_json::to_vec(&record).map_err(|e| StateError::Encoding {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    Ok((key, bytes))
}

impl std::fmt::Debug for InMemoryWorldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWorldState")
            .field("live_keys", &self.len())
            .finish()
    }
}

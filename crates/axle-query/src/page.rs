//! Cursor-based pagination over an ordered query result.
//!
//! The bookmark is opaque to callers: hex-encoded JSON holding the last
//! returned record's sort anchor and key. Resuming locates the anchor in the
//! current result and continues strictly after it, so consecutive pages over
//! a static dataset reproduce the unbounded query's total order with no
//! duplicates or omissions.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{QueryError, QueryResult};
use crate::eval::value_cmp;
use crate::selector::{Sort, SortOrder};

/// One page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// The page's `(key, record)` entries, at most `page_size` of them.
    pub entries: Vec<(String, Value)>,
    /// Number of entries actually fetched.
    pub fetched_count: u32,
    /// Bookmark for the next page; empty when no further pages exist.
    pub bookmark: String,
}

/// The resume position encoded into a bookmark. Field names are one letter
/// because the bookmark travels on every paginated response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Anchor {
    /// Sort-field value of the last returned record (null when unsorted).
    s: Value,
    /// Key of the last returned record.
    k: String,
}

/// Slice one page out of a fully ordered query result.
///
/// `ordered` must be the complete result in its final order (as produced by
/// [`run_query`](crate::eval::run_query) with the same selector); `sort` is
/// that selector's sort spec.
pub fn paginate(
    ordered: Vec<(String, Value)>,
    sort: Option<&Sort>,
    page_size: u32,
    bookmark: &str,
) -> QueryResult<Page> {
    if page_size == 0 {
        return Err(QueryError::InvalidPageSize);
    }

    let start = match decode_bookmark(bookmark)? {
        None => 0,
        Some(anchor) => resume_position(&ordered, sort, &anchor),
    };
    let end = ordered.len().min(start.saturating_add(page_size as usize));

    let entries: Vec<(String, Value)> = ordered[start..end].to_vec();
    let bookmark = if end >= ordered.len() {
        String::new()
    } else {
        // end > start here, so the page is non-empty.
        let (key, record) = &entries[entries.len() - 1];
        encode_bookmark(&Anchor {
            s: sort_value(record, sort),
            k: key.clone(),
        })
    };

    Ok(Page {
        fetched_count: entries.len() as u32,
        entries,
        bookmark,
    })
}

/// Index of the first entry strictly after the anchor in the effective order.
///
/// The common case finds the anchor key itself and resumes just past it. If
/// the anchored record is gone (the dataset changed between pages), fall back
/// to the first entry ordering after the anchor's `(sort value, key)` pair.
fn resume_position(ordered: &[(String, Value)], sort: Option<&Sort>, anchor: &Anchor) -> usize {
    if let Some(position) = ordered.iter().position(|(key, _)| *key == anchor.k) {
        return position + 1;
    }
    ordered
        .iter()
        .position(|(key, record)| effective_cmp(&sort_value(record, sort), key, anchor, sort) == Ordering::Greater)
        .unwrap_or(ordered.len())
}

fn effective_cmp(sort_val: &Value, key: &str, anchor: &Anchor, sort: Option<&Sort>) -> Ordering {
    let primary = match sort.map(|s| s.order) {
        Some(SortOrder::Desc) => value_cmp(&anchor.s, sort_val),
        _ => value_cmp(sort_val, &anchor.s),
    };
    primary.then_with(|| key.cmp(&anchor.k))
}

fn sort_value(record: &Value, sort: Option<&Sort>) -> Value {
    match sort {
        Some(sort) => record.get(&sort.field).cloned().unwrap_or(Value::Null),
        None => Value::Null,
    }
}

fn encode_bookmark(anchor: &Anchor) -> String {
    // Anchor always serializes; its fields are a Value and a String.
    let json = serde_json::to_vec(anchor).unwrap_or_default();
    hex::encode(json)
}

fn decode_bookmark(bookmark: &str) -> QueryResult<Option<Anchor>> {
    if bookmark.is_empty() {
        return Ok(None);
    }
    let bytes = hex::decode(bookmark)
        .map_err(|e| QueryError::InvalidBookmark(e.to_string()))?;
    let anchor: Anchor = serde_json::from_slice(&bytes)
        .map_err(|e| QueryError::InvalidBookmark(e.to_string()))?;
    Ok(Some(anchor))
}

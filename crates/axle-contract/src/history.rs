use axle_state::{Revision, StateError};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ContractResult;

/// One revision of an entity, decoded for audit/history consumers.
///
/// Tombstones carry no record. History is read-only and must not be used to
/// reconstruct current state — `Get` already answers that.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry<T> {
    pub tx_id: String,
    pub timestamp: DateTime<Utc>,
    pub is_delete: bool,
    pub record: Option<T>,
}

impl<T: DeserializeOwned> HistoryEntry<T> {
    /// Decode a backend revision. The caller asked for the history of one
    /// known key, so a live revision that fails to decode as `T` is fatal.
    pub fn from_revision(key: &str, revision: Revision) -> ContractResult<Self> {
        let record = match (&revision.value, revision.is_delete) {
            (Some(bytes), false) => Some(serde_json::from_slice(bytes).map_err(|e| {
                StateError::Encoding {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })?),
            _ => None,
        };
        Ok(Self {
            tx_id: revision.tx_id,
            timestamp: revision.timestamp,
            is_delete: revision.is_delete,
            record,
        })
    }
}

/// Decode a whole revision log, oldest first.
pub(crate) fn decode_history<T: DeserializeOwned>(
    key: &str,
    revisions: Vec<Revision>,
) -> ContractResult<Vec<HistoryEntry<T>>> {
    revisions
        .into_iter()
        .map(|revision| HistoryEntry::from_revision(key, revision))
        .collect()
}

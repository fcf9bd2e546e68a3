use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Per-invocation transaction handle.
///
/// Every mutating operation receives a `TxContext` from the execution host.
/// Its timestamp is the authoritative clock for the invocation: record
/// timestamps, key segments, and expiry arithmetic all derive from it, so a
/// re-invoked operation writes byte-identical state. There is no process-wide
/// ambient context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    /// Transaction identifier assigned by the host, recorded in history.
    pub tx_id: String,
    /// Transaction timestamp assigned by the host.
    pub timestamp: DateTime<Utc>,
}

impl TxContext {
    pub fn new(tx_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            tx_id: tx_id.into(),
            timestamp,
        }
    }

    /// Generate a context with a fresh v7 UUID and the current wall clock.
    ///
    /// Intended for tests and embedding against the in-memory backend; a
    /// real execution host supplies its own IDs and timestamps.
    pub fn generate() -> Self {
        Self {
            tx_id: Uuid::now_v7().to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Transaction timestamp as nanoseconds since the UNIX epoch.
    ///
    /// Used as the trailing composite-key segment for append-only records.
    /// Valid for timestamps up to the year 2262.
    pub fn unix_nanos(&self) -> i64 {
        self.timestamp.timestamp_nanos_opt().unwrap_or_default()
    }
}

impl fmt::Display for TxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tx_id, self.timestamp.to_rfc3339())
    }
}

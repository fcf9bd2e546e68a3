use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One telemetry submission for a vehicle.
///
/// Many records exist per vehicle; the storage key is the composite
/// `(car_id, insert_time nanos)`, so records are never merged or overwritten
/// as long as timestamps stay nanosecond-distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryRecord {
    /// On-chain ID of the vehicle this record belongs to.
    pub car_id: String,
    /// Opaque string-encoded telemetry blob. The ledger never interprets it.
    pub car_data: String,
    /// Transaction timestamp of the submission.
    pub insert_time: DateTime<Utc>,
}

impl TelemetryRecord {
    pub fn new(
        car_id: impl Into<String>,
        car_data: impl Into<String>,
        insert_time: DateTime<Utc>,
    ) -> Self {
        Self {
            car_id: car_id.into(),
            car_data: car_data.into(),
            insert_time,
        }
    }
}

/// Content hash anchored on-chain for an off-chain telemetry batch.
///
/// Append-only: one record per submission event. Hashes are not required to
/// be unique across submissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataHash {
    /// On-chain ID of the vehicle the hashed data belongs to.
    pub on_chain_id: String,
    /// Content hash of the off-chain payload.
    pub hash: String,
    /// Transaction timestamp of the submission.
    pub timestamp: DateTime<Utc>,
}

impl DataHash {
    pub fn new(
        on_chain_id: impl Into<String>,
        hash: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            on_chain_id: on_chain_id.into(),
            hash: hash.into(),
            timestamp,
        }
    }
}

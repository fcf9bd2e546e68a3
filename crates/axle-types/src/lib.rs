//! Foundation types for Axle, the vehicle telemetry ledger core.
//!
//! This crate defines:
//! - The four entity records stored in world state (`Vehicle`,
//!   `TelemetryRecord`, `DataHash`, `AccessGrant`)
//! - `TxContext`, the per-invocation transaction handle carrying the
//!   authoritative transaction ID and timestamp
//!
//! Records serialize with the camelCase field names of the existing wire
//! format; changing a serialized name is a breaking change for every peer
//! that shares the ledger.

pub mod access;
pub mod context;
pub mod telemetry;
pub mod vehicle;

pub use access::AccessGrant;
pub use context::TxContext;
pub use telemetry::{DataHash, TelemetryRecord};
pub use vehicle::Vehicle;

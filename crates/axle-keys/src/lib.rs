//! Key codec for the Axle world state.
//!
//! Two key shapes exist:
//! - Simple keys: the entity's own identifier, used for primary lookup
//!   (a vehicle by its on-chain ID).
//! - Composite keys: a namespace plus ordered segments joined by a reserved
//!   delimiter, used for one-to-many relations
//!   (`telemetry~carId~nanos`, `access~vehicleId~granteeId`).
//!
//! Composite keys sharing a namespace and leading segments are contiguous
//! under lexicographic order, which is what makes prefix-range scans work.
//! Segment values containing the delimiter are rejected rather than escaped;
//! escaping would change the wire keys already committed to the ledger.

pub mod codec;
pub mod error;

pub use codec::{
    composite_key, composite_range, is_composite, simple_key, split_composite_key, DELIMITER,
};
pub use error::{KeyError, KeyResult};

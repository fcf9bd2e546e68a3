//! Entity services of the Axle vehicle telemetry ledger.
//!
//! Each service composes the key codec, typed state store, query engine,
//! and history reader into the business operations the contract exposes:
//! - [`VehicleRegistry`] — register/read vehicles and the vehicle queries
//! - [`TelemetryLedger`] — telemetry submissions, data hashes, and their
//!   queries
//! - [`AccessGrants`] — time-bounded grants over a vehicle's data
//!
//! Every operation takes plain scalar arguments plus a [`TxContext`] for
//! mutations, validates before the first backend call, and performs exactly
//! one logical backend mutation. There is no ambient state: services hold a
//! [`StateStore`] handle injected at construction.
//!
//! [`TxContext`]: axle_types::TxContext
//! [`StateStore`]: axle_state::StateStore

pub mod access;
pub mod error;
pub mod history;
pub mod telemetry;
pub mod vehicles;

pub use access::AccessGrants;
pub use error::{ContractError, ContractResult};
pub use history::HistoryEntry;
pub use telemetry::TelemetryLedger;
pub use vehicles::VehicleRegistry;

/// Composite-key namespaces used by the services. These are wire-visible:
/// changing one orphans every record already committed under it.
pub mod ns {
    /// Telemetry records: `telemetry~carId~nanos`.
    pub const TELEMETRY: &str = "telemetry";
    /// Data hashes: `datahash~onChainId~nanos`.
    pub const DATA_HASH: &str = "datahash";
    /// Access grants: `access~onChainId~granteeId`.
    pub const ACCESS: &str = "access";
}

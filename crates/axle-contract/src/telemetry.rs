use axle_keys::composite_key;
use axle_query::{Predicate, Selector, SortOrder};
use axle_state::{RecordPage, StateStore};
use axle_types::{DataHash, TelemetryRecord, TxContext};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{require, ContractError, ContractResult};
use crate::history::{decode_history, HistoryEntry};
use crate::ns;

/// Telemetry ledger: append-only telemetry records and data hashes.
///
/// Records are keyed by `(carId, transaction nanos)`, so every submission is
/// a new key — nothing here ever overwrites, as long as the host hands out
/// nanosecond-distinct transaction timestamps per vehicle.
#[derive(Debug, Clone)]
pub struct TelemetryLedger {
    store: StateStore,
}

impl TelemetryLedger {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Append a telemetry record for `car_id`. Returns the storage key and
    /// the record as committed.
    pub fn submit_telemetry(
        &self,
        ctx: &TxContext,
        car_id: &str,
        car_data: &str,
    ) -> ContractResult<(String, TelemetryRecord)> {
        require("carId", car_id)?;

        let record = TelemetryRecord::new(car_id, car_data, ctx.timestamp);
        let key = composite_key(ns::TELEMETRY, &[car_id, &ctx.unix_nanos().to_string()])?;
        self.store.put_record(ctx, &key, &record)?;
        debug!(car_id, tx = %ctx.tx_id, "telemetry submitted");
        Ok((key, record))
    }

    /// Read one telemetry record by its full composite key.
    pub fn read_telemetry(&self, key: &str) -> ContractResult<TelemetryRecord> {
        require("key", key)?;
        self.store
            .get_record(key)?
            .ok_or_else(|| ContractError::not_found("telemetry record", key))
    }

    /// All telemetry for one vehicle, in timestamp (key) order. This is the
    /// composite-key fast path: the scan is bounded to the vehicle's prefix
    /// before any record is read.
    pub fn telemetry_by_vehicle(&self, car_id: &str) -> ContractResult<Vec<TelemetryRecord>> {
        require("carId", car_id)?;
        let records = self
            .store
            .scan_prefix_records::<TelemetryRecord>(ns::TELEMETRY, &[car_id])?;
        Ok(records.into_iter().map(|(_, r)| r).collect())
    }

    /// Every telemetry record in the namespace, across all vehicles.
    pub fn all_telemetry(&self) -> ContractResult<Vec<TelemetryRecord>> {
        let records = self
            .store
            .scan_prefix_records::<TelemetryRecord>(ns::TELEMETRY, &[])?;
        Ok(records.into_iter().map(|(_, r)| r).collect())
    }

    /// Telemetry inserted strictly after `after`, newest first.
    pub fn telemetry_after(&self, after: DateTime<Utc>) -> ContractResult<Vec<TelemetryRecord>> {
        let selector = Selector::all()
            .field("insertTime", Predicate::gt(after.to_rfc3339()))
            .sort_by("insertTime", SortOrder::Desc);
        self.query_telemetry(&selector)
    }

    /// Telemetry for one vehicle within an inclusive time window, newest
    /// first. Either bound may be absent.
    pub fn telemetry_in_range(
        &self,
        car_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ContractResult<Vec<TelemetryRecord>> {
        require("carId", car_id)?;
        let mut selector = Selector::all().field("carId", Predicate::eq(car_id));
        if let Some(start) = start {
            selector = selector.field("insertTime", Predicate::gte(start.to_rfc3339()));
        }
        if let Some(end) = end {
            selector = selector.field("insertTime", Predicate::lte(end.to_rfc3339()));
        }
        selector = selector.sort_by("insertTime", SortOrder::Desc);
        self.query_telemetry(&selector)
    }

    /// Paginated rich query over telemetry, selector in wire form.
    pub fn telemetry_page(
        &self,
        selector_json: &str,
        page_size: u32,
        bookmark: &str,
    ) -> ContractResult<RecordPage<TelemetryRecord>> {
        let selector = Selector::parse_wire(selector_json).map_err(axle_state::StateError::from)?;
        Ok(self
            .store
            .query_records_page(&selector, page_size, bookmark)?)
    }

    /// Full revision history of one telemetry key, oldest first.
    pub fn telemetry_history(
        &self,
        key: &str,
    ) -> ContractResult<Vec<HistoryEntry<TelemetryRecord>>> {
        require("key", key)?;
        let revisions = self.store.history(key)?;
        decode_history(key, revisions)
    }

    /// Anchor a content hash for `on_chain_id`. Keys carry the transaction
    /// timestamp at nanosecond resolution, so two submissions in the same
    /// second land under distinct keys.
    pub fn submit_data_hash(
        &self,
        ctx: &TxContext,
        on_chain_id: &str,
        hash: &str,
    ) -> ContractResult<(String, DataHash)> {
        require("onChainId", on_chain_id)?;
        require("dataHash", hash)?;

        let record = DataHash::new(on_chain_id, hash, ctx.timestamp);
        let key = composite_key(ns::DATA_HASH, &[on_chain_id, &ctx.unix_nanos().to_string()])?;
        self.store.put_record(ctx, &key, &record)?;
        info!(on_chain_id, tx = %ctx.tx_id, "data hash anchored");
        Ok((key, record))
    }

    /// All anchored hashes for one vehicle, in submission order.
    pub fn data_hashes_by_vehicle(&self, on_chain_id: &str) -> ContractResult<Vec<DataHash>> {
        require("onChainId", on_chain_id)?;
        let records = self
            .store
            .scan_prefix_records::<DataHash>(ns::DATA_HASH, &[on_chain_id])?;
        Ok(records.into_iter().map(|(_, r)| r).collect())
    }

    fn query_telemetry(&self, selector: &Selector) -> ContractResult<Vec<TelemetryRecord>> {
        let records = self.store.query_records::<TelemetryRecord>(selector)?;
        Ok(records.into_iter().map(|(_, r)| r).collect())
    }
}

use axle_keys::simple_key;
use axle_query::{Predicate, Selector, SortOrder};
use axle_state::{RecordPage, StateStore};
use axle_types::{TxContext, Vehicle};
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{require, ContractError, ContractResult};
use crate::history::{decode_history, HistoryEntry};

/// Vehicle registry: primary-entity records keyed by on-chain ID.
#[derive(Debug, Clone)]
pub struct VehicleRegistry {
    store: StateStore,
}

impl VehicleRegistry {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Register a vehicle under `on_chain_id`.
    ///
    /// Fails with `AlreadyExists` if the ID is taken; registration is not an
    /// upsert.
    pub fn register_vehicle(
        &self,
        ctx: &TxContext,
        on_chain_id: &str,
        vin: &str,
        owner_user_id: &str,
    ) -> ContractResult<Vehicle> {
        require("onChainId", on_chain_id)?;
        require("vin", vin)?;
        require("ownerUserId", owner_user_id)?;

        let key = simple_key(on_chain_id)?;
        if self.store.get_record::<Vehicle>(&key)?.is_some() {
            return Err(ContractError::AlreadyExists {
                entity: "vehicle",
                key,
            });
        }

        let vehicle = Vehicle::new(on_chain_id, vin, owner_user_id, ctx.timestamp);
        self.store.put_record(ctx, &key, &vehicle)?;
        info!(on_chain_id, owner = owner_user_id, tx = %ctx.tx_id, "vehicle registered");
        Ok(vehicle)
    }

    /// Read the current record for `on_chain_id`.
    pub fn read_vehicle(&self, on_chain_id: &str) -> ContractResult<Vehicle> {
        require("onChainId", on_chain_id)?;
        let key = simple_key(on_chain_id)?;
        self.store
            .get_record(&key)?
            .ok_or_else(|| ContractError::not_found("vehicle", key))
    }

    /// All registered vehicles, in key order. Foreign records in the simple
    /// keyspace are skipped.
    pub fn all_vehicles(&self) -> ContractResult<Vec<Vehicle>> {
        let records = self.store.scan_simple_records::<Vehicle>()?;
        Ok(records.into_iter().map(|(_, v)| v).collect())
    }

    /// Vehicles owned by `owner_user_id`.
    pub fn vehicles_by_owner(&self, owner_user_id: &str) -> ContractResult<Vec<Vehicle>> {
        require("ownerUserId", owner_user_id)?;
        let selector = Selector::all().field("ownerUserId", Predicate::eq(owner_user_id));
        self.query_vehicles(&selector)
    }

    /// Vehicles whose VIN starts with `vin_prefix`. The prefix is escaped
    /// before entering the `$regex` predicate.
    pub fn vehicles_by_vin_prefix(&self, vin_prefix: &str) -> ContractResult<Vec<Vehicle>> {
        require("vinPrefix", vin_prefix)?;
        let selector = Selector::all().field("vin", Predicate::starts_with(vin_prefix));
        self.query_vehicles(&selector)
    }

    /// Vehicles registered strictly after `after` (`$gt`, exclusive), oldest
    /// first.
    pub fn vehicles_registered_after(&self, after: DateTime<Utc>) -> ContractResult<Vec<Vehicle>> {
        let selector = Selector::all()
            .field("registeredAt", Predicate::gt(after.to_rfc3339()))
            .sort_by("registeredAt", SortOrder::Asc);
        self.query_vehicles(&selector)
    }

    /// AND of the criteria that are present. All absent means all vehicles
    /// that carry an owner field, i.e. every vehicle.
    pub fn vehicles_by_criteria(
        &self,
        owner_user_id: Option<&str>,
        vin_prefix: Option<&str>,
        registered_after: Option<DateTime<Utc>>,
    ) -> ContractResult<Vec<Vehicle>> {
        let mut selector = Selector::all();
        if let Some(owner) = owner_user_id {
            require("ownerUserId", owner)?;
            selector = selector.field("ownerUserId", Predicate::eq(owner));
        }
        if let Some(prefix) = vin_prefix {
            require("vinPrefix", prefix)?;
            selector = selector.field("vin", Predicate::starts_with(prefix));
        }
        if let Some(after) = registered_after {
            selector = selector.field("registeredAt", Predicate::gt(after.to_rfc3339()));
        }
        if selector.is_empty() {
            return self.all_vehicles();
        }
        self.query_vehicles(&selector)
    }

    /// Paginated rich query over vehicles, accepting a selector in wire
    /// form (as forwarded by the façade). The selector is parsed and
    /// validated before execution.
    pub fn vehicles_page(
        &self,
        selector_json: &str,
        page_size: u32,
        bookmark: &str,
    ) -> ContractResult<RecordPage<Vehicle>> {
        let selector = Selector::parse_wire(selector_json).map_err(axle_state::StateError::from)?;
        Ok(self
            .store
            .query_records_page(&selector, page_size, bookmark)?)
    }

    /// Full revision history of a vehicle, oldest first.
    pub fn vehicle_history(&self, on_chain_id: &str) -> ContractResult<Vec<HistoryEntry<Vehicle>>> {
        require("onChainId", on_chain_id)?;
        let key = simple_key(on_chain_id)?;
        let revisions = self.store.history(&key)?;
        decode_history(&key, revisions)
    }

    fn query_vehicles(&self, selector: &Selector) -> ContractResult<Vec<Vehicle>> {
        let records = self.store.query_records::<Vehicle>(selector)?;
        Ok(records.into_iter().map(|(_, v)| v).collect())
    }
}

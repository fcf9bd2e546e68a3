use axle_keys::composite_key;
use axle_state::StateStore;
use axle_types::{AccessGrant, TxContext};
use chrono::Duration;
use tracing::info;

use crate::error::{require, ContractError, ContractResult};
use crate::ns;

/// Access grants: at most one grant per `(vehicle, grantee)` pair.
///
/// Granting again for a pair replaces the earlier grant. Expiry is never
/// enforced by deletion — a grant stays in state past `expires_at` and the
/// reader decides what an expired grant means.
#[derive(Debug, Clone)]
pub struct AccessGrants {
    store: StateStore,
}

impl AccessGrants {
    pub fn new(store: StateStore) -> Self {
        Self { store }
    }

    /// Grant `granted_to` access to `on_chain_id` for `duration_days` days
    /// from the transaction timestamp.
    ///
    /// `duration_days` must be at least 1; this is enforced here, not left
    /// to the transport layer, so no caller can mint an already-expired
    /// grant.
    pub fn grant_access(
        &self,
        ctx: &TxContext,
        on_chain_id: &str,
        granted_to: &str,
        duration_days: i64,
    ) -> ContractResult<AccessGrant> {
        require("onChainId", on_chain_id)?;
        require("grantedTo", granted_to)?;
        if duration_days < 1 {
            return Err(ContractError::invalid(format!(
                "durationDays must be at least 1, got {duration_days}"
            )));
        }

        let grant = AccessGrant::new(
            on_chain_id,
            granted_to,
            ctx.timestamp,
            ctx.timestamp + Duration::days(duration_days),
        );
        let key = composite_key(ns::ACCESS, &[on_chain_id, granted_to])?;
        self.store.put_record(ctx, &key, &grant)?;
        info!(on_chain_id, granted_to, duration_days, tx = %ctx.tx_id, "access granted");
        Ok(grant)
    }

    /// Current grant for the pair, or `Ok(None)` when none exists.
    ///
    /// Absence is a valid answer, not an error. An expired grant is still
    /// returned; compare `expires_at` (or use `AccessGrant::is_expired_at`)
    /// to distinguish "absent" from "expired".
    pub fn read_access(
        &self,
        on_chain_id: &str,
        granted_to: &str,
    ) -> ContractResult<Option<AccessGrant>> {
        require("onChainId", on_chain_id)?;
        require("grantedTo", granted_to)?;
        let key = composite_key(ns::ACCESS, &[on_chain_id, granted_to])?;
        Ok(self.store.get_record(&key)?)
    }

    /// Every grant on one vehicle, across grantees.
    pub fn grants_by_vehicle(&self, on_chain_id: &str) -> ContractResult<Vec<AccessGrant>> {
        require("onChainId", on_chain_id)?;
        let records = self
            .store
            .scan_prefix_records::<AccessGrant>(ns::ACCESS, &[on_chain_id])?;
        Ok(records.into_iter().map(|(_, g)| g).collect())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-bounded grant of read access over a vehicle's data.
///
/// At most one grant exists per `(on_chain_id, granted_to)` pair; granting
/// again for the same pair replaces the previous record. Grants are never
/// auto-deleted on expiry — callers compare `expires_at` against their own
/// clock, typically via [`AccessGrant::is_expired_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    /// On-chain ID of the vehicle (the resource being shared).
    pub on_chain_id: String,
    /// Identifier of the grantee (e.g. an insurance company ID).
    pub granted_to: String,
    /// Transaction timestamp of the grant.
    pub granted_at: DateTime<Utc>,
    /// Instant after which the grant no longer confers access.
    pub expires_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn new(
        on_chain_id: impl Into<String>,
        granted_to: impl Into<String>,
        granted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            on_chain_id: on_chain_id.into(),
            granted_to: granted_to.into(),
            granted_at,
            expires_at,
        }
    }

    /// Returns `true` if the grant has expired as of `at`.
    ///
    /// A grant expiring exactly at `at` is considered expired.
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at <= at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn wire_field_names() {
        let granted = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let grant = AccessGrant::new("veh-001", "ins-co-1", granted, granted + Duration::days(30));
        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(json["onChainId"], "veh-001");
        assert_eq!(json["grantedTo"], "ins-co-1");
        assert!(json["grantedAt"].is_string());
        assert!(json["expiresAt"].is_string());
    }

    #[test]
    fn expiry_boundary() {
        let granted = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let expires = granted + Duration::days(30);
        let grant = AccessGrant::new("veh-001", "ins-co-1", granted, expires);

        assert!(!grant.is_expired_at(expires - Duration::nanoseconds(1)));
        assert!(grant.is_expired_at(expires));
        assert!(grant.is_expired_at(expires + Duration::nanoseconds(1)));
    }

    #[test]
    fn serde_roundtrip() {
        let grant = AccessGrant::new(
            "veh-002",
            "ins-co-2",
            Utc::now(),
            Utc::now() + Duration::days(5),
        );
        let json = serde_json::to_string(&grant).unwrap();
        let parsed: AccessGrant = serde_json::from_str(&json).unwrap();
        assert_eq!(grant, parsed);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered vehicle, keyed in world state by its on-chain ID.
///
/// At most one current record exists per `on_chain_id`; registration of an
/// already-taken ID is rejected by the registry service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Primary key in world state.
    pub on_chain_id: String,
    /// Vehicle identification number.
    pub vin: String,
    /// Identifier of the owning user.
    pub owner_user_id: String,
    /// Transaction timestamp of the registration.
    pub registered_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(
        on_chain_id: impl Into<String>,
        vin: impl Into<String>,
        owner_user_id: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            on_chain_id: on_chain_id.into(),
            vin: vin.into(),
            owner_user_id: owner_user_id.into(),
            registered_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wire_field_names_are_stable() {
        let vehicle = Vehicle::new(
            "veh-001",
            "1HGBH41JXMN109186",
            "user-42",
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        );
        let json = serde_json::to_value(&vehicle).unwrap();
        assert_eq!(json["onChainId"], "veh-001");
        assert_eq!(json["vin"], "1HGBH41JXMN109186");
        assert_eq!(json["ownerUserId"], "user-42");
        assert!(json["registeredAt"].is_string());
    }

    #[test]
    fn serde_roundtrip() {
        let vehicle = Vehicle::new("veh-002", "VIN123", "user-7", Utc::now());
        let json = serde_json::to_string(&vehicle).unwrap();
        let parsed: Vehicle = serde_json::from_str(&json).unwrap();
        assert_eq!(vehicle, parsed);
    }

    #[test]
    fn deserializes_legacy_payload() {
        let json = r#"{
            "onChainId": "veh-003",
            "vin": "WVWZZZ1JZXW000001",
            "ownerUserId": "user-9",
            "registeredAt": "2024-06-01T12:30:00Z"
        }"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.on_chain_id, "veh-003");
        assert_eq!(vehicle.owner_user_id, "user-9");
    }
}

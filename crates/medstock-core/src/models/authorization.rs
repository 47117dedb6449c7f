//! High-cost medication entitlement models.
//!
//! A [`PatientMedicationLink`] ties a patient to a medication together with the
//! authorization window and dispensation counter. Derived fields
//! ([`AuthorizationState`], [`DispensationAllowance`]) are computed on read by
//! [`crate::tracker`] and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Default authorization length for new links.
pub const DEFAULT_DURATION_MONTHS: u32 = 3;

/// Staff-settable availability of a patient's medication.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Waiting for staff to confirm stock for the next delivery
    #[default]
    Awaiting,
    /// Ready to be picked up
    Available,
    /// Delivery disabled until stock returns
    OutOfStock,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Awaiting => "awaiting",
            LinkStatus::Available => "available",
            LinkStatus::OutOfStock => "out_of_stock",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting" => Some(LinkStatus::Awaiting),
            "available" => Some(LinkStatus::Available),
            "out_of_stock" => Some(LinkStatus::OutOfStock),
            _ => None,
        }
    }
}

/// Authorization record linking a patient to a high-cost medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientMedicationLink {
    /// Local UUID
    pub id: String,
    pub patient_id: String,
    pub medication_id: String,
    /// Start of the current authorization window; `None` until authorized
    pub authorization_date: Option<NaiveDate>,
    /// Window length in calendar months (usually 3 or 6)
    pub duration_months: u32,
    /// Deliveries made in the current window
    pub dispensations_performed: u32,
    pub status: LinkStatus,
    pub created_at: String,
}

impl PatientMedicationLink {
    /// Create a link with no authorization date, the default duration and status `awaiting`.
    pub fn new(patient_id: String, medication_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            medication_id,
            authorization_date: None,
            duration_months: DEFAULT_DURATION_MONTHS,
            dispensations_performed: 0,
            status: LinkStatus::default(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Where an authorization stands relative to its expiration date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// No authorization date (or duration) recorded yet
    Undefined,
    Active,
    /// Expires within the warning window
    ExpiringSoon,
    Expired,
}

impl AuthorizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationStatus::Undefined => "undefined",
            AuthorizationStatus::Active => "active",
            AuthorizationStatus::ExpiringSoon => "expiring_soon",
            AuthorizationStatus::Expired => "expired",
        }
    }
}

/// Derived authorization status with the signed day count behind it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthorizationState {
    pub status: AuthorizationStatus,
    /// Days until expiration; negative once expired, `None` when undefined
    pub days_remaining: Option<i64>,
}

/// Dispensation counts for the current authorization window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispensationAllowance {
    pub allowed: i64,
    pub performed: i64,
    /// May be negative when over-dispensed
    pub remaining: i64,
}

/// Everything a staff screen needs to render one link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkSummary {
    pub link_id: String,
    pub status: LinkStatus,
    pub authorization: AuthorizationState,
    pub allowance: DispensationAllowance,
    /// The authorization is expiring soon or expired
    pub needs_renewal: bool,
}

/// One delivery of a medication to a patient. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispensationEvent {
    pub id: String,
    pub link_id: String,
    pub dispensed_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl DispensationEvent {
    pub fn new(link_id: String, dispensed_at: DateTime<Utc>, note: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            link_id,
            dispensed_at,
            // Blank notes are not worth storing
            note: note.filter(|n| !n.trim().is_empty()),
        }
    }
}

/// A medication managed by the high-cost programme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighCostMedication {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl HighCostMedication {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description: description.filter(|d| !d.trim().is_empty()),
        }
    }
}

/// A received lot of a high-cost medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLot {
    pub id: String,
    pub medication_id: String,
    pub lot_number: String,
    pub expiry_date: NaiveDate,
    pub quantity: u32,
}

impl StockLot {
    pub fn new(medication_id: String, lot_number: &str, expiry_date: NaiveDate, quantity: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            medication_id,
            lot_number: lot_number.trim().to_string(),
            expiry_date,
            quantity,
        }
    }
}

/// One linked medication as a patient sees it: availability plus the lots still in stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsultedMedication {
    pub link: PatientMedicationLink,
    pub medication: HighCostMedication,
    /// Lots with quantity left, soonest expiry first
    pub lots: Vec<StockLot>,
}

/// Result of a citizen looking up their own SUS card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SusConsultation {
    pub patient: super::Patient,
    pub medications: Vec<ConsultedMedication>,
}

/// Shelf-life flag shown next to a lot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LotExpiry {
    Valid,
    ExpiringSoon,
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_defaults() {
        let link = PatientMedicationLink::new("p1".into(), "m1".into());
        assert_eq!(link.status, LinkStatus::Awaiting);
        assert_eq!(link.duration_months, 3);
        assert_eq!(link.dispensations_performed, 0);
        assert!(link.authorization_date.is_none());
    }

    #[test]
    fn test_link_status_strings() {
        for status in [LinkStatus::Awaiting, LinkStatus::Available, LinkStatus::OutOfStock] {
            assert_eq!(LinkStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(LinkStatus::parse("delivered"), None);
    }

    #[test]
    fn test_event_drops_blank_note() {
        let event = DispensationEvent::new("l1".into(), Utc::now(), Some("   ".into()));
        assert!(event.note.is_none());
    }

    #[test]
    fn test_lot_number_trimmed() {
        let date = NaiveDate::from_ymd_opt(2027, 1, 31).unwrap();
        let lot = StockLot::new("m1".into(), "  PTG1263A ", date, 40);
        assert_eq!(lot.lot_number, "PTG1263A");
    }
}

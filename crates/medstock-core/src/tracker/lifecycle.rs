//! Status transitions on a patient-medication link.
//!
//! ```text
//!   awaiting ──mark_available──▶ available
//!      ▲                            │
//!      └──────record_dispensation───┘
//!   any ──mark_out_of_stock──▶ out_of_stock ──mark_available──▶ available
//! ```

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    AuthorizationState, DispensationAllowance, DispensationEvent, LinkStatus, LinkSummary,
    PatientMedicationLink,
};

use super::{authorization_status, dispensation_allowance, TrackerError, TrackerResult};

impl PatientMedicationLink {
    /// Authorization status as of `today`.
    pub fn authorization(&self, today: NaiveDate) -> AuthorizationState {
        authorization_status(self.authorization_date, Some(self.duration_months), today)
    }

    pub fn allowance(&self) -> DispensationAllowance {
        dispensation_allowance(self.duration_months, i64::from(self.dispensations_performed))
    }

    /// All derived fields for display.
    pub fn summary(&self, today: NaiveDate) -> LinkSummary {
        let authorization = self.authorization(today);
        LinkSummary {
            link_id: self.id.clone(),
            status: self.status,
            authorization,
            allowance: self.allowance(),
            needs_renewal: authorization.status.needs_renewal(),
        }
    }

    /// Staff confirmed stock for the next delivery.
    pub fn mark_available(&mut self) {
        self.status = LinkStatus::Available;
    }

    /// The availability switch: available ↔ awaiting. Out of stock switches on to available.
    pub fn toggle_availability(&mut self) {
        self.status = match self.status {
            LinkStatus::Available => LinkStatus::Awaiting,
            LinkStatus::Awaiting | LinkStatus::OutOfStock => LinkStatus::Available,
        };
    }

    pub fn mark_out_of_stock(&mut self) {
        self.status = LinkStatus::OutOfStock;
    }

    /// Record one delivery: the counter goes up by one and the link waits for a new confirmation.
    pub fn record_dispensation(
        &mut self,
        at: DateTime<Utc>,
        note: Option<String>,
    ) -> TrackerResult<DispensationEvent> {
        if !self.status.allows_delivery() {
            return Err(TrackerError::DeliveryDisabled(self.id.clone()));
        }
        self.dispensations_performed = self.dispensations_performed.saturating_add(1);
        self.status = LinkStatus::Awaiting;
        Ok(DispensationEvent::new(self.id.clone(), at, note))
    }

    /// Start a fresh authorization window today. Status is left as is.
    pub fn renew(&mut self, today: NaiveDate) {
        self.authorization_date = Some(today);
        self.dispensations_performed = 0;
    }
}

//! Authorization lifecycle tracker.
//!
//! Pure functions over a [`crate::models::PatientMedicationLink`] snapshot: authorization status,
//! dispensation allowance, the staff-driven status transitions and lot expiry
//! flags. Nothing here touches storage; [`crate::db`] persists the results.

mod lifecycle;
mod lots;

pub use lots::*;

use chrono::{Months, NaiveDate};
use thiserror::Error;

use crate::models::{AuthorizationState, AuthorizationStatus, DispensationAllowance, LinkStatus};

/// Days before expiration at which an authorization counts as expiring soon.
pub const EXPIRING_SOON_DAYS: i64 = 15;

/// Tracker errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Delivery disabled while medication is out of stock (link {0})")]
    DeliveryDisabled(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Status of an authorization granted on `authorization_date` for `duration_months`, as of `today`.
///
/// A missing date or a missing/zero duration yields [`AuthorizationStatus::Undefined`].
pub fn authorization_status(
    authorization_date: Option<NaiveDate>,
    duration_months: Option<u32>,
    today: NaiveDate,
) -> AuthorizationState {
    let undefined = AuthorizationState {
        status: AuthorizationStatus::Undefined,
        days_remaining: None,
    };

    let (Some(start), Some(months)) = (authorization_date, duration_months.filter(|m| *m > 0)) else {
        return undefined;
    };
    let Some(expiration) = expiration_date(start, months) else {
        return undefined;
    };

    let days_remaining = (expiration - today).num_days();
    let status = if days_remaining < 0 {
        AuthorizationStatus::Expired
    } else if days_remaining <= EXPIRING_SOON_DAYS {
        AuthorizationStatus::ExpiringSoon
    } else {
        AuthorizationStatus::Active
    };

    AuthorizationState {
        status,
        days_remaining: Some(days_remaining),
    }
}

/// Calendar-month addition; the 31st clamps to the last day of shorter months.
pub fn expiration_date(authorization_date: NaiveDate, duration_months: u32) -> Option<NaiveDate> {
    authorization_date.checked_add_months(Months::new(duration_months))
}

/// Dispensations allowed per authorization window: 6 for six-month windows, 3 otherwise.
pub fn dispensations_allowed(duration_months: u32) -> i64 {
    if duration_months == 6 {
        6
    } else {
        3
    }
}

/// Allowance bookkeeping. `remaining` is not clamped and goes negative when over-dispensed.
pub fn dispensation_allowance(duration_months: u32, dispensations_performed: i64) -> DispensationAllowance {
    let allowed = dispensations_allowed(duration_months);
    let performed = dispensations_performed.max(0);
    DispensationAllowance {
        allowed,
        performed,
        remaining: allowed - performed,
    }
}

impl AuthorizationStatus {
    /// Renewal prompts are shown for these.
    pub fn needs_renewal(&self) -> bool {
        matches!(self, AuthorizationStatus::ExpiringSoon | AuthorizationStatus::Expired)
    }
}

impl LinkStatus {
    /// Whether a dispensation may be recorded in this state.
    pub fn allows_delivery(&self) -> bool {
        !matches!(self, LinkStatus::OutOfStock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_undefined_without_date_or_duration() {
        let today = date(2026, 3, 1);
        let state = authorization_status(None, Some(3), today);
        assert_eq!(state.status, AuthorizationStatus::Undefined);
        assert_eq!(state.days_remaining, None);

        let state = authorization_status(Some(today), None, today);
        assert_eq!(state.status, AuthorizationStatus::Undefined);

        let state = authorization_status(Some(today), Some(0), today);
        assert_eq!(state.status, AuthorizationStatus::Undefined);
    }

    #[test]
    fn test_active_from_today() {
        let today = date(2026, 1, 10);
        let state = authorization_status(Some(today), Some(3), today);
        assert_eq!(state.status, AuthorizationStatus::Active);
        assert_eq!(state.days_remaining, Some(90));
    }

    #[test]
    fn test_expired_after_four_months() {
        let today = date(2026, 5, 10);
        let state = authorization_status(Some(date(2026, 1, 10)), Some(3), today);
        assert_eq!(state.status, AuthorizationStatus::Expired);
        assert!(state.days_remaining.unwrap() < 0);
    }

    #[test]
    fn test_expiring_soon_boundaries() {
        let start = date(2026, 1, 10);
        // expiration 2026-04-10
        let at = |today| authorization_status(Some(start), Some(3), today);

        assert_eq!(at(date(2026, 3, 25)).status, AuthorizationStatus::Active);
        assert_eq!(at(date(2026, 3, 25)).days_remaining, Some(16));
        assert_eq!(at(date(2026, 3, 26)).days_remaining, Some(15));
        assert_eq!(at(date(2026, 3, 26)).status, AuthorizationStatus::ExpiringSoon);
        assert_eq!(at(date(2026, 4, 10)).status, AuthorizationStatus::ExpiringSoon);
        assert_eq!(at(date(2026, 4, 10)).days_remaining, Some(0));
        assert_eq!(at(date(2026, 4, 11)).status, AuthorizationStatus::Expired);
        assert_eq!(at(date(2026, 4, 11)).days_remaining, Some(-1));
    }

    #[test]
    fn test_calendar_month_arithmetic() {
        assert_eq!(expiration_date(date(2026, 1, 31), 3), Some(date(2026, 4, 30)));
        assert_eq!(expiration_date(date(2025, 11, 30), 3), Some(date(2026, 2, 28)));
        assert_eq!(expiration_date(date(2026, 1, 15), 6), Some(date(2026, 7, 15)));
    }

    #[test]
    fn test_allowance_six_months() {
        assert_eq!(
            dispensation_allowance(6, 2),
            DispensationAllowance { allowed: 6, performed: 2, remaining: 4 }
        );
    }

    #[test]
    fn test_allowance_three_months_exhausted() {
        assert_eq!(
            dispensation_allowance(3, 3),
            DispensationAllowance { allowed: 3, performed: 3, remaining: 0 }
        );
    }

    #[test]
    fn test_allowance_defaults_and_clamps() {
        assert_eq!(dispensation_allowance(12, 1).allowed, 3);
        assert_eq!(dispensation_allowance(0, 0).allowed, 3);
        assert_eq!(dispensation_allowance(3, -2).performed, 0);
        assert_eq!(dispensation_allowance(3, 5).remaining, -2);
    }

    #[test]
    fn test_needs_renewal() {
        assert!(AuthorizationStatus::Expired.needs_renewal());
        assert!(AuthorizationStatus::ExpiringSoon.needs_renewal());
        assert!(!AuthorizationStatus::Active.needs_renewal());
        assert!(!AuthorizationStatus::Undefined.needs_renewal());
    }

    proptest::proptest! {
        #[test]
        fn allowance_is_consistent(duration in 0u32..24, performed in -10i64..20) {
            let a = dispensation_allowance(duration, performed);
            proptest::prop_assert_eq!(a.allowed - a.performed, a.remaining);
            proptest::prop_assert!(a.performed >= 0);
            proptest::prop_assert!(a.allowed == 3 || (a.allowed == 6 && duration == 6));
        }
    }
}

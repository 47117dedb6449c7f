//! Shelf-life flags for high-cost medication lots.

use chrono::{Days, NaiveDate};

use crate::models::{LotExpiry, StockLot};

/// Lots expiring within this many days are flagged.
pub const LOT_WARNING_DAYS: u64 = 30;

/// Expired before `today`, expiring within the warning window, or valid.
pub fn lot_expiry(expiry_date: NaiveDate, today: NaiveDate) -> LotExpiry {
    let warning_edge = today.checked_add_days(Days::new(LOT_WARNING_DAYS)).unwrap_or(NaiveDate::MAX);
    if expiry_date < today {
        LotExpiry::Expired
    } else if expiry_date < warning_edge {
        LotExpiry::ExpiringSoon
    } else {
        LotExpiry::Valid
    }
}

impl StockLot {
    pub fn expiry(&self, today: NaiveDate) -> LotExpiry {
        lot_expiry(self.expiry_date, today)
    }
}

/// Units in lots that have not expired yet.
pub fn usable_quantity(lots: &[StockLot], today: NaiveDate) -> u64 {
    lots.iter()
        .filter(|lot| lot.expiry(today) != LotExpiry::Expired)
        .map(|lot| u64::from(lot.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_lot_expiry_flags() {
        let today = date(2026, 10, 17);
        assert_eq!(lot_expiry(date(2026, 10, 16), today), LotExpiry::Expired);
        assert_eq!(lot_expiry(today, today), LotExpiry::ExpiringSoon);
        assert_eq!(lot_expiry(date(2026, 11, 15), today), LotExpiry::ExpiringSoon);
        assert_eq!(lot_expiry(date(2026, 11, 16), today), LotExpiry::Valid);
    }

    #[test]
    fn test_usable_quantity_skips_expired() {
        let today = date(2026, 10, 17);
        let lots = vec![
            StockLot::new("m1".into(), "A1", date(2026, 1, 1), 10),
            StockLot::new("m1".into(), "B2", date(2026, 10, 20), 5),
            StockLot::new("m1".into(), "C3", date(2027, 6, 1), 20),
        ];
        assert_eq!(usable_quantity(&lots, today), 25);
    }
}

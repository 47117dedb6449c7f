//! High-cost medication and lot operations.

use rusqlite::{params, OptionalExtension};

use super::{format_date, parse_date, Database, DbError, DbResult};
use crate::models::{HighCostMedication, StockLot};

impl Database {
    /// Insert or update a high-cost medication.
    pub fn upsert_medication(&self, medication: &HighCostMedication) -> DbResult<()> {
        if medication.name.trim().is_empty() {
            return Err(DbError::Constraint("medication name must not be blank".into()));
        }
        self.conn
            .execute(
                r#"
                INSERT INTO high_cost_medications (id, name, description)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description
                "#,
                params![medication.id, medication.name.trim(), medication.description],
            )
            .map_err(|e| DbError::from_write(e, "medication"))?;
        Ok(())
    }

    pub fn get_medication(&self, id: &str) -> DbResult<Option<HighCostMedication>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, description FROM high_cost_medications WHERE id = ?",
                [id],
                medication_from_row,
            )
            .optional()?)
    }

    /// All medications ordered by name.
    pub fn list_medications(&self) -> DbResult<Vec<HighCostMedication>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM high_cost_medications ORDER BY name")?;
        let medications = stmt
            .query_map([], medication_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(medications)
    }

    /// Delete a medication with its lots and patient links.
    pub fn delete_medication(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM high_cost_medications WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Register a received lot.
    pub fn insert_lot(&self, lot: &StockLot) -> DbResult<()> {
        if lot.lot_number.trim().is_empty() {
            return Err(DbError::Constraint("lot number must not be blank".into()));
        }
        self.conn
            .execute(
                r#"
                INSERT INTO medication_lots (id, medication_id, lot_number, expiry_date, quantity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    lot.id,
                    lot.medication_id,
                    lot.lot_number,
                    format_date(lot.expiry_date),
                    lot.quantity,
                ],
            )
            .map_err(|e| DbError::from_write(e, "lot"))?;
        Ok(())
    }

    /// Lots of a medication, soonest expiry first.
    pub fn list_lots(&self, medication_id: &str) -> DbResult<Vec<StockLot>> {
        self.query_lots(
            r#"
            SELECT id, medication_id, lot_number, expiry_date, quantity
            FROM medication_lots
            WHERE medication_id = ?
            ORDER BY expiry_date, lot_number
            "#,
            medication_id,
        )
    }

    /// Lots with quantity left, soonest expiry first.
    pub fn list_lots_in_stock(&self, medication_id: &str) -> DbResult<Vec<StockLot>> {
        self.query_lots(
            r#"
            SELECT id, medication_id, lot_number, expiry_date, quantity
            FROM medication_lots
            WHERE medication_id = ? AND quantity > 0
            ORDER BY expiry_date, lot_number
            "#,
            medication_id,
        )
    }

    fn query_lots(&self, sql: &str, medication_id: &str) -> DbResult<Vec<StockLot>> {
        let mut stmt = self.conn.prepare(sql)?;

        let rows = stmt.query_map([medication_id], |row| {
            Ok(LotRow {
                id: row.get(0)?,
                medication_id: row.get(1)?,
                lot_number: row.get(2)?,
                expiry_date: row.get(3)?,
                quantity: row.get(4)?,
            })
        })?;

        let mut lots = Vec::new();
        for row in rows {
            lots.push(row?.try_into()?);
        }
        Ok(lots)
    }

    pub fn delete_lot(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM medication_lots WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn medication_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HighCostMedication> {
    Ok(HighCostMedication {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

/// Intermediate row struct for database mapping.
struct LotRow {
    id: String,
    medication_id: String,
    lot_number: String,
    expiry_date: String,
    quantity: u32,
}

impl TryFrom<LotRow> for StockLot {
    type Error = DbError;

    fn try_from(row: LotRow) -> Result<Self, Self::Error> {
        Ok(StockLot {
            id: row.id,
            medication_id: row.medication_id,
            lot_number: row.lot_number,
            expiry_date: parse_date(&row.expiry_date)?,
            quantity: row.quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_medication_crud() {
        let db = Database::open_in_memory().unwrap();
        let mut med = HighCostMedication::new("Adalimumabe 40mg".into(), None);
        db.upsert_medication(&med).unwrap();

        med.description = Some("Seringa preenchida".into());
        db.upsert_medication(&med).unwrap();
        assert_eq!(db.get_medication(&med.id).unwrap().unwrap(), med);
        assert_eq!(db.list_medications().unwrap().len(), 1);

        assert!(db.delete_medication(&med.id).unwrap());
        assert!(db.get_medication(&med.id).unwrap().is_none());
    }

    #[test]
    fn test_lots_sorted_by_expiry() {
        let db = Database::open_in_memory().unwrap();
        let med = HighCostMedication::new("Etanercepte".into(), None);
        db.upsert_medication(&med).unwrap();

        db.insert_lot(&StockLot::new(med.id.clone(), "B2", date(2027, 5, 1), 10)).unwrap();
        db.insert_lot(&StockLot::new(med.id.clone(), "A1", date(2026, 12, 1), 4)).unwrap();

        let lots = db.list_lots(&med.id).unwrap();
        assert_eq!(lots.len(), 2);
        assert_eq!(lots[0].lot_number, "A1");
        assert_eq!(lots[0].expiry_date, date(2026, 12, 1));
        assert_eq!(lots[1].quantity, 10);
    }

    #[test]
    fn test_lots_in_stock_skip_empty() {
        let db = Database::open_in_memory().unwrap();
        let med = HighCostMedication::new("Etanercepte".into(), None);
        db.upsert_medication(&med).unwrap();

        db.insert_lot(&StockLot::new(med.id.clone(), "C3", date(2027, 8, 1), 2)).unwrap();
        db.insert_lot(&StockLot::new(med.id.clone(), "A1", date(2026, 11, 1), 0)).unwrap();
        db.insert_lot(&StockLot::new(med.id.clone(), "B2", date(2027, 2, 1), 5)).unwrap();

        let lots: Vec<String> = db
            .list_lots_in_stock(&med.id)
            .unwrap()
            .into_iter()
            .map(|l| l.lot_number)
            .collect();
        assert_eq!(lots, vec!["B2", "C3"]);
        assert_eq!(db.list_lots(&med.id).unwrap().len(), 3);
    }

    #[test]
    fn test_lot_requires_medication() {
        let db = Database::open_in_memory().unwrap();
        let result = db.insert_lot(&StockLot::new("missing".into(), "A1", date(2027, 1, 1), 1));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_deleting_medication_removes_lots() {
        let db = Database::open_in_memory().unwrap();
        let med = HighCostMedication::new("Etanercepte".into(), None);
        db.upsert_medication(&med).unwrap();
        db.insert_lot(&StockLot::new(med.id.clone(), "A1", date(2027, 1, 1), 1)).unwrap();

        db.delete_medication(&med.id).unwrap();
        assert!(db.list_lots(&med.id).unwrap().is_empty());
    }
}

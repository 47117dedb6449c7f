//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::Patient;
use crate::resolver::normalize;

impl Database {
    /// Insert a new patient. Name and card number are mandatory; card numbers are unique.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        if !patient.is_valid() {
            return Err(DbError::Constraint("patient name and SUS card are required".into()));
        }
        self.conn
            .execute(
                r#"
                INSERT INTO patients (id, full_name, sus_card, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    patient.id,
                    patient.full_name.trim(),
                    patient.sus_card.trim(),
                    patient.created_at,
                ],
            )
            .map_err(|e| DbError::from_write(e, "patient"))?;
        Ok(())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, full_name, sus_card, created_at
                FROM patients
                WHERE id = ?
                "#,
                [id],
                patient_from_row,
            )
            .optional()?)
    }

    /// Exact lookup by SUS card. Surrounding whitespace is ignored; a blank card finds nobody.
    pub fn find_patient_by_sus_card(&self, sus_card: &str) -> DbResult<Option<Patient>> {
        let sus_card = sus_card.trim();
        if sus_card.is_empty() {
            return Ok(None);
        }
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, full_name, sus_card, created_at
                FROM patients
                WHERE sus_card = ?
                "#,
                [sus_card],
                patient_from_row,
            )
            .optional()?)
    }

    /// List patients ordered by name.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, full_name, sus_card, created_at
            FROM patients
            ORDER BY full_name
            "#,
        )?;

        let patients = stmt
            .query_map([], patient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(patients)
    }

    /// Match on name (accent-insensitive) or card number (ignoring formatting).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let needle = normalize(query);
        let digits: String = query.chars().filter(|c| c.is_ascii_digit()).collect();

        let patients = self
            .list_patients()?
            .into_iter()
            .filter(|p| {
                needle.is_empty()
                    || normalize(&p.full_name).contains(&needle)
                    || (!digits.is_empty() && p.sus_card_digits().contains(&digits))
            })
            .take(limit)
            .collect();
        Ok(patients)
    }

    /// Delete a patient and all of their links.
    pub fn delete_patient(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn patient_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        full_name: row.get(1)?,
        sus_card: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get_patient() {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Maria da Silva".into(), "898 0010 2345 6789".into());
        db.insert_patient(&patient).unwrap();

        let loaded = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(loaded, patient);
        assert!(db.get_patient("missing").unwrap().is_none());
    }

    #[test]
    fn test_invalid_patient_rejected() {
        let db = Database::open_in_memory().unwrap();
        let result = db.insert_patient(&Patient::new("".into(), "123".into()));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_duplicate_card_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_patient(&Patient::new("Ana".into(), "123".into())).unwrap();
        let result = db.insert_patient(&Patient::new("Outra Ana".into(), "123".into()));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_find_patient_by_sus_card() {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Maria Souza".into(), "898 0010 2345 6789".into());
        db.insert_patient(&patient).unwrap();
        db.insert_patient(&Patient::new("Mário Souza".into(), "898 0010 2345 6780".into())).unwrap();

        let found = db.find_patient_by_sus_card("  898 0010 2345 6789 ").unwrap().unwrap();
        assert_eq!(found.id, patient.id);

        // No partial matches
        assert!(db.find_patient_by_sus_card("898 0010").unwrap().is_none());
        assert!(db.find_patient_by_sus_card("   ").unwrap().is_none());
    }

    #[test]
    fn test_search_patients() {
        let db = Database::open_in_memory().unwrap();
        db.insert_patient(&Patient::new("José Antônio".into(), "111 2222".into())).unwrap();
        db.insert_patient(&Patient::new("Maria Souza".into(), "333 4444".into())).unwrap();

        let by_name = db.search_patients("jose antonio", 10).unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].full_name, "José Antônio");

        let by_card = db.search_patients("3334", 10).unwrap();
        assert_eq!(by_card.len(), 1);
        assert_eq!(by_card[0].full_name, "Maria Souza");

        assert_eq!(db.search_patients("", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_patient() {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Ana".into(), "123".into());
        db.insert_patient(&patient).unwrap();
        assert!(db.delete_patient(&patient.id).unwrap());
        assert!(!db.delete_patient(&patient.id).unwrap());
    }
}

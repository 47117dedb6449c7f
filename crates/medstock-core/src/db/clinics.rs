//! Clinic directory operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{search_clinics, Clinic, ClinicStatus};

impl Database {
    /// Insert or update a clinic.
    pub fn upsert_clinic(&self, clinic: &Clinic) -> DbResult<()> {
        if clinic.name.trim().is_empty() {
            return Err(DbError::Constraint("clinic name must not be blank".into()));
        }
        self.conn
            .execute(
                r#"
                INSERT INTO clinics (id, name, locality, opening_hours, contact, status)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    locality = excluded.locality,
                    opening_hours = excluded.opening_hours,
                    contact = excluded.contact,
                    status = excluded.status
                "#,
                params![
                    clinic.id,
                    clinic.name,
                    clinic.locality,
                    clinic.opening_hours,
                    clinic.contact,
                    clinic.status.as_str(),
                ],
            )
            .map_err(|e| DbError::from_write(e, "clinic"))?;
        Ok(())
    }

    /// Get a clinic by ID.
    pub fn get_clinic(&self, id: &str) -> DbResult<Option<Clinic>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, name, locality, opening_hours, contact, status
                FROM clinics
                WHERE id = ?
                "#,
                [id],
                ClinicRow::from_row,
            )
            .optional()?;

        row.map(Clinic::try_from).transpose()
    }

    /// All clinics, open ones first, then by name.
    pub fn list_clinics(&self) -> DbResult<Vec<Clinic>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, locality, opening_hours, contact, status
            FROM clinics
            ORDER BY status = 'closed', name
            "#,
        )?;

        let rows = stmt.query_map([], ClinicRow::from_row)?;

        let mut clinics = Vec::new();
        for row in rows {
            clinics.push(row?.try_into()?);
        }
        Ok(clinics)
    }

    /// Clinics shown to citizens, by name.
    pub fn list_open_clinics(&self) -> DbResult<Vec<Clinic>> {
        Ok(self
            .list_clinics()?
            .into_iter()
            .filter(|c| c.status == ClinicStatus::Open)
            .collect())
    }

    /// Accent-insensitive search on name and locality.
    pub fn search_clinics(&self, query: &str) -> DbResult<Vec<Clinic>> {
        let clinics = self.list_clinics()?;
        Ok(search_clinics(&clinics, query).into_iter().cloned().collect())
    }

    /// Open or close a clinic. Returns false if it does not exist.
    pub fn set_clinic_status(&self, id: &str, status: ClinicStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE clinics SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a clinic together with its catalog and uploads.
    pub fn delete_clinic(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM clinics WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ClinicRow {
    id: String,
    name: String,
    locality: String,
    opening_hours: String,
    contact: Option<String>,
    status: String,
}

impl ClinicRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            locality: row.get(2)?,
            opening_hours: row.get(3)?,
            contact: row.get(4)?,
            status: row.get(5)?,
        })
    }
}

impl TryFrom<ClinicRow> for Clinic {
    type Error = DbError;

    fn try_from(row: ClinicRow) -> Result<Self, Self::Error> {
        let status = ClinicStatus::parse(&row.status)
            .ok_or_else(|| DbError::Corrupt(format!("clinic status {:?}", row.status)))?;
        Ok(Clinic {
            id: row.id,
            name: row.name,
            locality: row.locality,
            opening_hours: row.opening_hours,
            contact: row.contact,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_and_get_clinic() {
        let db = Database::open_in_memory().unwrap();
        let mut clinic = Clinic::new("UBS Centro", "Centro");
        clinic.opening_hours = "07:00-17:00".into();
        db.upsert_clinic(&clinic).unwrap();

        let loaded = db.get_clinic(&clinic.id).unwrap().unwrap();
        assert_eq!(loaded, clinic);

        clinic.contact = Some("(11) 5555-0000".into());
        db.upsert_clinic(&clinic).unwrap();
        let loaded = db.get_clinic(&clinic.id).unwrap().unwrap();
        assert_eq!(loaded.contact.as_deref(), Some("(11) 5555-0000"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let db = Database::open_in_memory().unwrap();
        let result = db.upsert_clinic(&Clinic::new("  ", "Centro"));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_list_orders_open_first() {
        let db = Database::open_in_memory().unwrap();
        let closed = Clinic::new("A Fechada", "Norte");
        let open = Clinic::new("B Aberta", "Sul");
        db.upsert_clinic(&closed).unwrap();
        db.upsert_clinic(&open).unwrap();
        assert!(db.set_clinic_status(&closed.id, ClinicStatus::Closed).unwrap());

        let names: Vec<String> = db.list_clinics().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["B Aberta", "A Fechada"]);

        let open = db.list_open_clinics().unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].name, "B Aberta");
    }

    #[test]
    fn test_search_clinics_accent_insensitive() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_clinic(&Clinic::new("UBS São João", "Jardim América")).unwrap();
        db.upsert_clinic(&Clinic::new("UBS Centro", "Centro")).unwrap();

        let found = db.search_clinics("sao joao").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "UBS São João");

        assert_eq!(db.search_clinics("america").unwrap().len(), 1);
        assert_eq!(db.search_clinics("").unwrap().len(), 2);
    }

    #[test]
    fn test_delete_missing_clinic() {
        let db = Database::open_in_memory().unwrap();
        assert!(!db.delete_clinic("nope").unwrap());
        assert!(!db.set_clinic_status("nope", ClinicStatus::Closed).unwrap());
    }
}

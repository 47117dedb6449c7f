//! Per-clinic medication catalog operations.
//!
//! Entries keep their insertion order; the resolver's first-match rules depend on it.

use rusqlite::params;
use tracing::info;

use super::{Database, DbError, DbResult};
use crate::models::MedicationCatalogEntry;

impl Database {
    /// Insert or update a catalog entry. Updating keeps the entry's original position.
    pub fn upsert_catalog_entry(&self, clinic_id: &str, entry: &MedicationCatalogEntry) -> DbResult<()> {
        if !entry.is_matchable() {
            return Err(DbError::Constraint("catalog entry name must not be blank".into()));
        }
        let aliases_json = serde_json::to_string(&entry.brand_aliases)?;

        self.conn
            .execute(
                r#"
                INSERT INTO catalog_entries (clinic_id, name, brand_aliases, updated_at)
                VALUES (?1, ?2, ?3, datetime('now'))
                ON CONFLICT(clinic_id, name) DO UPDATE SET
                    brand_aliases = excluded.brand_aliases,
                    updated_at = datetime('now')
                "#,
                params![clinic_id, entry.name, aliases_json],
            )
            .map_err(|e| DbError::from_write(e, "catalog entry"))?;
        Ok(())
    }

    /// Replace a clinic's whole catalog atomically.
    ///
    /// A repeated name keeps its first occurrence, so the stored catalog resolves
    /// queries exactly as the given slice does. Returns the number of rows stored.
    pub fn replace_catalog(&mut self, clinic_id: &str, entries: &[MedicationCatalogEntry]) -> DbResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM catalog_entries WHERE clinic_id = ?", [clinic_id])?;

        let mut stored = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO catalog_entries (clinic_id, name, brand_aliases)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(clinic_id, name) DO NOTHING
                "#,
            )?;
            for entry in entries.iter().filter(|e| e.is_matchable()) {
                let aliases_json = serde_json::to_string(&entry.brand_aliases)?;
                stored += stmt
                    .execute(params![clinic_id, entry.name, aliases_json])
                    .map_err(|e| DbError::from_write(e, "catalog entry"))?;
            }
        }
        tx.commit()?;

        info!(clinic_id, stored, "catalog replaced");
        Ok(stored)
    }

    /// The clinic's catalog in insertion order.
    pub fn list_catalog(&self, clinic_id: &str) -> DbResult<Vec<MedicationCatalogEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name, brand_aliases
            FROM catalog_entries
            WHERE clinic_id = ?
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([clinic_id], |row| {
            Ok(CatalogEntryRow {
                name: row.get(0)?,
                brand_aliases: row.get(1)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }

    /// Remove one entry. Returns false if it was not in the catalog.
    pub fn delete_catalog_entry(&self, clinic_id: &str, name: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM catalog_entries WHERE clinic_id = ?1 AND name = ?2",
            params![clinic_id, name],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct CatalogEntryRow {
    name: String,
    brand_aliases: String,
}

impl TryFrom<CatalogEntryRow> for MedicationCatalogEntry {
    type Error = DbError;

    fn try_from(row: CatalogEntryRow) -> Result<Self, Self::Error> {
        Ok(MedicationCatalogEntry {
            name: row.name,
            brand_aliases: serde_json::from_str(&row.brand_aliases)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Clinic;
    use crate::resolver::resolve;

    fn setup() -> (Database, String) {
        let db = Database::open_in_memory().unwrap();
        let clinic = Clinic::new("UBS Centro", "Centro");
        db.upsert_clinic(&clinic).unwrap();
        (db, clinic.id)
    }

    #[test]
    fn test_upsert_preserves_order() {
        let (db, clinic_id) = setup();
        db.upsert_catalog_entry(&clinic_id, &MedicationCatalogEntry::new("paracetamol")).unwrap();
        db.upsert_catalog_entry(&clinic_id, &MedicationCatalogEntry::new("dipirona")).unwrap();
        db.upsert_catalog_entry(
            &clinic_id,
            &MedicationCatalogEntry::new("paracetamol").with_aliases(["tylenol"]),
        )
        .unwrap();

        let catalog = db.list_catalog(&clinic_id).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].name, "paracetamol");
        assert_eq!(catalog[0].brand_aliases, vec!["tylenol"]);
        assert_eq!(catalog[1].name, "dipirona");
    }

    #[test]
    fn test_blank_entry_rejected() {
        let (db, clinic_id) = setup();
        let result = db.upsert_catalog_entry(&clinic_id, &MedicationCatalogEntry::new(" "));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_unknown_clinic_rejected() {
        let (db, _) = setup();
        let result = db.upsert_catalog_entry("missing", &MedicationCatalogEntry::new("dipirona"));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_replace_catalog() {
        let (mut db, clinic_id) = setup();
        db.upsert_catalog_entry(&clinic_id, &MedicationCatalogEntry::new("old")).unwrap();

        let stored = db
            .replace_catalog(
                &clinic_id,
                &[
                    MedicationCatalogEntry::new("losartana"),
                    MedicationCatalogEntry::new(""),
                    MedicationCatalogEntry::new("insulina").with_aliases(["humulin"]),
                ],
            )
            .unwrap();
        assert_eq!(stored, 2);

        let names: Vec<String> = db.list_catalog(&clinic_id).unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["losartana", "insulina"]);
    }

    #[test]
    fn test_replace_catalog_keeps_first_duplicate() {
        let (mut db, clinic_id) = setup();
        let entries = [
            MedicationCatalogEntry::new("Paracetamol").with_aliases(["Tylenol"]),
            MedicationCatalogEntry::new("Dipirona"),
            MedicationCatalogEntry::new("Paracetamol").with_aliases(["Dôrico"]),
        ];

        let stored = db.replace_catalog(&clinic_id, &entries).unwrap();
        assert_eq!(stored, 2);

        let loaded = db.list_catalog(&clinic_id).unwrap();
        assert_eq!(loaded[0].name, "Paracetamol");
        assert_eq!(loaded[0].brand_aliases, vec!["Tylenol"]);
        assert_eq!(loaded[1].name, "Dipirona");

        for query in ["Tylenol", "tylenl", "Dipir", "Paracetamol"] {
            assert_eq!(resolve(&loaded, query), resolve(&entries, query), "query {query:?}");
        }
        assert_eq!(resolve(&loaded, "Tylenol"), "paracetamol");
    }

    #[test]
    fn test_delete_catalog_entry() {
        let (db, clinic_id) = setup();
        db.upsert_catalog_entry(&clinic_id, &MedicationCatalogEntry::new("dipirona")).unwrap();
        assert!(db.delete_catalog_entry(&clinic_id, "dipirona").unwrap());
        assert!(!db.delete_catalog_entry(&clinic_id, "dipirona").unwrap());
        assert!(db.list_catalog(&clinic_id).unwrap().is_empty());
    }
}

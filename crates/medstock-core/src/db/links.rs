//! Patient-medication links and the dispensation log.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use tracing::info;

use super::{format_date, parse_date, parse_timestamp, Database, DbError, DbResult};
use crate::models::{
    ConsultedMedication, DispensationEvent, LinkStatus, LinkSummary, PatientMedicationLink, SusConsultation,
};

impl Database {
    /// Link a patient to a medication. A patient can hold each medication once.
    pub fn insert_link(&self, link: &PatientMedicationLink) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO patient_medications (
                    id, patient_id, medication_id, authorization_date,
                    duration_months, dispensations_performed, status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    link.id,
                    link.patient_id,
                    link.medication_id,
                    link.authorization_date.map(format_date),
                    link.duration_months,
                    link.dispensations_performed,
                    link.status.as_str(),
                    link.created_at,
                ],
            )
            .map_err(|e| DbError::from_write(e, "patient medication"))?;
        Ok(())
    }

    /// Get a link by ID.
    pub fn get_link(&self, id: &str) -> DbResult<Option<PatientMedicationLink>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, patient_id, medication_id, authorization_date,
                       duration_months, dispensations_performed, status, created_at
                FROM patient_medications
                WHERE id = ?
                "#,
                [id],
                LinkRow::from_row,
            )
            .optional()?;

        row.map(PatientMedicationLink::try_from).transpose()
    }

    /// A patient's links, oldest first.
    pub fn list_links_for_patient(&self, patient_id: &str) -> DbResult<Vec<PatientMedicationLink>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, medication_id, authorization_date,
                   duration_months, dispensations_performed, status, created_at
            FROM patient_medications
            WHERE patient_id = ?
            ORDER BY created_at, rowid
            "#,
        )?;

        let rows = stmt.query_map([patient_id], LinkRow::from_row)?;

        let mut links = Vec::new();
        for row in rows {
            links.push(row?.try_into()?);
        }
        Ok(links)
    }

    /// Derived status, allowance and renewal flag for one link.
    pub fn link_summary(&self, id: &str, today: NaiveDate) -> DbResult<LinkSummary> {
        let link = self
            .get_link(id)?
            .ok_or_else(|| DbError::NotFound(format!("patient medication {id}")))?;
        Ok(link.summary(today))
    }

    /// Set the authorization date and duration entered by staff.
    pub fn set_authorization(
        &self,
        id: &str,
        authorization_date: Option<NaiveDate>,
        duration_months: u32,
    ) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_medications
            SET authorization_date = ?2, duration_months = ?3, updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![id, authorization_date.map(format_date), duration_months],
        )?;
        ensure_found(rows_affected, id)
    }

    pub fn set_link_status(&self, id: &str, status: LinkStatus) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE patient_medications SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        ensure_found(rows_affected, id)
    }

    /// Flip available ↔ awaiting in one statement; out of stock turns available.
    pub fn toggle_link_availability(&self, id: &str) -> DbResult<LinkStatus> {
        let status: Option<String> = self
            .conn
            .query_row(
                r#"
                UPDATE patient_medications
                SET status = CASE status WHEN 'available' THEN 'awaiting' ELSE 'available' END,
                    updated_at = datetime('now')
                WHERE id = ?
                RETURNING status
                "#,
                [id],
                |row| row.get(0),
            )
            .optional()?;

        let status = status.ok_or_else(|| DbError::NotFound(format!("patient medication {id}")))?;
        LinkStatus::parse(&status).ok_or_else(|| DbError::Corrupt(format!("link status {status:?}")))
    }

    /// Record one delivery.
    ///
    /// The counter increment and the event insert commit together. The increment
    /// is a single SQL read-modify-write, so concurrent deliveries on the same
    /// link are never lost.
    pub fn record_dispensation(
        &self,
        link_id: &str,
        dispensed_at: DateTime<Utc>,
        note: Option<String>,
    ) -> DbResult<DispensationEvent> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let rows_affected = tx.execute(
            r#"
            UPDATE patient_medications
            SET dispensations_performed = dispensations_performed + 1,
                status = 'awaiting',
                updated_at = datetime('now')
            WHERE id = ? AND status <> 'out_of_stock'
            "#,
            [link_id],
        )?;

        if rows_affected == 0 {
            let exists = tx
                .query_row("SELECT 1 FROM patient_medications WHERE id = ?", [link_id], |_| Ok(()))
                .optional()?
                .is_some();
            return Err(if exists {
                DbError::DeliveryDisabled(link_id.to_string())
            } else {
                DbError::NotFound(format!("patient medication {link_id}"))
            });
        }

        let event = DispensationEvent::new(link_id.to_string(), dispensed_at, note);
        tx.execute(
            "INSERT INTO dispensation_events (id, link_id, dispensed_at, note) VALUES (?1, ?2, ?3, ?4)",
            params![event.id, event.link_id, event.dispensed_at.to_rfc3339(), event.note],
        )?;
        tx.commit()?;

        info!(link_id, event_id = %event.id, "dispensation recorded");
        Ok(event)
    }

    /// Start a new authorization period today. Resets the delivery counter; status is untouched.
    pub fn renew_authorization(&self, id: &str, today: NaiveDate) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_medications
            SET authorization_date = ?2, dispensations_performed = 0, updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![id, format_date(today)],
        )?;
        ensure_found(rows_affected, id)?;

        info!(link_id = id, %today, "authorization renewed");
        Ok(())
    }

    /// Remove a link and its delivery history.
    pub fn delete_link(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM patient_medications WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Delivery history of a link, newest first.
    pub fn list_dispensations(&self, link_id: &str) -> DbResult<Vec<DispensationEvent>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, link_id, dispensed_at, note
            FROM dispensation_events
            WHERE link_id = ?
            ORDER BY dispensed_at DESC, rowid DESC
            "#,
        )?;

        let rows = stmt.query_map([link_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, link_id, dispensed_at, note) = row?;
            events.push(DispensationEvent {
                id,
                link_id,
                dispensed_at: parse_timestamp(&dispensed_at)?,
                note,
            });
        }
        Ok(events)
    }

    /// A citizen's own view: the patient holding `sus_card`, each linked medication
    /// and the lots still in stock for it. `None` when no patient holds that card.
    pub fn consult_by_sus_card(&self, sus_card: &str) -> DbResult<Option<SusConsultation>> {
        let Some(patient) = self.find_patient_by_sus_card(sus_card)? else {
            return Ok(None);
        };

        let mut medications = Vec::new();
        for link in self.list_links_for_patient(&patient.id)? {
            let medication = self
                .get_medication(&link.medication_id)?
                .ok_or_else(|| DbError::Corrupt(format!("link {} has no medication", link.id)))?;
            let lots = self.list_lots_in_stock(&medication.id)?;
            medications.push(ConsultedMedication { link, medication, lots });
        }

        Ok(Some(SusConsultation { patient, medications }))
    }
}

fn ensure_found(rows_affected: usize, id: &str) -> DbResult<()> {
    if rows_affected == 0 {
        return Err(DbError::NotFound(format!("patient medication {id}")));
    }
    Ok(())
}

/// Intermediate row struct for database mapping.
struct LinkRow {
    id: String,
    patient_id: String,
    medication_id: String,
    authorization_date: Option<String>,
    duration_months: u32,
    dispensations_performed: u32,
    status: String,
    created_at: String,
}

impl LinkRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            medication_id: row.get(2)?,
            authorization_date: row.get(3)?,
            duration_months: row.get(4)?,
            dispensations_performed: row.get(5)?,
            status: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

impl TryFrom<LinkRow> for PatientMedicationLink {
    type Error = DbError;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let status = LinkStatus::parse(&row.status)
            .ok_or_else(|| DbError::Corrupt(format!("link status {:?}", row.status)))?;
        Ok(PatientMedicationLink {
            id: row.id,
            patient_id: row.patient_id,
            medication_id: row.medication_id,
            authorization_date: row.authorization_date.as_deref().map(parse_date).transpose()?,
            duration_months: row.duration_months,
            dispensations_performed: row.dispensations_performed,
            status,
            created_at: row.created_at,
        })
    }
}

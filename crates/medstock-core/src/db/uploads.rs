//! Stock-sheet uploads, twice-daily update checks and correction requests.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use tracing::info;

use super::{format_date, parse_date, parse_timestamp, Database, DbError, DbResult};
use crate::models::{
    CorrectionRequest, CorrectionStatus, DailyUploadChecks, StockPdf, UploadPeriod, UploadReceipt,
};

impl Database {
    /// Store an upload and check off the next open period for the staff member's day.
    pub fn record_stock_pdf(&self, staff_id: &str, pdf: &StockPdf) -> DbResult<UploadReceipt> {
        let day = format_date(pdf.uploaded_at.date_naive());
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            r#"
            INSERT INTO stock_pdfs (id, clinic_id, url, sha256, size_bytes, uploaded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                pdf.id,
                pdf.clinic_id,
                pdf.url,
                pdf.sha256,
                pdf.size_bytes,
                pdf.uploaded_at.to_rfc3339(),
            ],
        )
        .map_err(|e| DbError::from_write(e, "stock pdf"))?;

        let mut checks = read_checks(&tx, staff_id, &pdf.clinic_id, &day)?;
        let period_marked = checks.next_period();
        if let Some(period) = period_marked {
            checks.mark(period);
            tx.execute(
                r#"
                INSERT INTO upload_checks (staff_id, clinic_id, day, morning, afternoon)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(staff_id, clinic_id, day) DO UPDATE SET
                    morning = excluded.morning,
                    afternoon = excluded.afternoon
                "#,
                params![staff_id, pdf.clinic_id, day, checks.morning, checks.afternoon],
            )?;
        }
        tx.commit()?;

        info!(
            clinic_id = %pdf.clinic_id,
            staff_id,
            period = period_marked.as_ref().map(UploadPeriod::as_str).unwrap_or("none"),
            "stock pdf recorded"
        );

        Ok(UploadReceipt {
            pdf: pdf.clone(),
            period_marked,
            checks,
        })
    }

    /// The clinic's most recent upload.
    pub fn latest_stock_pdf(&self, clinic_id: &str) -> DbResult<Option<StockPdf>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, clinic_id, url, sha256, size_bytes, uploaded_at
                FROM stock_pdfs
                WHERE clinic_id = ?
                ORDER BY uploaded_at DESC, rowid DESC
                LIMIT 1
                "#,
                [clinic_id],
                |row| {
                    Ok(StockPdfRow {
                        id: row.get(0)?,
                        clinic_id: row.get(1)?,
                        url: row.get(2)?,
                        sha256: row.get(3)?,
                        size_bytes: row.get(4)?,
                        uploaded_at: row.get(5)?,
                    })
                },
            )
            .optional()?;

        row.map(StockPdf::try_from).transpose()
    }

    /// Which of the day's two updates the staff member has done for the clinic.
    pub fn get_upload_checks(&self, staff_id: &str, clinic_id: &str, day: NaiveDate) -> DbResult<DailyUploadChecks> {
        read_checks(&self.conn, staff_id, clinic_id, &format_date(day))
    }

    /// File a correction request for a period's upload. Only one may be pending per period.
    pub fn request_correction(&self, request: &CorrectionRequest) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO correction_requests (
                    id, staff_id, clinic_id, day, period, reason, status, requested_at, approved_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    request.id,
                    request.staff_id,
                    request.clinic_id,
                    format_date(request.day),
                    request.period.as_str(),
                    request.reason,
                    request.status.as_str(),
                    request.requested_at.to_rfc3339(),
                    request.approved_at.map(|at| at.to_rfc3339()),
                ],
            )
            .map_err(|e| DbError::from_write(e, "correction request"))?;

        info!(
            staff_id = %request.staff_id,
            clinic_id = %request.clinic_id,
            period = request.period.as_str(),
            "correction requested"
        );
        Ok(())
    }

    /// Approve a pending request and reopen its period in the staff member's checks.
    pub fn approve_correction(&self, id: &str, approved_at: DateTime<Utc>) -> DbResult<CorrectionRequest> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let approved = tx
            .query_row(
                &format!(
                    "UPDATE correction_requests SET status = 'approved', approved_at = ?1 \
                     WHERE id = ?2 AND status = 'pending' RETURNING {CORRECTION_COLUMNS}"
                ),
                params![approved_at.to_rfc3339(), id],
                CorrectionRow::from_row,
            )
            .optional()?;

        let Some(row) = approved else {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM correction_requests WHERE id = ?)",
                [id],
                |row| row.get(0),
            )?;
            return Err(if exists {
                DbError::Constraint(format!("correction request {id} was already approved"))
            } else {
                DbError::NotFound(format!("correction request {id}"))
            });
        };
        let request = CorrectionRequest::try_from(row)?;

        let reopen = match request.period {
            UploadPeriod::Morning => {
                "UPDATE upload_checks SET morning = 0 WHERE staff_id = ?1 AND clinic_id = ?2 AND day = ?3"
            }
            UploadPeriod::Afternoon => {
                "UPDATE upload_checks SET afternoon = 0 WHERE staff_id = ?1 AND clinic_id = ?2 AND day = ?3"
            }
        };
        tx.execute(
            reopen,
            params![request.staff_id, request.clinic_id, format_date(request.day)],
        )?;
        tx.commit()?;

        info!(
            correction_id = id,
            staff_id = %request.staff_id,
            period = request.period.as_str(),
            "correction approved, period reopened"
        );
        Ok(request)
    }

    /// A staff member's approved corrections, most recently approved first.
    pub fn list_approved_corrections(&self, staff_id: &str) -> DbResult<Vec<CorrectionRequest>> {
        self.query_corrections(
            &format!(
                "SELECT {CORRECTION_COLUMNS} FROM correction_requests \
                 WHERE staff_id = ?1 AND status = 'approved' ORDER BY approved_at DESC, rowid DESC"
            ),
            staff_id,
        )
    }

    /// Requests awaiting an admin, oldest first.
    pub fn list_pending_corrections(&self) -> DbResult<Vec<CorrectionRequest>> {
        self.query_corrections(
            &format!(
                "SELECT {CORRECTION_COLUMNS} FROM correction_requests \
                 WHERE status = ?1 ORDER BY requested_at, rowid"
            ),
            CorrectionStatus::Pending.as_str(),
        )
    }

    fn query_corrections(&self, sql: &str, param: &str) -> DbResult<Vec<CorrectionRequest>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([param], CorrectionRow::from_row)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?.try_into()?);
        }
        Ok(requests)
    }
}

const CORRECTION_COLUMNS: &str =
    "id, staff_id, clinic_id, day, period, reason, status, requested_at, approved_at";

fn read_checks(
    conn: &rusqlite::Connection,
    staff_id: &str,
    clinic_id: &str,
    day: &str,
) -> DbResult<DailyUploadChecks> {
    let checks = conn
        .query_row(
            "SELECT morning, afternoon FROM upload_checks WHERE staff_id = ?1 AND clinic_id = ?2 AND day = ?3",
            params![staff_id, clinic_id, day],
            |row| {
                Ok(DailyUploadChecks {
                    morning: row.get(0)?,
                    afternoon: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(checks.unwrap_or_default())
}

/// Intermediate row struct for database mapping.
struct StockPdfRow {
    id: String,
    clinic_id: String,
    url: String,
    sha256: String,
    size_bytes: u64,
    uploaded_at: String,
}

impl TryFrom<StockPdfRow> for StockPdf {
    type Error = DbError;

    fn try_from(row: StockPdfRow) -> Result<Self, Self::Error> {
        Ok(StockPdf {
            id: row.id,
            clinic_id: row.clinic_id,
            url: row.url,
            sha256: row.sha256,
            size_bytes: row.size_bytes,
            uploaded_at: parse_timestamp(&row.uploaded_at)?,
        })
    }
}

/// Intermediate row struct for database mapping.
struct CorrectionRow {
    id: String,
    staff_id: String,
    clinic_id: String,
    day: String,
    period: String,
    reason: Option<String>,
    status: String,
    requested_at: String,
    approved_at: Option<String>,
}

impl CorrectionRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            staff_id: row.get(1)?,
            clinic_id: row.get(2)?,
            day: row.get(3)?,
            period: row.get(4)?,
            reason: row.get(5)?,
            status: row.get(6)?,
            requested_at: row.get(7)?,
            approved_at: row.get(8)?,
        })
    }
}

impl TryFrom<CorrectionRow> for CorrectionRequest {
    type Error = DbError;

    fn try_from(row: CorrectionRow) -> Result<Self, Self::Error> {
        Ok(CorrectionRequest {
            period: UploadPeriod::parse(&row.period)
                .ok_or_else(|| DbError::Corrupt(format!("upload period {:?}", row.period)))?,
            status: CorrectionStatus::parse(&row.status)
                .ok_or_else(|| DbError::Corrupt(format!("correction status {:?}", row.status)))?,
            day: parse_date(&row.day)?,
            requested_at: parse_timestamp(&row.requested_at)?,
            approved_at: row.approved_at.as_deref().map(parse_timestamp).transpose()?,
            id: row.id,
            staff_id: row.staff_id,
            clinic_id: row.clinic_id,
            reason: row.reason,
        })
    }
}

//! Stock-sheet upload rules and the twice-daily update checks.
//!
//! Staff must upload each clinic's stock PDF twice a day. Every successful
//! upload checks off the next open period (morning first, then afternoon).
//! An approved correction request reopens a period for another upload.

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{DailyUploadChecks, StockPdf, UploadPeriod};

/// Only PDFs are accepted.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Maximum accepted upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Upload validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComplianceError {
    #[error("Invalid format: expected {}, got {0}", PDF_CONTENT_TYPE)]
    InvalidFormat(String),

    #[error("File too large: {0} bytes (max {})", MAX_UPLOAD_BYTES)]
    TooLarge(u64),
}

pub type ComplianceResult<T> = Result<T, ComplianceError>;

/// Reject anything that is not a PDF of at most [`MAX_UPLOAD_BYTES`].
pub fn validate_upload(content_type: &str, size_bytes: u64) -> ComplianceResult<()> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case(PDF_CONTENT_TYPE) {
        return Err(ComplianceError::InvalidFormat(content_type.to_string()));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(ComplianceError::TooLarge(size_bytes));
    }
    Ok(())
}

/// Lowercase hex SHA-256 of the uploaded bytes.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Whether the last upload happened on `day` (UTC).
pub fn is_updated_on(last_upload: Option<DateTime<Utc>>, day: NaiveDate) -> bool {
    last_upload.is_some_and(|at| at.date_naive() == day)
}

impl StockPdf {
    /// Validate an upload and build its metadata record.
    pub fn from_upload(
        clinic_id: &str,
        url: &str,
        content_type: &str,
        bytes: &[u8],
        uploaded_at: DateTime<Utc>,
    ) -> ComplianceResult<Self> {
        let size_bytes = bytes.len() as u64;
        validate_upload(content_type, size_bytes)?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            clinic_id: clinic_id.to_string(),
            url: url.to_string(),
            sha256: content_digest(bytes),
            size_bytes,
            uploaded_at,
        })
    }
}

impl DailyUploadChecks {
    /// The period the next upload will check off.
    pub fn next_period(&self) -> Option<UploadPeriod> {
        if !self.morning {
            Some(UploadPeriod::Morning)
        } else if !self.afternoon {
            Some(UploadPeriod::Afternoon)
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.morning && self.afternoon
    }

    pub fn mark(&mut self, period: UploadPeriod) {
        match period {
            UploadPeriod::Morning => self.morning = true,
            UploadPeriod::Afternoon => self.afternoon = true,
        }
    }

    /// Reopen a period after an approved correction.
    pub fn clear(&mut self, period: UploadPeriod) {
        match period {
            UploadPeriod::Morning => self.morning = false,
            UploadPeriod::Afternoon => self.afternoon = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_upload() {
        assert!(validate_upload("application/pdf", 1024).is_ok());
        assert!(validate_upload("Application/PDF; charset=binary", MAX_UPLOAD_BYTES).is_ok());
        assert_eq!(
            validate_upload("image/png", 10),
            Err(ComplianceError::InvalidFormat("image/png".into()))
        );
        assert_eq!(
            validate_upload("application/pdf", MAX_UPLOAD_BYTES + 1),
            Err(ComplianceError::TooLarge(MAX_UPLOAD_BYTES + 1))
        );
    }

    #[test]
    fn test_content_digest() {
        assert_eq!(
            content_digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_stock_pdf_from_upload() {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();
        let pdf = StockPdf::from_upload("c1", "https://files/c1.pdf", "application/pdf", b"abc", at).unwrap();
        assert_eq!(pdf.size_bytes, 3);
        assert_eq!(pdf.sha256, content_digest(b"abc"));

        let rejected = StockPdf::from_upload("c1", "https://files/c1.png", "image/png", b"abc", at);
        assert!(matches!(rejected, Err(ComplianceError::InvalidFormat(_))));
    }

    #[test]
    fn test_next_period_progression() {
        let mut checks = DailyUploadChecks::default();
        assert_eq!(checks.next_period(), Some(UploadPeriod::Morning));

        checks.mark(UploadPeriod::Morning);
        assert_eq!(checks.next_period(), Some(UploadPeriod::Afternoon));
        assert!(!checks.is_complete());

        checks.mark(UploadPeriod::Afternoon);
        assert_eq!(checks.next_period(), None);
        assert!(checks.is_complete());
    }

    #[test]
    fn test_cleared_period_is_next() {
        let mut checks = DailyUploadChecks { morning: true, afternoon: true };
        checks.clear(UploadPeriod::Afternoon);
        assert_eq!(checks.next_period(), Some(UploadPeriod::Afternoon));

        checks.mark(UploadPeriod::Afternoon);
        checks.clear(UploadPeriod::Morning);
        assert_eq!(checks.next_period(), Some(UploadPeriod::Morning));
    }

    #[test]
    fn test_is_updated_on() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap();
        assert!(is_updated_on(Some(at), day));
        assert!(!is_updated_on(Some(at), day.pred_opt().unwrap()));
        assert!(!is_updated_on(None, day));
    }
}

//! Stock PDF uploads and the twice-daily update checks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of an uploaded stock sheet. The bytes themselves live in object storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockPdf {
    pub id: String,
    pub clinic_id: String,
    /// Public URL the extractor downloads from
    pub url: String,
    /// Lowercase hex SHA-256 of the uploaded bytes
    pub sha256: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Half of the working day an upload counts for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadPeriod {
    Morning,
    Afternoon,
}

impl UploadPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPeriod::Morning => "morning",
            UploadPeriod::Afternoon => "afternoon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "morning" => Some(UploadPeriod::Morning),
            "afternoon" => Some(UploadPeriod::Afternoon),
            _ => None,
        }
    }
}

/// Which of today's two updates a staff member has done for a clinic.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyUploadChecks {
    pub morning: bool,
    pub afternoon: bool,
}

/// Result of recording an upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadReceipt {
    pub pdf: StockPdf,
    /// The period checked off by this upload; `None` when both were already done
    pub period_marked: Option<UploadPeriod>,
    pub checks: DailyUploadChecks,
}

/// Review state of a correction request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    #[default]
    Pending,
    Approved,
}

impl CorrectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionStatus::Pending => "pending",
            CorrectionStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CorrectionStatus::Pending),
            "approved" => Some(CorrectionStatus::Approved),
            _ => None,
        }
    }
}

/// Staff request to redo one period's upload after sending the wrong sheet.
///
/// Approval reopens that period so the next upload checks it off again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrectionRequest {
    pub id: String,
    pub staff_id: String,
    pub clinic_id: String,
    pub day: NaiveDate,
    pub period: UploadPeriod,
    pub reason: Option<String>,
    pub status: CorrectionStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl CorrectionRequest {
    pub fn new(
        staff_id: &str,
        clinic_id: &str,
        day: NaiveDate,
        period: UploadPeriod,
        reason: Option<String>,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            staff_id: staff_id.to_string(),
            clinic_id: clinic_id.to_string(),
            day,
            period,
            reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            status: CorrectionStatus::Pending,
            requested_at,
            approved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_strings() {
        for period in [UploadPeriod::Morning, UploadPeriod::Afternoon] {
            assert_eq!(UploadPeriod::parse(period.as_str()), Some(period));
        }
        assert_eq!(UploadPeriod::parse("manha"), None);
    }

    #[test]
    fn test_new_correction_is_pending() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let request = CorrectionRequest::new("staff-1", "c1", day, UploadPeriod::Afternoon, Some("  ".into()), Utc::now());
        assert_eq!(request.status, CorrectionStatus::Pending);
        assert_eq!(request.reason, None);
        assert!(request.approved_at.is_none());
    }
}

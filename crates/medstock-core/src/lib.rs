//! MedStock Core Library
//!
//! Medication lookup and high-cost medication tracking for municipal health posts.
//!
//! # Architecture
//!
//! ```text
//! Citizen query ──▶ Normalizer ──▶ Resolver ──▶ search term ──▶ stock-PDF extractor
//!                                     ▲
//!                         clinic catalog (CatalogCache)
//!
//! Staff ──▶ patient ⇄ medication links ──▶ Tracker (authorization, allowance, status)
//!                                               │
//!                                       dispensation log
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence (catalogs, clinics, patients, links, uploads)
//! - [`models`]: Domain types (MedicationCatalogEntry, PatientMedicationLink, etc.)
//! - [`resolver`]: Query normalizer and medication name resolver
//! - [`tracker`]: Authorization lifecycle and lot shelf-life rules
//! - [`compliance`]: Stock-sheet upload validation and daily update checks

pub mod compliance;
pub mod db;
pub mod models;
pub mod resolver;
pub mod tracker;

// Re-export commonly used types
pub use db::{Database, DbError, DbResult};
pub use models::{
    AuthorizationState, AuthorizationStatus, Clinic, ClinicStatus, ConsultedMedication,
    CorrectionRequest, CorrectionStatus, DailyUploadChecks, DispensationAllowance,
    DispensationEvent, HighCostMedication, LinkStatus, LinkSummary, MedicationCatalogEntry,
    Patient, PatientMedicationLink, ResolutionMethod, ResolvedQuery, StockLot, StockPdf,
    SusConsultation, UploadPeriod, UploadReceipt,
};
pub use resolver::{normalize, resolve, CatalogCache, Resolver, ResolverConfig};
pub use tracker::{authorization_status, dispensation_allowance, TrackerError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::{NaiveDate, Utc};
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MedStockError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Delivery disabled: {0}")]
    DeliveryDisabled(String),

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for MedStockError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => MedStockError::NotFound(what),
            db::DbError::DeliveryDisabled(link) => MedStockError::DeliveryDisabled(link),
            db::DbError::Constraint(msg) => MedStockError::InvalidInput(msg),
            other => MedStockError::DatabaseError(other.to_string()),
        }
    }
}

impl From<compliance::ComplianceError> for MedStockError {
    fn from(e: compliance::ComplianceError) -> Self {
        MedStockError::UploadRejected(e.to_string())
    }
}

impl From<serde_json::Error> for MedStockError {
    fn from(e: serde_json::Error) -> Self {
        MedStockError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedStockError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedStockError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_iso_date(value: &str) -> Result<NaiveDate, MedStockError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| MedStockError::InvalidInput(format!("date {value:?}: {e}")))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<MedStockCore>, MedStockError> {
    let db = Database::open(&path)?;
    Ok(MedStockCore::wrap(db, Resolver::new()))
}

/// Open a database and tune the resolver with a JSON `ResolverConfig`.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    resolver_config_json: String,
) -> Result<Arc<MedStockCore>, MedStockError> {
    let config = ResolverConfig::from_json(&resolver_config_json)?;
    let db = Database::open(&path)?;
    Ok(MedStockCore::wrap(db, Resolver::with_config(config)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<MedStockCore>, MedStockError> {
    let db = Database::open_in_memory()?;
    Ok(MedStockCore::wrap(db, Resolver::new()))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
///
/// Locks are always taken in the order `db`, then `cache`.
#[derive(uniffi::Object)]
pub struct MedStockCore {
    db: Arc<Mutex<Database>>,
    cache: Mutex<CatalogCache>,
    resolver: Resolver,
}

impl MedStockCore {
    fn wrap(db: Database, resolver: Resolver) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            cache: Mutex::new(CatalogCache::new()),
            resolver,
        })
    }
}

#[uniffi::export]
impl MedStockCore {
    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Add or update a catalog entry of a clinic.
    pub fn upsert_catalog_entry(
        &self,
        clinic_id: String,
        entry: FfiCatalogEntry,
    ) -> Result<(), MedStockError> {
        let db = self.db.lock()?;
        db.upsert_catalog_entry(&clinic_id, &entry.into())?;
        self.cache.lock()?.invalidate();
        Ok(())
    }

    /// A clinic's catalog in insertion order.
    pub fn list_catalog(&self, clinic_id: String) -> Result<Vec<FfiCatalogEntry>, MedStockError> {
        let db = self.db.lock()?;
        let entries = db.list_catalog(&clinic_id)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Resolver Operations
    // =========================================================================

    /// Resolve a citizen's query against the clinic's catalog.
    pub fn resolve_query(
        &self,
        clinic_id: String,
        query: String,
    ) -> Result<FfiResolvedQuery, MedStockError> {
        if resolver::is_numeric_only(&query) {
            return Err(MedStockError::InvalidInput(
                "query must name a medicine, not a number".into(),
            ));
        }

        let db = self.db.lock()?;
        let mut cache = self.cache.lock()?;
        let catalog = cache.get_or_load(&clinic_id, |id| db.list_catalog(id))?;
        Ok(self.resolver.resolve(catalog, &query).into())
    }

    /// Whether the first result suggests the user typed a brand name.
    pub fn searched_by_brand(&self, user_input: String, first_result_name: String) -> bool {
        resolver::searched_by_brand(&user_input, &first_result_name)
    }

    // =========================================================================
    // Clinic Operations
    // =========================================================================

    /// Add or update a clinic.
    pub fn upsert_clinic(&self, clinic: FfiClinic) -> Result<(), MedStockError> {
        let db = self.db.lock()?;
        db.upsert_clinic(&clinic.try_into()?)?;
        Ok(())
    }

    /// Open clinics matching the query (all open clinics for a blank query).
    pub fn search_clinics(&self, query: String) -> Result<Vec<FfiClinic>, MedStockError> {
        let db = self.db.lock()?;
        let clinics = db.list_open_clinics()?;
        Ok(models::search_clinics(&clinics, &query)
            .into_iter()
            .cloned()
            .map(|c| c.into())
            .collect())
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a patient.
    pub fn create_patient(
        &self,
        full_name: String,
        sus_card: String,
    ) -> Result<FfiPatient, MedStockError> {
        let db = self.db.lock()?;
        let patient = Patient::new(full_name.trim().to_string(), sus_card.trim().to_string());
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    pub fn get_patient(&self, id: String) -> Result<Option<FfiPatient>, MedStockError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Search patients by name or SUS card.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, MedStockError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    pub fn delete_patient(&self, id: String) -> Result<bool, MedStockError> {
        let db = self.db.lock()?;
        Ok(db.delete_patient(&id)?)
    }

    /// Citizen lookup by exact SUS card: linked medications, their availability and
    /// in-stock lots (soonest expiry first). `None` when the card is not registered.
    pub fn consult_by_sus_card(
        &self,
        sus_card: String,
        today: String,
    ) -> Result<Option<FfiSusConsultation>, MedStockError> {
        if sus_card.trim().is_empty() {
            return Err(MedStockError::InvalidInput("SUS card number is required".into()));
        }
        let today = parse_iso_date(&today)?;
        let db = self.db.lock()?;
        let consultation = db.consult_by_sus_card(&sus_card)?;
        Ok(consultation.map(|c| FfiSusConsultation::new(c, today)))
    }

    // =========================================================================
    // Medication and Lot Operations
    // =========================================================================

    pub fn create_medication(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<FfiMedication, MedStockError> {
        let db = self.db.lock()?;
        let medication = HighCostMedication::new(name.trim().to_string(), description);
        db.upsert_medication(&medication)?;
        Ok(medication.into())
    }

    pub fn list_medications(&self) -> Result<Vec<FfiMedication>, MedStockError> {
        let db = self.db.lock()?;
        let medications = db.list_medications()?;
        Ok(medications.into_iter().map(|m| m.into()).collect())
    }

    pub fn delete_medication(&self, id: String) -> Result<bool, MedStockError> {
        let db = self.db.lock()?;
        Ok(db.delete_medication(&id)?)
    }

    /// Register a received lot. `expiry_date` is `YYYY-MM-DD`.
    pub fn add_lot(
        &self,
        medication_id: String,
        lot_number: String,
        expiry_date: String,
        quantity: u32,
        today: String,
    ) -> Result<FfiStockLot, MedStockError> {
        let expiry_date = parse_iso_date(&expiry_date)?;
        let today = parse_iso_date(&today)?;
        let db = self.db.lock()?;
        let lot = StockLot::new(medication_id, &lot_number, expiry_date, quantity);
        db.insert_lot(&lot)?;
        Ok(FfiStockLot::new(lot, today))
    }

    /// Lots of a medication with their shelf-life flag as of `today`.
    pub fn list_lots(
        &self,
        medication_id: String,
        today: String,
    ) -> Result<Vec<FfiStockLot>, MedStockError> {
        let today = parse_iso_date(&today)?;
        let db = self.db.lock()?;
        let lots = db.list_lots(&medication_id)?;
        Ok(lots.into_iter().map(|l| FfiStockLot::new(l, today)).collect())
    }

    pub fn delete_lot(&self, id: String) -> Result<bool, MedStockError> {
        let db = self.db.lock()?;
        Ok(db.delete_lot(&id)?)
    }

    // =========================================================================
    // Authorization Lifecycle Operations
    // =========================================================================

    /// Link a patient to a medication, optionally with an authorization already on file.
    pub fn link_medication(
        &self,
        patient_id: String,
        medication_id: String,
        authorization_date: Option<String>,
        duration_months: u32,
        today: String,
    ) -> Result<FfiLinkSummary, MedStockError> {
        let today = parse_iso_date(&today)?;
        let mut link = PatientMedicationLink::new(patient_id, medication_id);
        link.authorization_date = authorization_date.as_deref().map(parse_iso_date).transpose()?;
        link.duration_months = duration_months;

        let db = self.db.lock()?;
        db.insert_link(&link)?;
        Ok(FfiLinkSummary::new(&link, today))
    }

    /// A patient's links with derived status fields as of `today`.
    pub fn list_patient_links(
        &self,
        patient_id: String,
        today: String,
    ) -> Result<Vec<FfiLinkSummary>, MedStockError> {
        let today = parse_iso_date(&today)?;
        let db = self.db.lock()?;
        let links = db.list_links_for_patient(&patient_id)?;
        Ok(links.iter().map(|l| FfiLinkSummary::new(l, today)).collect())
    }

    pub fn get_link_summary(
        &self,
        link_id: String,
        today: String,
    ) -> Result<FfiLinkSummary, MedStockError> {
        let today = parse_iso_date(&today)?;
        let db = self.db.lock()?;
        let link = db
            .get_link(&link_id)?
            .ok_or_else(|| MedStockError::NotFound(format!("patient medication {link_id}")))?;
        Ok(FfiLinkSummary::new(&link, today))
    }

    /// Update the authorization date and duration on file.
    pub fn set_authorization(
        &self,
        link_id: String,
        authorization_date: Option<String>,
        duration_months: u32,
    ) -> Result<(), MedStockError> {
        let authorization_date = authorization_date.as_deref().map(parse_iso_date).transpose()?;
        let db = self.db.lock()?;
        db.set_authorization(&link_id, authorization_date, duration_months)?;
        Ok(())
    }

    pub fn mark_available(&self, link_id: String) -> Result<(), MedStockError> {
        let db = self.db.lock()?;
        db.set_link_status(&link_id, LinkStatus::Available)?;
        Ok(())
    }

    pub fn mark_out_of_stock(&self, link_id: String) -> Result<(), MedStockError> {
        let db = self.db.lock()?;
        db.set_link_status(&link_id, LinkStatus::OutOfStock)?;
        Ok(())
    }

    /// Flip the availability switch; returns the new status.
    pub fn toggle_availability(&self, link_id: String) -> Result<String, MedStockError> {
        let db = self.db.lock()?;
        let status = db.toggle_link_availability(&link_id)?;
        Ok(status.as_str().to_string())
    }

    /// Record a delivery now.
    pub fn record_dispensation(
        &self,
        link_id: String,
        note: Option<String>,
    ) -> Result<FfiDispensationEvent, MedStockError> {
        let db = self.db.lock()?;
        let event = db.record_dispensation(&link_id, Utc::now(), note)?;
        Ok(event.into())
    }

    /// Start a new authorization period on `today`.
    pub fn renew_authorization(&self, link_id: String, today: String) -> Result<(), MedStockError> {
        let today = parse_iso_date(&today)?;
        let db = self.db.lock()?;
        db.renew_authorization(&link_id, today)?;
        Ok(())
    }

    /// Remove a link and its delivery history.
    pub fn unlink(&self, link_id: String) -> Result<bool, MedStockError> {
        let db = self.db.lock()?;
        Ok(db.delete_link(&link_id)?)
    }

    pub fn list_dispensations(
        &self,
        link_id: String,
    ) -> Result<Vec<FfiDispensationEvent>, MedStockError> {
        let db = self.db.lock()?;
        let events = db.list_dispensations(&link_id)?;
        Ok(events.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Upload Compliance Operations
    // =========================================================================

    /// Validate and record a stock-sheet upload; checks off the staff member's next period.
    pub fn record_stock_pdf(
        &self,
        staff_id: String,
        clinic_id: String,
        url: String,
        content_type: String,
        bytes: Vec<u8>,
    ) -> Result<FfiUploadReceipt, MedStockError> {
        let pdf = StockPdf::from_upload(&clinic_id, &url, &content_type, &bytes, Utc::now())?;
        let db = self.db.lock()?;
        let receipt = db.record_stock_pdf(&staff_id, &pdf)?;
        Ok(receipt.into())
    }

    pub fn get_upload_checks(
        &self,
        staff_id: String,
        clinic_id: String,
        day: String,
    ) -> Result<FfiUploadChecks, MedStockError> {
        let day = parse_iso_date(&day)?;
        let db = self.db.lock()?;
        let checks = db.get_upload_checks(&staff_id, &clinic_id, day)?;
        Ok(checks.into())
    }

    /// Ask an admin to reopen `period` ("morning" or "afternoon") of `day` after a wrong upload.
    pub fn request_upload_correction(
        &self,
        staff_id: String,
        clinic_id: String,
        day: String,
        period: String,
        reason: Option<String>,
    ) -> Result<FfiCorrectionRequest, MedStockError> {
        let day = parse_iso_date(&day)?;
        let period = UploadPeriod::parse(period.trim())
            .ok_or_else(|| MedStockError::InvalidInput(format!("upload period {period:?}")))?;
        let request = CorrectionRequest::new(&staff_id, &clinic_id, day, period, reason, Utc::now());
        let db = self.db.lock()?;
        db.request_correction(&request)?;
        Ok(request.into())
    }

    /// Approve a correction; the staff member can then upload that period again.
    pub fn approve_upload_correction(&self, id: String) -> Result<FfiCorrectionRequest, MedStockError> {
        let db = self.db.lock()?;
        let request = db.approve_correction(&id, Utc::now())?;
        Ok(request.into())
    }

    pub fn list_approved_corrections(
        &self,
        staff_id: String,
    ) -> Result<Vec<FfiCorrectionRequest>, MedStockError> {
        let db = self.db.lock()?;
        let requests = db.list_approved_corrections(&staff_id)?;
        Ok(requests.into_iter().map(|r| r.into()).collect())
    }

    pub fn list_pending_corrections(&self) -> Result<Vec<FfiCorrectionRequest>, MedStockError> {
        let db = self.db.lock()?;
        let requests = db.list_pending_corrections()?;
        Ok(requests.into_iter().map(|r| r.into()).collect())
    }

    /// Whether the clinic's stock sheet was uploaded on `day`.
    pub fn is_clinic_updated_on(&self, clinic_id: String, day: String) -> Result<bool, MedStockError> {
        let day = parse_iso_date(&day)?;
        let db = self.db.lock()?;
        let latest = db.latest_stock_pdf(&clinic_id)?;
        Ok(compliance::is_updated_on(latest.map(|p| p.uploaded_at), day))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe catalog entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCatalogEntry {
    pub name: String,
    pub brand_aliases: Vec<String>,
}

impl From<MedicationCatalogEntry> for FfiCatalogEntry {
    fn from(entry: MedicationCatalogEntry) -> Self {
        Self {
            name: entry.name,
            brand_aliases: entry.brand_aliases,
        }
    }
}

impl From<FfiCatalogEntry> for MedicationCatalogEntry {
    fn from(entry: FfiCatalogEntry) -> Self {
        MedicationCatalogEntry {
            name: entry.name,
            brand_aliases: entry.brand_aliases,
        }
    }
}

/// FFI-safe resolver output.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiResolvedQuery {
    pub term: String,
    /// `brand_alias`, `prefix`, `ambiguous`, `prefix_rewrite`, `typo_correction` or `passthrough`
    pub method: String,
    pub was_rewritten: bool,
}

impl From<ResolvedQuery> for FfiResolvedQuery {
    fn from(resolved: ResolvedQuery) -> Self {
        Self {
            was_rewritten: resolved.was_rewritten(),
            method: resolved.method.kind().to_string(),
            term: resolved.term,
        }
    }
}

/// FFI-safe clinic.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinic {
    pub id: String,
    pub name: String,
    pub locality: String,
    pub opening_hours: String,
    pub contact: Option<String>,
    pub status: String,
}

impl From<Clinic> for FfiClinic {
    fn from(clinic: Clinic) -> Self {
        Self {
            id: clinic.id,
            name: clinic.name,
            locality: clinic.locality,
            opening_hours: clinic.opening_hours,
            contact: clinic.contact,
            status: clinic.status.as_str().to_string(),
        }
    }
}

impl TryFrom<FfiClinic> for Clinic {
    type Error = MedStockError;

    fn try_from(clinic: FfiClinic) -> Result<Self, Self::Error> {
        let status = ClinicStatus::parse(&clinic.status)
            .ok_or_else(|| MedStockError::InvalidInput(format!("clinic status {:?}", clinic.status)))?;
        Ok(Clinic {
            id: clinic.id,
            name: clinic.name,
            locality: clinic.locality,
            opening_hours: clinic.opening_hours,
            contact: clinic.contact,
            status,
        })
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub full_name: String,
    pub sus_card: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            full_name: patient.full_name,
            sus_card: patient.sus_card,
        }
    }
}

/// FFI-safe high-cost medication.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<HighCostMedication> for FfiMedication {
    fn from(medication: HighCostMedication) -> Self {
        Self {
            id: medication.id,
            name: medication.name,
            description: medication.description,
        }
    }
}

/// FFI-safe lot with its shelf-life flag.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockLot {
    pub id: String,
    pub medication_id: String,
    pub lot_number: String,
    pub expiry_date: String,
    pub quantity: u32,
    /// `valid`, `expiring_soon` or `expired`
    pub expiry: String,
}

impl FfiStockLot {
    fn new(lot: StockLot, today: NaiveDate) -> Self {
        let expiry = match lot.expiry(today) {
            models::LotExpiry::Valid => "valid",
            models::LotExpiry::ExpiringSoon => "expiring_soon",
            models::LotExpiry::Expired => "expired",
        };
        Self {
            expiry_date: lot.expiry_date.to_string(),
            id: lot.id,
            medication_id: lot.medication_id,
            lot_number: lot.lot_number,
            quantity: lot.quantity,
            expiry: expiry.to_string(),
        }
    }
}

/// FFI-safe link with every derived field.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLinkSummary {
    pub link_id: String,
    pub patient_id: String,
    pub medication_id: String,
    pub status: String,
    pub authorization_date: Option<String>,
    pub duration_months: u32,
    pub authorization_status: String,
    pub days_remaining: Option<i64>,
    pub dispensations_allowed: i64,
    pub dispensations_performed: i64,
    pub dispensations_remaining: i64,
    pub needs_renewal: bool,
}

impl FfiLinkSummary {
    fn new(link: &PatientMedicationLink, today: NaiveDate) -> Self {
        let summary = link.summary(today);
        Self {
            link_id: link.id.clone(),
            patient_id: link.patient_id.clone(),
            medication_id: link.medication_id.clone(),
            status: summary.status.as_str().to_string(),
            authorization_date: link.authorization_date.map(|d| d.to_string()),
            duration_months: link.duration_months,
            authorization_status: summary.authorization.status.as_str().to_string(),
            days_remaining: summary.authorization.days_remaining,
            dispensations_allowed: summary.allowance.allowed,
            dispensations_performed: summary.allowance.performed,
            dispensations_remaining: summary.allowance.remaining,
            needs_renewal: summary.needs_renewal,
        }
    }
}

/// FFI-safe delivery record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDispensationEvent {
    pub id: String,
    pub link_id: String,
    /// RFC 3339
    pub dispensed_at: String,
    pub note: Option<String>,
}

impl From<DispensationEvent> for FfiDispensationEvent {
    fn from(event: DispensationEvent) -> Self {
        Self {
            id: event.id,
            link_id: event.link_id,
            dispensed_at: event.dispensed_at.to_rfc3339(),
            note: event.note,
        }
    }
}

/// FFI-safe daily upload checks.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUploadChecks {
    pub morning: bool,
    pub afternoon: bool,
}

impl From<DailyUploadChecks> for FfiUploadChecks {
    fn from(checks: DailyUploadChecks) -> Self {
        Self {
            morning: checks.morning,
            afternoon: checks.afternoon,
        }
    }
}

/// FFI-safe upload receipt.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUploadReceipt {
    pub pdf_id: String,
    pub sha256: String,
    pub size_bytes: u64,
    pub period_marked: Option<String>,
    pub checks: FfiUploadChecks,
}

impl From<UploadReceipt> for FfiUploadReceipt {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            pdf_id: receipt.pdf.id,
            sha256: receipt.pdf.sha256,
            size_bytes: receipt.pdf.size_bytes,
            period_marked: receipt.period_marked.map(|p| p.as_str().to_string()),
            checks: receipt.checks.into(),
        }
    }
}

/// FFI-safe correction request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCorrectionRequest {
    pub id: String,
    pub staff_id: String,
    pub clinic_id: String,
    pub day: String,
    pub period: String,
    pub reason: Option<String>,
    /// `pending` or `approved`
    pub status: String,
    pub requested_at: String,
    pub approved_at: Option<String>,
}

impl From<CorrectionRequest> for FfiCorrectionRequest {
    fn from(request: CorrectionRequest) -> Self {
        Self {
            id: request.id,
            staff_id: request.staff_id,
            clinic_id: request.clinic_id,
            day: request.day.to_string(),
            period: request.period.as_str().to_string(),
            reason: request.reason,
            status: request.status.as_str().to_string(),
            requested_at: request.requested_at.to_rfc3339(),
            approved_at: request.approved_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// FFI-safe linked medication in a citizen lookup.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultedMedication {
    pub link: FfiLinkSummary,
    pub medication: FfiMedication,
    pub lots: Vec<FfiStockLot>,
}

/// FFI-safe citizen lookup result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSusConsultation {
    pub patient: FfiPatient,
    pub medications: Vec<FfiConsultedMedication>,
}

impl FfiSusConsultation {
    fn new(consultation: SusConsultation, today: NaiveDate) -> Self {
        Self {
            patient: consultation.patient.into(),
            medications: consultation
                .medications
                .into_iter()
                .map(|m| FfiConsultedMedication {
                    link: FfiLinkSummary::new(&m.link, today),
                    medication: m.medication.into(),
                    lots: m.lots.into_iter().map(|l| FfiStockLot::new(l, today)).collect(),
                })
                .collect(),
        }
    }
}

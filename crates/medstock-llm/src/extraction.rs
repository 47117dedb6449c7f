//! Stock-sheet extraction: request shapes, reply parsing and fallbacks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use medstock_core::resolver::fold_upper;

use crate::prompts::{build_system_prompt, make_search_prompt};

/// Extraction errors.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Extractor returned HTTP {0}")]
    Status(u16),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Placeholder for a missing name or code.
pub const NOT_AVAILABLE: &str = "N/A";

/// Chat model used unless the caller overrides it.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

pub const EXTRACTION_TEMPERATURE: f64 = 0.1;
pub const EXTRACTION_MAX_TOKENS: u32 = 8000;

/// What the portal asks for: one term in one clinic's latest stock sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub clinic_name: String,
    pub clinic_address: String,
    /// Resolved search term
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

/// Reply shown to the citizen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub found: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub may_be_out_of_stock: bool,
    pub message: String,
    pub medications: Vec<ExtractedMedication>,
}

/// One product line of the stock sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMedication {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub lots: Vec<ExtractedLot>,
    /// Kept as printed; stock sheets mix "1.200" and "1200"
    pub total_quantity: String,
}

/// One lot row. Dates and quantities stay as printed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedLot {
    pub lot_number: String,
    pub expiry_date: String,
    pub quantity: String,
}

impl ExtractionResponse {
    fn not_found(message: &str) -> Self {
        Self {
            found: false,
            may_be_out_of_stock: false,
            message: message.to_string(),
            medications: Vec::new(),
        }
    }

    /// The clinic has no stock sheet on file.
    pub fn missing_pdf() -> Self {
        Self::not_found("No stock PDF was found for this clinic. Please check that one has been uploaded.")
    }

    /// The extractor is rate limiting (HTTP 429).
    pub fn busy() -> Self {
        Self::not_found("The system is busy. Please wait a few seconds and try again.")
    }

    /// The extractor is out of credit (HTTP 402).
    pub fn unavailable() -> Self {
        Self::not_found("The system is temporarily unavailable.")
    }

    /// The extractor replied with something that is not the expected JSON.
    pub fn unreadable() -> Self {
        Self::not_found("The reply could not be processed. Please try again.")
    }

    pub fn failed() -> Self {
        Self::not_found("Something went wrong while processing your search. Please try again.")
    }

    /// Fallback for a non-success status from the extractor.
    pub fn for_status(status: u16) -> Self {
        match status {
            429 => Self::busy(),
            402 => Self::unavailable(),
            _ => Self::failed(),
        }
    }

    /// Fallback reply for an extraction error.
    pub fn for_error(err: &ExtractionError) -> Self {
        match err {
            ExtractionError::JsonParse(_) | ExtractionError::InvalidFormat(_) => Self::unreadable(),
            ExtractionError::Status(status) => Self::for_status(*status),
        }
    }

    /// The parsed reply, or the fallback matching the error.
    pub fn or_fallback(result: ExtractionResult<Self>) -> Self {
        result.unwrap_or_else(|err| {
            warn!(error = %err, "extraction failed, using fallback reply");
            Self::for_error(&err)
        })
    }

    fn found_message(count: usize) -> String {
        format!("Found {count} medication(s):")
    }
}

// =========================================================================
// Chat-completion request
// =========================================================================

/// Chat-completion body sent to the extraction model.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    File { file: FileAttachment },
    Text { text: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileAttachment {
    pub filename: String,
    /// `data:` URL with the base64 PDF
    pub file_data: String,
}

impl ChatRequest {
    /// System prompt plus one user turn holding the PDF and the search instruction.
    pub fn for_extraction(request: &ExtractionRequest, pdf_base64: &str) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: MessageContent::Text(build_system_prompt(&request.term)),
                },
                ChatMessage {
                    role: "user".into(),
                    content: MessageContent::Parts(vec![
                        ContentPart::File {
                            file: FileAttachment {
                                filename: "estoque.pdf".into(),
                                file_data: format!("data:application/pdf;base64,{pdf_base64}"),
                            },
                        },
                        ContentPart::Text {
                            text: make_search_prompt(&request.term),
                        },
                    ]),
                },
            ],
            temperature: EXTRACTION_TEMPERATURE,
            max_tokens: EXTRACTION_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Text of the first choice in a chat-completion body. Empty when absent.
pub fn reply_content(body: &str) -> ExtractionResult<String> {
    let body: Value = serde_json::from_str(body)?;
    Ok(body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

// =========================================================================
// Reply parsing
// =========================================================================

/// Parse the model's reply into a sanitized response.
///
/// Markdown fences are dropped and the outermost `{ … }` is parsed. Missing
/// names and codes become `"N/A"`, a missing total becomes `"0"`, a missing
/// lot list becomes empty and a blank unit is dropped.
pub fn parse_extraction_output(raw: &str) -> ExtractionResult<ExtractionResponse> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('{').ok_or_else(|| {
        ExtractionError::InvalidFormat("No JSON object found in response".into())
    })?;
    let end = cleaned.rfind('}').ok_or_else(|| {
        ExtractionError::InvalidFormat("No closing brace found in response".into())
    })?;
    if end < start {
        return Err(ExtractionError::InvalidFormat("Braces out of order".into()));
    }

    let value: Value = serde_json::from_str(&cleaned[start..=end])?;
    let object = value
        .as_object()
        .ok_or_else(|| ExtractionError::InvalidFormat("Top-level JSON is not an object".into()))?;

    let medications: Vec<ExtractedMedication> = object
        .get("medications")
        .and_then(Value::as_array)
        .map(|meds| meds.iter().filter(|m| m.is_object()).map(sanitize_medication).collect())
        .unwrap_or_default();

    let found = object
        .get("found")
        .and_then(Value::as_bool)
        .unwrap_or(!medications.is_empty());
    let may_be_out_of_stock = object
        .get("mayBeOutOfStock")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let message = opaque(object.get("message")).unwrap_or_else(|| {
        if found {
            ExtractionResponse::found_message(medications.len())
        } else {
            "No matching medication was found.".to_string()
        }
    });

    debug!(found, medications = medications.len(), "extraction reply parsed");

    Ok(ExtractionResponse {
        found,
        may_be_out_of_stock,
        message,
        medications,
    })
}

fn sanitize_medication(value: &Value) -> ExtractedMedication {
    let lots = value
        .get("lots")
        .and_then(Value::as_array)
        .map(|lots| lots.iter().filter(|l| l.is_object()).map(sanitize_lot).collect())
        .unwrap_or_default();

    ExtractedMedication {
        name: opaque(value.get("name")).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        code: opaque(value.get("code")).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        unit: opaque(value.get("unit")),
        lots,
        total_quantity: opaque(value.get("totalQuantity")).unwrap_or_else(|| "0".to_string()),
    }
}

fn sanitize_lot(value: &Value) -> ExtractedLot {
    ExtractedLot {
        lot_number: opaque(value.get("lotNumber")).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        expiry_date: opaque(value.get("expiryDate")).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        quantity: opaque(value.get("quantity")).unwrap_or_else(|| "0".to_string()),
    }
}

/// Strings and numbers as printed; blanks, nulls and anything else are absent.
fn opaque(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =========================================================================
// Mock extractor
// =========================================================================

/// Deterministic extractor over a plain-text stock sheet (for testing without a model).
///
/// ```text
/// Produto: BR0309040 PARACETAMOL 500 MG COMPRIMIDO
/// Unidade: COMP.
/// 31/12/2026 PTG1263A 120
/// Total: 120
/// ```
pub struct MockExtractor;

impl MockExtractor {
    pub fn extract(stock_sheet: &str, term: &str) -> ExtractionResponse {
        let needle = fold_upper(term);
        let medications: Vec<ExtractedMedication> = parse_stock_sheet(stock_sheet)
            .into_iter()
            .filter(|m| fold_upper(&m.name).contains(&needle))
            .collect();

        if medications.is_empty() {
            return ExtractionResponse {
                found: false,
                may_be_out_of_stock: true,
                message: format!("Could not find '{needle}' in this clinic's current stock."),
                medications,
            };
        }

        ExtractionResponse {
            found: true,
            may_be_out_of_stock: false,
            message: ExtractionResponse::found_message(medications.len()),
            medications,
        }
    }
}

fn parse_stock_sheet(text: &str) -> Vec<ExtractedMedication> {
    let mut medications = Vec::new();
    let mut current: Option<ExtractedMedication> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = strip_label(line, "produto:") {
            if let Some(done) = current.take() {
                medications.push(finish(done));
            }
            let (code, name) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            current = Some(ExtractedMedication {
                name: if name.trim().is_empty() { NOT_AVAILABLE.into() } else { name.trim().to_string() },
                code: code.to_string(),
                unit: None,
                lots: Vec::new(),
                total_quantity: String::new(),
            });
            continue;
        }

        let Some(med) = current.as_mut() else { continue };
        if let Some(unit) = strip_label(line, "unidade:") {
            med.unit = Some(unit.to_string()).filter(|u| !u.is_empty());
        } else if let Some(total) = strip_label(line, "total:") {
            med.total_quantity = total.to_string();
        } else if let Some(lot) = parse_lot_line(line) {
            med.lots.push(lot);
        }
    }

    if let Some(done) = current {
        medications.push(finish(done));
    }
    medications
}

/// Fill in a missing total from the lot quantities.
fn finish(mut med: ExtractedMedication) -> ExtractedMedication {
    if med.total_quantity.is_empty() {
        let sum: u64 = med.lots.iter().filter_map(|l| l.quantity.parse::<u64>().ok()).sum();
        med.total_quantity = sum.to_string();
    }
    med
}

/// Case-insensitive label match; returns the trimmed remainder.
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    head.eq_ignore_ascii_case(label)
        .then(|| line[label.len()..].trim())
}

/// `DD/MM/YYYY LOT QUANTITY`
fn parse_lot_line(line: &str) -> Option<ExtractedLot> {
    let mut parts = line.split_whitespace();
    let (date, lot, quantity) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || !looks_like_date(date) {
        return None;
    }
    Some(ExtractedLot {
        lot_number: lot.to_string(),
        expiry_date: date.to_string(),
        quantity: quantity.to_string(),
    })
}

fn looks_like_date(s: &str) -> bool {
    let parts: Vec<&str> = s.split('/').collect();
    parts.len() == 3
        && [2, 2, 4].iter().zip(&parts).all(|(len, p)| p.len() == *len && p.chars().all(|c| c.is_ascii_digit()))
}

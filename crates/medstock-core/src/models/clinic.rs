//! Health post (clinic) models and directory search.

use serde::{Deserialize, Serialize};

use crate::resolver::normalize;

/// A municipal health post whose stock sheet citizens can query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clinic {
    /// Local UUID
    pub id: String,
    /// Display name (e.g. "UBS Centro")
    pub name: String,
    /// Neighbourhood or address shown next to the name
    pub locality: String,
    /// Free-text opening hours
    pub opening_hours: String,
    /// Phone or e-mail, if published
    pub contact: Option<String>,
    /// Whether the clinic is open to the public
    pub status: ClinicStatus,
}

/// Public availability of a clinic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClinicStatus {
    Open,
    Closed,
}

impl ClinicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicStatus::Open => "open",
            ClinicStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(ClinicStatus::Open),
            "closed" => Some(ClinicStatus::Closed),
            _ => None,
        }
    }
}

impl Clinic {
    /// Create an open clinic with a fresh ID.
    pub fn new(name: impl Into<String>, locality: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            locality: locality.into(),
            opening_hours: String::new(),
            contact: None,
            status: ClinicStatus::Open,
        }
    }

    /// Case- and accent-insensitive containment on name or locality.
    pub fn matches(&self, query: &str) -> bool {
        let needle = normalize(query);
        normalize(&self.name).contains(&needle) || normalize(&self.locality).contains(&needle)
    }
}

/// Filter clinics by a free-text query. A blank query returns every clinic.
pub fn search_clinics<'a>(clinics: &'a [Clinic], query: &str) -> Vec<&'a Clinic> {
    if query.trim().is_empty() {
        return clinics.iter().collect();
    }
    clinics.iter().filter(|c| c.matches(query)).collect()
}

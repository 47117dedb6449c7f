//! Clinic medication catalog models.

use serde::{Deserialize, Serialize};

/// One active ingredient stocked by a clinic, with the brand names people use for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicationCatalogEntry {
    /// Canonical active-ingredient name (e.g. "Paracetamol")
    pub name: String,
    /// Commercial names in preference order (e.g. ["Tylenol", "Dôrico"])
    #[serde(default)]
    pub brand_aliases: Vec<String>,
}

impl MedicationCatalogEntry {
    /// Create an entry with no brand aliases.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            brand_aliases: Vec::new(),
        }
    }

    /// Builder-style helper to attach brand aliases.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brand_aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Entries with a blank name cannot be matched and are skipped by the resolver.
    pub fn is_matchable(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_aliases() {
        let entry = MedicationCatalogEntry::new("Paracetamol").with_aliases(["Tylenol", "Dôrico"]);
        assert_eq!(entry.name, "Paracetamol");
        assert_eq!(entry.brand_aliases, vec!["Tylenol", "Dôrico"]);
    }

    #[test]
    fn test_blank_name_not_matchable() {
        assert!(!MedicationCatalogEntry::new("   ").is_matchable());
        assert!(MedicationCatalogEntry::new("Dipirona").is_matchable());
    }

    #[test]
    fn test_aliases_default_when_missing() {
        let entry: MedicationCatalogEntry = serde_json::from_str(r#"{"name":"Losartana"}"#).unwrap();
        assert!(entry.brand_aliases.is_empty());
    }
}

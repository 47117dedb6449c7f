//! Patient models for the high-cost medication programme.

use serde::{Deserialize, Serialize};

/// A patient registered to receive high-cost medications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID
    pub id: String,
    /// Full legal name
    pub full_name: String,
    /// National health card (Cartão SUS) number
    pub sus_card: String,
    /// Creation timestamp
    pub created_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(full_name: String, sus_card: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_name,
            sus_card,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Both name and card number are mandatory.
    pub fn is_valid(&self) -> bool {
        !self.full_name.trim().is_empty() && !self.sus_card.trim().is_empty()
    }

    /// Card number with formatting characters removed.
    pub fn sus_card_digits(&self) -> String {
        self.sus_card.chars().filter(|c| c.is_ascii_digit()).collect()
    }
}

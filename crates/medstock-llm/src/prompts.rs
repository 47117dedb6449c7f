//! Prompts for stock-sheet extraction.
//!
//! The extractor reads a clinic's "Posição de Estoque" PDF and returns every
//! product whose name contains the resolved search term.

use medstock_core::resolver::fold_upper;

/// Placeholder replaced by the folded search term.
const TERM_PLACEHOLDER: &str = "{term}";

/// System prompt template. `{term}` is the upper-cased, accent-free search term.
pub const SYSTEM_PROMPT_TEMPLATE: &str = r#"You extract data from stock-position PDFs of Brazilian health posts and pharmacies.

TASK: Extract EVERY medication whose name contains "{term}".

HOW TO READ THE PDF:
The report is a table. Each medication starts on a line beginning with "Produto:"
followed by a code (e.g. BR0309040) and the medication name. "Unidade:" gives the
unit, each lot row has an expiry date (DD/MM/YYYY), a lot number and a quantity,
and "Total:" closes the product.

MATCHING RULES (be flexible):
1. Match when the NAME contains "{term}" anywhere
2. Ignore accents and letter case
3. Partial matches count: "PARAC" finds PARACETAMOL, "DIPIR" finds DIPIRONA
4. If nothing matches exactly, try close variations

FOR EACH MATCH EXTRACT:
- code: the code after "Produto:"
- name: the full product name
- unit: the value after "Unidade:"
- lots: every lot with lotNumber, expiryDate (DD/MM/YYYY) and quantity
- totalQuantity: the value after "Total:" or the sum of the lots

RESPONSE FORMAT (JSON only):
{
  "found": true,
  "message": "Found N medication(s):",
  "medications": [
    {
      "name": "FULL MEDICATION NAME",
      "code": "CODE",
      "unit": "UNIT",
      "lots": [{"lotNumber": "LOT", "expiryDate": "DD/MM/YYYY", "quantity": "X"}],
      "totalQuantity": "X"
    }
  ]
}

If NOTHING matches:
{
  "found": false,
  "mayBeOutOfStock": true,
  "message": "Could not find '{term}' in this clinic's current stock.",
  "medications": []
}

RETURN ONLY THE JSON, no extra text, no markdown."#;

/// System prompt for one search term.
pub fn build_system_prompt(term: &str) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace(TERM_PLACEHOLDER, &fold_upper(term))
}

/// User text sent next to the PDF.
pub fn make_search_prompt(term: &str) -> String {
    format!(
        r#"Analyse this stock PDF and find EVERY medication whose name contains "{}". Return the data as JSON."#,
        fold_upper(term)
    )
}

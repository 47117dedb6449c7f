//! Output models of the medication name resolver.

use serde::{Deserialize, Serialize};

/// Search term handed to the stock-PDF extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedQuery {
    /// Either the user's query unchanged or a substituted active-ingredient token
    pub term: String,
    /// Which rule produced the term
    pub method: ResolutionMethod,
}

/// How a query was resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// A brand alias matched; `canonical` is the entry's full name
    BrandAlias { alias: String, canonical: String },
    /// The query already prefixes exactly one catalog name
    Prefix,
    /// The query prefixes several catalog names; passed through unchanged
    Ambiguous { candidates: usize },
    /// A single-candidate prefix match rewritten to the name's first token
    PrefixRewrite,
    /// Nearest first token by edit distance within the length threshold
    TypoCorrection { matched: String, distance: usize },
    /// Nothing matched (or the query was blank)
    Passthrough,
}

impl ResolutionMethod {
    /// Same label as the serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionMethod::BrandAlias { .. } => "brand_alias",
            ResolutionMethod::Prefix => "prefix",
            ResolutionMethod::Ambiguous { .. } => "ambiguous",
            ResolutionMethod::PrefixRewrite => "prefix_rewrite",
            ResolutionMethod::TypoCorrection { .. } => "typo_correction",
            ResolutionMethod::Passthrough => "passthrough",
        }
    }
}

impl ResolvedQuery {
    pub(crate) fn passthrough(query: &str) -> Self {
        Self {
            term: query.to_string(),
            method: ResolutionMethod::Passthrough,
        }
    }

    /// Whether the resolver substituted a different term for the user's input.
    pub fn was_rewritten(&self) -> bool {
        matches!(
            self.method,
            ResolutionMethod::BrandAlias { .. }
                | ResolutionMethod::PrefixRewrite
                | ResolutionMethod::TypoCorrection { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_was_rewritten() {
        let passthrough = ResolvedQuery::passthrough("Par");
        assert!(!passthrough.was_rewritten());
        assert_eq!(passthrough.term, "Par");

        let brand = ResolvedQuery {
            term: "paracetamol".into(),
            method: ResolutionMethod::BrandAlias {
                alias: "Tylenol".into(),
                canonical: "Paracetamol".into(),
            },
        };
        assert!(brand.was_rewritten());

        let ambiguous = ResolvedQuery {
            term: "Par".into(),
            method: ResolutionMethod::Ambiguous { candidates: 2 },
        };
        assert!(!ambiguous.was_rewritten());
    }

    #[test]
    fn test_method_serializes_tagged() {
        let json = serde_json::to_string(&ResolutionMethod::TypoCorrection {
            matched: "insulina".into(),
            distance: 1,
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"typo_correction","matched":"insulina","distance":1}"#);
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        for method in [
            ResolutionMethod::Prefix,
            ResolutionMethod::PrefixRewrite,
            ResolutionMethod::Passthrough,
            ResolutionMethod::Ambiguous { candidates: 3 },
        ] {
            let value = serde_json::to_value(&method).unwrap();
            assert_eq!(value["kind"], method.kind());
        }
    }
}

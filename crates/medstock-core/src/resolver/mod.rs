//! Medication name resolver.
//!
//! Turns a free-text, possibly misspelled or brand-name query into the term most
//! likely to appear in a clinic's stock sheet, which lists active ingredients.
//!
//! Rules, first decisive one wins:
//! 1. Brand alias (exact, prefix either way, or one typo) → first token of the generic name
//! 2. Canonical-name prefix → passthrough, or passthrough when ambiguous
//! 3. Typo correction by edit distance on first name-tokens
//!
//! Anything else passes the query through untouched; "no match" is never an error.

mod cache;
mod matcher;
mod normalizer;

pub use cache::*;
pub use matcher::{match_brand_alias, nearest_first_token, prefix_candidates, AliasMatch, NearestToken};
pub use normalizer::*;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{MedicationCatalogEntry, ResolutionMethod, ResolvedQuery};

/// Tunable thresholds. `Default` reproduces the production rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Max edit distance between the query and an alias cut to the query's length
    pub brand_alias_max_distance: usize,
    /// Tokens up to this length are "short"
    pub short_token_len: usize,
    pub short_token_max_distance: usize,
    /// Tokens up to this length (and longer than short) are "medium"
    pub medium_token_len: usize,
    pub medium_token_max_distance: usize,
    pub long_token_max_distance: usize,
    /// Query tokens up to this length get a truncated correction
    pub truncate_query_len: usize,
    /// Length of a truncated correction
    pub truncated_term_len: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            brand_alias_max_distance: 1,
            short_token_len: 4,
            short_token_max_distance: 1,
            medium_token_len: 7,
            medium_token_max_distance: 2,
            long_token_max_distance: 3,
            truncate_query_len: 6,
            truncated_term_len: 4,
        }
    }
}

impl ResolverConfig {
    /// Load overrides from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Largest accepted typo distance for a query token of `len` characters.
    pub fn max_typo_distance(&self, len: usize) -> usize {
        if len <= self.short_token_len {
            self.short_token_max_distance
        } else if len <= self.medium_token_len {
            self.medium_token_max_distance
        } else {
            self.long_token_max_distance
        }
    }
}

/// Resolves user queries against a catalog snapshot. Stateless apart from its config.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `query` to the best stock-sheet search term.
    pub fn resolve(&self, catalog: &[MedicationCatalogEntry], query: &str) -> ResolvedQuery {
        let normalized = normalize(query);
        if normalized.is_empty() {
            return ResolvedQuery::passthrough(query);
        }

        let resolved = self
            .resolve_brand(catalog, &normalized)
            .or_else(|| self.resolve_prefix(catalog, query, &normalized))
            .or_else(|| self.resolve_typo(catalog, &normalized))
            .unwrap_or_else(|| ResolvedQuery::passthrough(query));

        debug!(query, term = %resolved.term, method = ?resolved.method, "query resolved");
        resolved
    }

    /// Like [`Resolver::resolve`] but returns only the term.
    pub fn resolve_term(&self, catalog: &[MedicationCatalogEntry], query: &str) -> String {
        self.resolve(catalog, query).term
    }

    fn resolve_brand(&self, catalog: &[MedicationCatalogEntry], normalized: &str) -> Option<ResolvedQuery> {
        let hit = match_brand_alias(catalog, normalized, &self.config)?;
        let token = first_token(&hit.entry.name);
        let term = if token.is_empty() {
            hit.entry.name.trim().to_string()
        } else {
            token
        };

        Some(ResolvedQuery {
            term,
            method: ResolutionMethod::BrandAlias {
                alias: hit.alias.to_string(),
                canonical: hit.entry.name.clone(),
            },
        })
    }

    fn resolve_prefix(
        &self,
        catalog: &[MedicationCatalogEntry],
        query: &str,
        normalized: &str,
    ) -> Option<ResolvedQuery> {
        let token = normalized.split(' ').next().unwrap_or_default();
        let candidates = prefix_candidates(catalog, token);

        match candidates.as_slice() {
            [] => None,
            [entry] => {
                let name_token = first_token(&entry.name);
                if name_token.starts_with(token) {
                    Some(ResolvedQuery {
                        term: query.to_string(),
                        method: ResolutionMethod::Prefix,
                    })
                } else {
                    Some(ResolvedQuery {
                        term: name_token,
                        method: ResolutionMethod::PrefixRewrite,
                    })
                }
            }
            many => Some(ResolvedQuery {
                term: query.to_string(),
                method: ResolutionMethod::Ambiguous {
                    candidates: many.len(),
                },
            }),
        }
    }

    fn resolve_typo(&self, catalog: &[MedicationCatalogEntry], normalized: &str) -> Option<ResolvedQuery> {
        let token = normalized.split(' ').next().unwrap_or_default();
        let token_len = token.chars().count();
        let nearest = nearest_first_token(catalog, token)?;

        if nearest.distance > self.config.max_typo_distance(token_len) {
            return None;
        }

        let term = if token_len <= self.config.truncate_query_len {
            truncate_chars(&nearest.token, self.config.truncated_term_len).to_string()
        } else {
            nearest.token.clone()
        };

        Some(ResolvedQuery {
            term,
            method: ResolutionMethod::TypoCorrection {
                matched: nearest.token,
                distance: nearest.distance,
            },
        })
    }
}

/// Resolve with the default thresholds, returning only the search term.
pub fn resolve(catalog: &[MedicationCatalogEntry], query: &str) -> String {
    Resolver::new().resolve_term(catalog, query)
}

/// True for a non-blank query made only of digits, which cannot name a medicine.
pub fn is_numeric_only(query: &str) -> bool {
    let trimmed = query.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Whether the user searched by a brand name: the first result's name does not
/// start with the first word the user typed.
pub fn searched_by_brand(user_input: &str, first_result_name: &str) -> bool {
    let input_token = first_token(user_input);
    if input_token.is_empty() {
        return false;
    }
    !normalize(first_result_name).starts_with(&input_token)
}

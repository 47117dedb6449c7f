//! Matching rules behind [`super::Resolver`].
//!
//! Each rule works on pre-normalized strings and reports what it found; the
//! resolver decides what term to hand downstream.

use strsim::levenshtein;

use crate::models::MedicationCatalogEntry;

use super::normalizer::{first_token, normalize, truncate_chars};
use super::ResolverConfig;

/// A brand alias hit: the entry it belongs to and the alias text as written.
pub struct AliasMatch<'c> {
    pub entry: &'c MedicationCatalogEntry,
    pub alias: &'c str,
}

/// Nearest first-name-token under edit distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NearestToken {
    pub token: String,
    pub distance: usize,
}

/// Find the first brand alias (catalog order, then alias order) matching the query.
pub fn match_brand_alias<'c>(
    catalog: &'c [MedicationCatalogEntry],
    normalized_query: &str,
    config: &ResolverConfig,
) -> Option<AliasMatch<'c>> {
    catalog
        .iter()
        .filter(|entry| entry.is_matchable())
        .find_map(|entry| {
            entry
                .brand_aliases
                .iter()
                .find(|alias| alias_matches(&normalize(alias), normalized_query, config))
                .map(|alias| AliasMatch {
                    entry,
                    alias: alias.as_str(),
                })
        })
}

/// Exact, prefix in either direction, or a near miss on the alias cut to the query's length.
fn alias_matches(alias: &str, query: &str, config: &ResolverConfig) -> bool {
    if alias.is_empty() {
        return false;
    }
    if alias == query || alias.starts_with(query) || query.starts_with(alias) {
        return true;
    }
    let query_len = query.chars().count();
    levenshtein(query, truncate_chars(alias, query_len)) <= config.brand_alias_max_distance
}

/// Entries whose normalized canonical name starts with `token`.
pub fn prefix_candidates<'c>(
    catalog: &'c [MedicationCatalogEntry],
    token: &str,
) -> Vec<&'c MedicationCatalogEntry> {
    catalog
        .iter()
        .filter(|entry| entry.is_matchable())
        .filter(|entry| normalize(&entry.name).starts_with(token))
        .collect()
}

/// Closest first name-token to `token`, comparing against the name-token cut to `token`'s length.
///
/// Ties keep the earliest entry in catalog order.
pub fn nearest_first_token(catalog: &[MedicationCatalogEntry], token: &str) -> Option<NearestToken> {
    let token_len = token.chars().count();
    let mut best: Option<NearestToken> = None;

    for entry in catalog.iter().filter(|entry| entry.is_matchable()) {
        let name_token = first_token(&entry.name);
        if name_token.is_empty() {
            continue;
        }
        let distance = levenshtein(token, truncate_chars(&name_token, token_len));
        if best.as_ref().map_or(true, |b| distance < b.distance) {
            best = Some(NearestToken {
                token: name_token,
                distance,
            });
        }
    }

    best
}

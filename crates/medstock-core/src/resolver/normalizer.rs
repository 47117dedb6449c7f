//! Query normalization shared by the resolver, clinic search and the extractor prompt.
//!
//! Folding is case-insensitive and diacritic-insensitive: text is decomposed
//! (NFD), combining marks are dropped, and whitespace runs collapse to one space.
//! "Ácido  Úrico" and "acido urico" therefore compare equal.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Lower-case, strip diacritics, collapse whitespace and trim.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    collapse_whitespace(&folded)
}

/// The normalized text up to the first space. Empty for blank input.
pub fn first_token(text: &str) -> String {
    normalize(text)
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Same folding as [`normalize`] but upper-cased, matching how stock sheets print names.
pub fn fold_upper(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_uppercase)
        .collect();
    collapse_whitespace(&folded)
}

/// First `len` characters of `s` (by Unicode scalar value, never splitting a char).
pub fn truncate_chars(s: &str, len: usize) -> &str {
    match s.char_indices().nth(len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(normalize("Paracetamol"), "paracetamol");
        assert_eq!(normalize("PARACETAMOL"), normalize("paracetamol"));
    }

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize("Ácido Úrico"), "acido urico");
        assert_eq!(normalize("á ã â à"), "a a a a");
        assert_eq!(normalize("Dipirona Sódica"), "dipirona sodica");
        assert_eq!(normalize("Cefalexina Suspensão"), "cefalexina suspensao");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("  Insulina \t  NPH\n"), "insulina nph");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_first_token() {
        assert_eq!(first_token("Dipirona Sódica 500mg"), "dipirona");
        assert_eq!(first_token("  Losartana"), "losartana");
        assert_eq!(first_token(""), "");
        assert_eq!(first_token(" \t "), "");
    }

    #[test]
    fn test_fold_upper() {
        assert_eq!(fold_upper(" ácido  ursodesoxicólico "), "ACIDO URSODESOXICOLICO");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("insulina", 4), "insu");
        assert_eq!(truncate_chars("ins", 4), "ins");
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "[a-zA-Z0-9À-ÿ \t\n]{0,40}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn normalize_has_no_edge_or_double_spaces(s in "[a-zA-ZÀ-ÿ \t]{0,40}") {
            let n = normalize(&s);
            prop_assert!(!n.starts_with(' ') && !n.ends_with(' '));
            prop_assert!(!n.contains("  "));
        }
    }
}

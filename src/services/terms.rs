use std::collections::HashSet;

/// Strips control characters, trims whitespace, and removes one layer of
/// matching wrapping quotes. Unmatched quotes are preserved verbatim.
#[must_use]
pub fn normalize_term(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();

    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }

    trimmed.to_string()
}

/// Splits comma-separated raw input into normalized terms, dropping blanks.
#[must_use]
pub fn parse_term_input(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(normalize_term)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Produces the deduplicated, optionally expanded term set that drives fetch
/// fan-out and highlighting. Order-preserving: a multi-word phrase always
/// precedes its sub-words, and uniqueness is case-insensitive.
#[must_use]
pub fn expand_search_terms(terms: &[String], should_expand: bool) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        push_unique(&mut out, &mut seen, term);

        if should_expand && term.split_whitespace().nth(1).is_some() {
            for word in term.split_whitespace() {
                push_unique(&mut out, &mut seen, word);
            }
        }
    }

    out
}

fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, term: &str) {
    if seen.insert(term.to_lowercase()) {
        out.push(term.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(terms: &[&str]) -> Vec<String> {
        terms.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_normalize_strips_matching_quotes() {
        assert_eq!(normalize_term("\"machine learning\""), "machine learning");
        assert_eq!(normalize_term("'rust'"), "rust");
    }

    #[test]
    fn test_normalize_preserves_unmatched_quote() {
        assert_eq!(normalize_term("\"unterminated"), "\"unterminated");
        assert_eq!(normalize_term("it's"), "it's");
    }

    #[test]
    fn test_normalize_strips_control_chars_and_whitespace() {
        assert_eq!(normalize_term("  rust\u{0007}\t "), "rust");
        assert_eq!(normalize_term("\""), "\"");
    }

    #[test]
    fn test_expand_keeps_phrase_before_sub_words() {
        let out = expand_search_terms(&owned(&["hello world"]), true);
        assert_eq!(out, vec!["hello world", "hello", "world"]);
    }

    #[test]
    fn test_expand_skips_already_seen_case_insensitive() {
        let out = expand_search_terms(&owned(&["Hello World", "hello", "WORLD"]), true);
        assert_eq!(out, vec!["Hello World", "Hello", "World"]);
    }

    #[test]
    fn test_no_expansion_for_single_words() {
        let out = expand_search_terms(&owned(&["rust", "Rust", "tokio"]), true);
        assert_eq!(out, vec!["rust", "tokio"]);
    }

    #[test]
    fn test_blank_terms_dropped() {
        let out = expand_search_terms(&owned(&["", "  ", "rust"]), false);
        assert_eq!(out, vec!["rust"]);
    }

    #[test]
    fn test_parse_term_input_comma_split() {
        let out = parse_term_input("react, \"machine learning\" ,,  ");
        assert_eq!(out, vec!["react", "machine learning"]);
    }
}

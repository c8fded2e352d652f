//! Utterance normalization, clause splitting and tokenization.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Function words that never carry intent.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "to", "for", "in", "on", "at", "of", "and", "or", "is", "what", "what's",
    "my", "me", "i", "you", "please", "can", "get", "set", "check", "create", "some", "about",
];

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Clause boundaries: "comma-and", "comma", word-boundary "and". Leftmost-first,
/// so ", and" is consumed whole.
static CLAUSE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),\s*and\b|,|\band\b").unwrap());

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z']+").unwrap());

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn clean_piece(piece: &str) -> &str {
    piece
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() && c != '\'')
        .trim()
}

/// Split an utterance into independently routable clauses.
///
/// Non-empty input always yields at least one clause.
pub fn split_clauses(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let clauses: Vec<String> = CLAUSE_BOUNDARY
        .split(&normalized)
        .map(clean_piece)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if clauses.is_empty() {
        vec![normalized]
    } else {
        clauses
    }
}

/// Lowercased letter/apostrophe runs, minus stop words.
pub fn tokenize(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty() && !is_stop_word(t))
        .collect()
}

/// Tokenize an identifier such as `get_weather`, `send-message` or `playMusic`.
pub fn tokenize_identifier(name: &str) -> HashSet<String> {
    let spaced = CAMEL_BOUNDARY.replace_all(name, "$1 $2");
    tokenize(&spaced.replace(['_', '-'], " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_and_and_commas() {
        assert_eq!(
            split_clauses("Find Tom and send him a message"),
            vec!["Find Tom", "send him a message"]
        );
        assert_eq!(
            split_clauses("Set a timer for 5 minutes, and play jazz, then stop."),
            vec!["Set a timer for 5 minutes", "play jazz", "then stop"]
        );
    }

    #[test]
    fn and_inside_words_does_not_split() {
        assert_eq!(
            split_clauses("What's the weather in Anderson?"),
            vec!["What's the weather in Anderson"]
        );
    }

    #[test]
    fn collapses_whitespace_and_strips_punctuation() {
        assert_eq!(
            split_clauses("  What is   the weather\tin Paris?!  "),
            vec!["What is the weather in Paris"]
        );
    }

    #[test]
    fn split_is_case_insensitive() {
        assert_eq!(split_clauses("wake me up AND play music"), vec!["wake me up", "play music"]);
    }

    #[test]
    fn empty_input_yields_no_clauses() {
        assert!(split_clauses("").is_empty());
        assert!(split_clauses("   \n ").is_empty());
    }

    #[test]
    fn separator_only_input_is_its_own_clause() {
        assert_eq!(split_clauses(", and ,"), vec![", and ,"]);
    }

    #[test]
    fn tokenize_drops_stop_words_and_digits() {
        let tokens = tokenize("Set an alarm for 10 AM");
        let expected: HashSet<String> = ["alarm", "am"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn tokenize_keeps_inner_apostrophes() {
        let tokens = tokenize("What's Tom's number");
        assert!(tokens.contains("tom's"));
        assert!(tokens.contains("number"));
        assert!(!tokens.contains("what's"));
    }

    #[test]
    fn identifiers_split_on_separators_and_case() {
        let expected: HashSet<String> = ["weather"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tokenize_identifier("get_weather"), expected);
        assert_eq!(tokenize_identifier("getWeather"), expected);

        let t = tokenize_identifier("search-contacts");
        assert!(t.contains("search") && t.contains("contacts"));
    }
}

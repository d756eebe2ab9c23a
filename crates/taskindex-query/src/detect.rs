//! Cheap classification of raw patterns.
//!
//! Used to pick between the plain prefix path and the full parser without
//! building an AST.

use crate::lexer::{Token, tokenize};

/// Returns true if the pattern contains an AND, OR or NOT keyword.
///
/// Keywords inside quoted phrases do not count. A pattern that fails to
/// tokenize falls back to a whole-word scan.
pub fn has_boolean_connectives(pattern: &str) -> bool {
    match tokenize(pattern) {
        Ok(tokens) => tokens.iter().any(Token::is_connective),
        Err(_) => pattern.split_whitespace().any(|word| {
            ["AND", "OR", "NOT"]
                .iter()
                .any(|keyword| word.eq_ignore_ascii_case(keyword))
        }),
    }
}

/// Returns true if the pattern uses any syntax beyond plain words.
///
/// That is a field qualifier (`:`), a quote, or a boolean connective.
pub fn has_query_syntax(pattern: &str) -> bool {
    pattern.contains(':') || pattern.contains('"') || has_boolean_connectives(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_have_no_syntax() {
        assert!(!has_query_syntax("editor crash"));
        assert!(!has_query_syntax("android notes"));
        assert!(!has_query_syntax(""));
    }

    #[test]
    fn qualifiers_quotes_and_keywords_are_syntax() {
        assert!(has_query_syntax("status:open"));
        assert!(has_query_syntax("\"null pointer\""));
        assert!(has_query_syntax("crash or hang"));
        assert!(has_query_syntax("NOT hang"));
    }

    #[test]
    fn keywords_inside_phrases_do_not_count() {
        assert!(!has_boolean_connectives("\"salt and pepper\""));
        assert!(has_boolean_connectives("salt and pepper"));
    }

    #[test]
    fn unlexable_pattern_uses_word_scan() {
        assert!(has_boolean_connectives("\"open or"));
        assert!(!has_boolean_connectives("\"open"));
    }
}

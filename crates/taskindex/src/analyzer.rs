//! Text analysis pipeline for the task index.
//!
//! Indexed text and query words go through the same three stages:
//! 1. `SimpleTokenizer` - splits on whitespace and punctuation
//! 2. `LowerCaser` - converts tokens to lowercase
//! 3. `RemoveLongFilter` - removes tokens longer than 40 bytes
//!
//! There is no stemming stage. Prefix matching works on surface forms: a
//! stemmed index stores `handl` for `handling`, so the prefix `handli` would miss it.

use std::iter;

use tantivy::tokenizer::{
    LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer, TokenStream,
};

/// Name of the custom tokenizer registered with Tantivy.
pub const TASK_TOKENIZER: &str = "task_text";

/// Maximum token length in bytes before filtering.
const MAX_TOKEN_LENGTH: usize = 40;

/// Builds the task text analyzer.
pub fn build_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(RemoveLongFilter::limit(MAX_TOKEN_LENGTH))
        .build()
}

/// Runs `text` through the analyzer and collects the token texts.
pub fn analyze(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
    let mut stream = analyzer.token_stream(text);
    iter::from_fn(|| stream.next().map(|t| t.text.clone())).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lowercases_and_splits_punctuation() {
        let mut analyzer = build_analyzer();
        assert_eq!(
            analyze(&mut analyzer, "NullPointer, in Editor-View!"),
            vec!["nullpointer", "in", "editor", "view"]
        );
    }

    #[test]
    fn keeps_surface_forms() {
        let mut analyzer = build_analyzer();
        assert_eq!(
            analyze(&mut analyzer, "handling running"),
            vec!["handling", "running"]
        );
    }

    #[test]
    fn removes_long_tokens() {
        let mut analyzer = build_analyzer();
        let text = format!("short {} word", "a".repeat(50));
        assert_eq!(analyze(&mut analyzer, &text), vec!["short", "word"]);
    }

    #[test]
    fn empty_and_punctuation_only_input() {
        let mut analyzer = build_analyzer();
        assert!(analyze(&mut analyzer, "").is_empty());
        assert!(analyze(&mut analyzer, " -- !! ").is_empty());
    }
}

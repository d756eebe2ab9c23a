//! Errors raised while reading a pattern.
//!
//! A pattern that fails here is still searchable: the index falls back to
//! matching its words as plain text. These errors surface in debug logs and
//! in tools that want to explain why a pattern was not understood.

use std::{error::Error, fmt};

/// Tokenizer failure at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// What went wrong.
    pub message: String,
    /// Byte offset into the pattern.
    pub position: usize,
}

impl LexError {
    /// Creates a tokenizer error at `position`.
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.position)
    }
}

impl Error for LexError {}

/// Grammar failure, located by token index when one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// Index of the offending token; `None` at end of input.
    pub token: Option<usize>,
}

impl ParseError {
    /// Creates a grammar error.
    pub fn new(message: impl Into<String>, token: Option<usize>) -> Self {
        Self {
            message: message.into(),
            token,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token {
            Some(token) => write!(f, "{} (token {token})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for ParseError {}

/// Why a pattern could not be turned into a structured query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The pattern does not follow the grammar.
    Syntax {
        /// The rejected pattern.
        pattern: String,
        /// What went wrong.
        message: String,
        /// Byte offset of the problem, when the tokenizer found it.
        column: Option<usize>,
    },
    /// A `name:` qualifier names no index field.
    UnknownField {
        /// The qualifier as written.
        name: String,
    },
}

impl QueryError {
    /// Creates an unknown-field error.
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Wraps a tokenizer error for `pattern`.
    pub fn lex(pattern: &str, err: LexError) -> Self {
        Self::Syntax {
            pattern: pattern.to_string(),
            message: err.message,
            column: Some(err.position),
        }
    }

    /// Wraps a grammar error for `pattern`.
    pub fn parse(pattern: &str, err: ParseError) -> Self {
        Self::Syntax {
            pattern: pattern.to_string(),
            message: err.message,
            column: None,
        }
    }

    /// The rejected pattern, if this error carries one.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::Syntax { pattern, .. } => Some(pattern),
            Self::UnknownField { .. } => None,
        }
    }

    /// Short description without the pattern or hint.
    pub fn message(&self) -> String {
        match self {
            Self::Syntax { message, .. } => message.clone(),
            Self::UnknownField { name } => format!("unknown field: {name}"),
        }
    }

    /// How to fix common mistakes.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Syntax { message, .. } if message.contains("unclosed quote") => {
                Some("close the phrase with a double quote")
            }
            Self::Syntax { message, .. } if message.contains("range") => {
                Some("ranges look like creation_date:[20110101 TO 20111231]")
            }
            Self::Syntax { message, .. } if message.contains("parenthesis") => {
                Some("every ( needs a matching )")
            }
            Self::UnknownField { .. } => Some("run `taskindex fields` for the field names"),
            Self::Syntax { .. } => None,
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid pattern: {}", self.message())?;
        if let Self::Syntax {
            pattern, column, ..
        } = self
        {
            write!(f, "\n  {pattern}")?;
            if let Some(column) = column {
                let width = pattern
                    .get(..(*column).min(pattern.len()))
                    .map_or(0, |head| head.chars().count());
                write!(f, "\n  {}^", " ".repeat(width))?;
            }
        }
        if let Some(hint) = self.hint() {
            write!(f, "\nhint: {hint}")?;
        }
        Ok(())
    }
}

impl Error for QueryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_points_at_lex_position() {
        let err = QueryError::lex("crash \"null", LexError::new("unclosed quote", 6));
        let shown = err.to_string();
        assert!(shown.starts_with("invalid pattern: unclosed quote"));
        assert!(shown.contains("\n  crash \"null\n        ^"));
        assert!(shown.contains("hint: close the phrase"));
    }

    #[test]
    fn caret_counts_characters() {
        let err = QueryError::lex("héllo \"x", LexError::new("unclosed quote", 7));
        assert!(err.to_string().contains("\n        ^"));
    }

    #[test]
    fn parse_errors_keep_the_pattern() {
        let err = QueryError::parse(
            "(crash",
            ParseError::new("expected closing parenthesis", None),
        );
        assert_eq!(err.pattern(), Some("(crash"));
        assert!(!err.to_string().contains('^'));
        assert_eq!(err.hint(), Some("every ( needs a matching )"));
    }

    #[test]
    fn unknown_field() {
        let err = QueryError::unknown_field("colour");
        assert_eq!(err.message(), "unknown field: colour");
        assert_eq!(err.pattern(), None);
        assert!(err.to_string().contains("taskindex fields"));
    }

    #[test]
    fn parse_error_names_token() {
        assert_eq!(
            ParseError::new("unexpected token", Some(3)).to_string(),
            "unexpected token (token 3)"
        );
        assert_eq!(ParseError::new("unexpected end", None).to_string(), "unexpected end");
    }
}

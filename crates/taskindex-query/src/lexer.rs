//! Pattern lexer (tokenizer).
//!
//! Converts a pattern string into a stream of tokens for the parser.

use std::{iter::Peekable, str::Chars};

use crate::{ast::RangeExpr, error::LexError};

/// A token in the pattern language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word (search term).
    Term(String),

    /// A quoted phrase (the quotes are stripped, content preserved).
    Phrase(String),

    /// A bracketed range such as `[a TO b]` or `{a TO b}`.
    Range(RangeExpr),

    /// The AND keyword.
    And,

    /// The OR keyword.
    Or,

    /// The NOT keyword.
    Not,

    /// Negation prefix (-).
    Minus,

    /// Left parenthesis.
    LParen,

    /// Right parenthesis.
    RParen,

    /// Field prefix (e.g., "status:" produces FieldPrefix("status")).
    FieldPrefix(String),
}

impl Token {
    /// Returns true for the AND, OR and NOT keywords.
    pub fn is_connective(&self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not)
    }
}

/// Tokenizes a pattern string.
struct Lexer<'a> {
    /// Character iterator with one-character lookahead.
    chars: Peekable<Chars<'a>>,
    /// Current byte position in input.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenizes the entire input, returning all tokens or an error.
    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Returns the next token, or None if at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        match ch {
            '"' => self.read_phrase(),
            '[' | '{' => self.read_range(),
            '(' => {
                self.advance();
                Ok(Some(Token::LParen))
            }
            ')' => {
                self.advance();
                Ok(Some(Token::RParen))
            }
            '-' => {
                self.advance();
                Ok(Some(Token::Minus))
            }
            _ => self.read_term_or_keyword(),
        }
    }

    /// Reads a quoted phrase.
    fn read_phrase(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        self.advance(); // opening quote

        let mut content = String::new();

        loop {
            match self.chars.peek() {
                Some(&'"') => {
                    self.advance();
                    return Ok(Some(Token::Phrase(content)));
                }
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => return Err(LexError::new("unclosed quote", start_pos)),
            }
        }
    }

    /// Reads a range: `[lower TO upper]`, with `{`/`}` marking exclusive ends.
    fn read_range(&mut self) -> Result<Option<Token>, LexError> {
        let start_pos = self.position;
        let lower_inclusive = self.chars.peek() == Some(&'[');
        self.advance();

        let mut content = String::new();
        let upper_inclusive = loop {
            match self.chars.peek() {
                Some(&']') => break true,
                Some(&'}') => break false,
                Some(&ch) => {
                    content.push(ch);
                    self.advance();
                }
                None => return Err(LexError::new("unclosed range", start_pos)),
            }
        };
        self.advance(); // closing bracket

        let parts: Vec<&str> = content.split_whitespace().collect();
        let [lower, to, upper] = parts.as_slice() else {
            return Err(LexError::new("expected range of the form [lower TO upper]", start_pos));
        };
        if !to.eq_ignore_ascii_case("TO") {
            return Err(LexError::new("expected TO between range bounds", start_pos));
        }

        let bound = |value: &str| (value != "*").then(|| value.to_string());
        Ok(Some(Token::Range(RangeExpr {
            lower: bound(lower),
            upper: bound(upper),
            lower_inclusive,
            upper_inclusive,
        })))
    }

    /// Reads a term, keyword (AND, OR, NOT), or field prefix.
    fn read_term_or_keyword(&mut self) -> Result<Option<Token>, LexError> {
        let mut word = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }

            if ch == ':' {
                self.advance();
                if word.is_empty() {
                    // Bare colon, treat as part of next term
                    continue;
                }
                return Ok(Some(Token::FieldPrefix(word)));
            }

            word.push(ch);
            self.advance();
        }

        if word.is_empty() {
            return Ok(None);
        }

        let token = if word.eq_ignore_ascii_case("AND") {
            Token::And
        } else if word.eq_ignore_ascii_case("OR") {
            Token::Or
        } else if word.eq_ignore_ascii_case("NOT") {
            Token::Not
        } else {
            Token::Term(word)
        };
        Ok(Some(token))
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Advances to the next character.
    fn advance(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.position += ch.len_utf8();
        }
    }
}

/// Convenience function to tokenize a pattern string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

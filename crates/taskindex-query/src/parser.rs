//! Pattern parser.
//!
//! Parses a token stream into a pattern AST using recursive descent.
//!
//! # Grammar
//!
//! ```text
//! query      → or_expr
//! or_expr    → seq_expr ("OR" seq_expr)*
//! seq_expr   → and_expr+
//! and_expr   → unary ("AND" unary)*
//! unary      → ("-" | "NOT") unary | primary
//! primary    → TERM | PHRASE | RANGE | field_expr | "(" or_expr ")"
//! field_expr → FIELD_PREFIX (TERM | PHRASE | RANGE | "(" or_expr ")")
//! ```
//!
//! # Precedence (highest to lowest)
//!
//! 1. Grouping: `(...)`
//! 2. Field prefix: `field:`
//! 3. Negation: `-`, `NOT`
//! 4. AND (explicit keyword)
//! 5. Adjacency (no connective)
//! 6. OR (explicit keyword)

use std::mem;

use crate::{
    ast::QueryExpr,
    error::{ParseError, QueryError},
    lexer::{Token, tokenize},
};

/// Recursive descent parser for pattern expressions.
struct Parser {
    /// Token stream to parse.
    tokens: Vec<Token>,
    /// Current position in token stream.
    position: usize,
}

impl Parser {
    /// Creates a new parser from a token stream.
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses the token stream into a pattern expression.
    fn parse(mut self) -> Result<Option<QueryExpr>, ParseError> {
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let expr = self.parse_or_expr()?;

        if let Some(token) = self.peek() {
            return Err(ParseError::new(
                format!("unexpected token: {token:?}"),
                Some(self.position),
            ));
        }

        Ok(Some(expr))
    }

    /// Parses: or_expr → seq_expr ("OR" seq_expr)*
    fn parse_or_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut left = self.parse_seq_expr()?;

        while self.check(&Token::Or) {
            self.advance();
            let right = self.parse_seq_expr()?;
            left = QueryExpr::or(vec![left, right]);
        }

        Ok(left)
    }

    /// Parses: seq_expr → and_expr+
    fn parse_seq_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut exprs = vec![self.parse_and_expr()?];

        while self.can_start_unary() {
            exprs.push(self.parse_and_expr()?);
        }

        Ok(QueryExpr::sequence(exprs))
    }

    /// Parses: and_expr → unary ("AND" unary)*
    fn parse_and_expr(&mut self) -> Result<QueryExpr, ParseError> {
        let mut exprs = vec![self.parse_unary()?];

        while self.check(&Token::And) {
            self.advance();
            exprs.push(self.parse_unary()?);
        }

        Ok(QueryExpr::and(exprs))
    }

    /// Checks if the current token can start a unary expression.
    fn can_start_unary(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Term(_)
                    | Token::Phrase(_)
                    | Token::Range(_)
                    | Token::Not
                    | Token::Minus
                    | Token::LParen
                    | Token::FieldPrefix(_)
            )
        )
    }

    /// Parses: unary → ("-" | "NOT") unary | primary
    fn parse_unary(&mut self) -> Result<QueryExpr, ParseError> {
        if self.check(&Token::Not) || self.check(&Token::Minus) {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(QueryExpr::Not(Box::new(expr)));
        }

        self.parse_primary()
    }

    /// Parses: primary → TERM | PHRASE | RANGE | field_expr | "(" or_expr ")"
    fn parse_primary(&mut self) -> Result<QueryExpr, ParseError> {
        match self.peek().cloned() {
            Some(Token::Term(_) | Token::Phrase(_) | Token::Range(_)) => Ok(self.parse_leaf()),

            Some(Token::FieldPrefix(name)) => {
                self.advance();
                self.parse_field_expr(name)
            }

            Some(Token::LParen) => self.parse_group("expected closing parenthesis"),

            Some(Token::RParen) => Err(ParseError::new(
                "unexpected closing parenthesis",
                Some(self.position),
            )),

            Some(token @ (Token::Or | Token::And)) => Err(ParseError::new(
                format!("unexpected {token:?} (needs expression before it)"),
                Some(self.position),
            )),

            Some(Token::Not | Token::Minus) => {
                Err(ParseError::new("unexpected negation", Some(self.position)))
            }

            None => Err(ParseError::new("unexpected end of query", None)),
        }
    }

    /// Parses the expression after a field prefix.
    fn parse_field_expr(&mut self, name: String) -> Result<QueryExpr, ParseError> {
        let expr = match self.peek() {
            Some(Token::Term(_) | Token::Phrase(_) | Token::Range(_)) => self.parse_leaf(),
            Some(Token::LParen) => {
                self.parse_group("expected closing parenthesis after field expression")?
            }
            _ => {
                return Err(ParseError::new(
                    format!("expected term, phrase, range, or group after '{name}:'"),
                    Some(self.position),
                ));
            }
        };

        Ok(QueryExpr::Field {
            name,
            expr: Box::new(expr),
        })
    }

    /// Parses a TERM, PHRASE or RANGE token into a QueryExpr, consuming the token.
    fn parse_leaf(&mut self) -> QueryExpr {
        let expr = match self.peek() {
            Some(Token::Term(text)) => QueryExpr::Term(text.clone()),
            Some(Token::Phrase(text)) => {
                let words: Vec<String> = text.split_whitespace().map(String::from).collect();
                if words.is_empty() {
                    QueryExpr::Term(String::new())
                } else {
                    QueryExpr::Phrase(words)
                }
            }
            Some(Token::Range(range)) => QueryExpr::Range(range.clone()),
            _ => unreachable!("parse_leaf called on a non-leaf token"),
        };
        self.advance();
        expr
    }

    /// Parses a parenthesized group, consuming the surrounding parentheses.
    fn parse_group(&mut self, missing_rparen_msg: &str) -> Result<QueryExpr, ParseError> {
        self.advance(); // (
        let inner = self.parse_or_expr()?;

        if !self.check(&Token::RParen) {
            return Err(ParseError::new(missing_rparen_msg, Some(self.position)));
        }
        self.advance(); // )

        Ok(inner)
    }

    /// Returns the current token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Checks if the current token matches the given token.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| mem::discriminant(t) == mem::discriminant(token))
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }
}

/// Parses a pattern string into an AST.
///
/// Returns `Ok(None)` for empty patterns, `Ok(Some(expr))` for valid patterns,
/// or `Err(QueryError)` for invalid syntax.
pub fn parse(input: &str) -> Result<Option<QueryExpr>, QueryError> {
    let tokens = tokenize(input).map_err(|e| QueryError::lex(input, e))?;
    Parser::new(tokens)
        .parse()
        .map_err(|e| QueryError::parse(input, e))
}

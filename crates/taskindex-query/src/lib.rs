//! Search pattern parsing for the task list index.
//!
//! Patterns follow a small field-qualified boolean grammar:
//!
//! - **Terms**: `crash` - words to look for
//! - **Phrases**: `"null pointer"` - exact sequences
//! - **Fields**: `status:open` - restrict a clause to one field
//! - **Ranges**: `creation_date:[20110101 TO 20111231]` - inclusive `[]` or exclusive `{}` bounds
//! - **Connectives**: `a AND b`, `a OR b`, `NOT a`, `-a` (keywords are case-insensitive)
//! - **Grouping**: `(a OR b) c` - precedence control
//!
//! Adjacent clauses without a connective form a [`QueryExpr::Sequence`]. Whether a
//! sequence is conjunctive is decided by the consumer, which is why
//! [`has_boolean_connectives`] is exposed alongside the parser.
//!
//! # Example
//!
//! ```
//! use taskindex_query::{has_query_syntax, parse};
//!
//! let expr = parse("status:open (crash OR hang) -wontfix").unwrap();
//! assert!(expr.is_some());
//! assert!(has_query_syntax("status:open"));
//! assert!(!has_query_syntax("editor crash"));
//! ```

#![warn(missing_docs)]

mod ast;
mod detect;
mod error;
mod lexer;
mod parser;

pub use ast::{QueryExpr, RangeExpr};
pub use detect::{has_boolean_connectives, has_query_syntax};
pub use error::{LexError, ParseError, QueryError};
pub use lexer::{Token, tokenize};
pub use parser::parse;

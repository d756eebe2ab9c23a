//! Pattern translation.
//!
//! Patterns are parsed by `taskindex-query` and compiled here into Tantivy
//! queries with type-ahead semantics: every plain word matches as a prefix.
//!
//! - **Plain words**: `editor cra` - every word must prefix-match the default field
//! - **Fields**: `status:new` - prefix match in another field
//! - **Phrases**: `"null pointer"` - exact sequence
//! - **Ranges**: `creation_date:[20111019 TO 20111021]` - inclusive or exclusive bounds
//! - **Connectives**: `a OR b`, `a AND b`, `NOT a`, `-a`

mod translate;

pub use taskindex_query::{QueryError, QueryExpr, parse};
pub use translate::QueryTranslator;

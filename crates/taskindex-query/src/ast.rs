//! Pattern abstract syntax tree.
//!
//! Represents parsed patterns before they are translated into engine queries.

use std::fmt;

/// A bounded (or half-open) range over the raw values of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeExpr {
    /// Lower bound, or `None` for `*`.
    pub lower: Option<String>,
    /// Upper bound, or `None` for `*`.
    pub upper: Option<String>,
    /// Whether the lower bound was written with `[`.
    pub lower_inclusive: bool,
    /// Whether the upper bound was written with `]`.
    pub upper_inclusive: bool,
}

impl RangeExpr {
    /// Creates a range with the same inclusivity on both ends.
    pub fn new(lower: Option<&str>, upper: Option<&str>, inclusive: bool) -> Self {
        Self {
            lower: lower.map(String::from),
            upper: upper.map(String::from),
            lower_inclusive: inclusive,
            upper_inclusive: inclusive,
        }
    }

    /// Renders the range in pattern syntax.
    fn to_pattern(&self) -> String {
        format!(
            "{}{} TO {}{}",
            if self.lower_inclusive { '[' } else { '{' },
            self.lower.as_deref().unwrap_or("*"),
            self.upper.as_deref().unwrap_or("*"),
            if self.upper_inclusive { ']' } else { '}' },
        )
    }
}

/// A parsed pattern expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpr {
    /// A single search term.
    Term(String),

    /// An exact phrase (sequence of words).
    Phrase(Vec<String>),

    /// A range over raw field values.
    Range(RangeExpr),

    /// Negation: results must NOT match this expression.
    Not(Box<Self>),

    /// Explicit conjunction written with `AND`.
    And(Vec<Self>),

    /// Explicit disjunction written with `OR`.
    Or(Vec<Self>),

    /// Adjacent clauses with no connective between them.
    Sequence(Vec<Self>),

    /// Field-scoped expression.
    Field {
        /// Field name as written (case preserved).
        name: String,
        /// Expression to match within that field.
        expr: Box<Self>,
    },
}

impl QueryExpr {
    /// Creates an And expression, flattening nested Ands.
    pub fn and(exprs: Vec<Self>) -> Self {
        let flattened: Vec<Self> = exprs
            .into_iter()
            .flat_map(|e| match e {
                Self::And(inner) => inner,
                other => vec![other],
            })
            .collect();
        Self::collapse(flattened, Self::And)
    }

    /// Creates an Or expression, flattening nested Ors.
    pub fn or(exprs: Vec<Self>) -> Self {
        let flattened: Vec<Self> = exprs
            .into_iter()
            .flat_map(|e| match e {
                Self::Or(inner) => inner,
                other => vec![other],
            })
            .collect();
        Self::collapse(flattened, Self::Or)
    }

    /// Creates a Sequence expression.
    ///
    /// Nested sequences are kept: a parenthesized group is a sequence of its own.
    pub fn sequence(exprs: Vec<Self>) -> Self {
        Self::collapse(exprs, Self::Sequence)
    }

    /// Unwraps single-element lists, otherwise builds the list variant.
    fn collapse(mut exprs: Vec<Self>, build: fn(Vec<Self>) -> Self) -> Self {
        if exprs.len() == 1
            && let Some(only) = exprs.pop()
        {
            return only;
        }
        build(exprs)
    }

    /// Formats the expression as a tree structure with the given indentation level.
    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let prefix = "  ".repeat(indent);
        match self {
            Self::Term(s) => writeln!(f, "{prefix}Term({s:?})"),
            Self::Phrase(words) => writeln!(f, "{prefix}Phrase({words:?})"),
            Self::Range(range) => writeln!(f, "{prefix}Range({})", range.to_pattern()),
            Self::Not(inner) => {
                writeln!(f, "{prefix}Not")?;
                inner.fmt_tree(f, indent + 1)
            }
            Self::And(exprs) | Self::Or(exprs) | Self::Sequence(exprs) => {
                let label = match self {
                    Self::And(_) => "And",
                    Self::Or(_) => "Or",
                    _ => "Sequence",
                };
                writeln!(f, "{prefix}{label}")?;
                for expr in exprs {
                    expr.fmt_tree(f, indent + 1)?;
                }
                Ok(())
            }
            Self::Field { name, expr } => {
                writeln!(f, "{prefix}Field({name:?})")?;
                expr.fmt_tree(f, indent + 1)
            }
        }
    }

    /// Formats the expression back into pattern syntax.
    pub fn to_pattern(&self) -> String {
        match self {
            Self::Term(s) => s.clone(),
            Self::Phrase(words) => format!("\"{}\"", words.join(" ")),
            Self::Range(range) => range.to_pattern(),
            Self::Not(inner) => format!("NOT {}", inner.to_grouped_pattern()),
            Self::And(exprs) => Self::join(exprs, " AND "),
            Self::Or(exprs) => Self::join(exprs, " OR "),
            Self::Sequence(exprs) => Self::join(exprs, " "),
            Self::Field { name, expr } => format!("{name}:{}", expr.to_grouped_pattern()),
        }
    }

    /// Like [`Self::to_pattern`], wrapping list expressions in parentheses.
    fn to_grouped_pattern(&self) -> String {
        match self {
            Self::And(_) | Self::Or(_) | Self::Sequence(_) => format!("({})", self.to_pattern()),
            _ => self.to_pattern(),
        }
    }

    /// Joins sub-expressions with a separator.
    fn join(exprs: &[Self], separator: &str) -> String {
        exprs
            .iter()
            .map(Self::to_grouped_pattern)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> QueryExpr {
        QueryExpr::Term(s.into())
    }

    #[test]
    fn and_flattens_nested() {
        let nested = QueryExpr::and(vec![
            term("a"),
            QueryExpr::And(vec![term("b"), term("c")]),
        ]);
        assert_eq!(nested, QueryExpr::And(vec![term("a"), term("b"), term("c")]));
    }

    #[test]
    fn or_single_element_unwraps() {
        assert_eq!(QueryExpr::or(vec![term("a")]), term("a"));
    }

    #[test]
    fn sequence_keeps_nested_groups() {
        let seq = QueryExpr::sequence(vec![
            QueryExpr::Sequence(vec![term("a"), term("b")]),
            term("c"),
        ]);
        let QueryExpr::Sequence(items) = seq else {
            panic!("expected a sequence");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], QueryExpr::Sequence(_)));
    }

    #[test]
    fn pattern_rendering() {
        let expr = QueryExpr::Sequence(vec![
            QueryExpr::Field {
                name: "creation_date".into(),
                expr: Box::new(QueryExpr::Range(RangeExpr::new(
                    Some("20110101"),
                    None,
                    true,
                ))),
            },
            QueryExpr::Not(Box::new(QueryExpr::Or(vec![term("a"), term("b")]))),
        ]);
        assert_eq!(
            expr.to_pattern(),
            "creation_date:[20110101 TO *] NOT (a OR b)"
        );
    }

    #[test]
    fn tree_display() {
        let expr = QueryExpr::And(vec![term("a"), QueryExpr::Phrase(vec!["b".into()])]);
        let shown = expr.to_string();
        assert!(shown.starts_with("And\n"));
        assert!(shown.contains("  Phrase([\"b\"])"));
    }
}

//! Pattern to Tantivy query translation.

use std::{ops::Bound, slice};

use tantivy::{
    Term,
    query::{
        AllQuery, BooleanQuery, EmptyQuery, Occur, PhraseQuery, Query, RangeQuery, RegexQuery,
        TermQuery,
    },
    schema::IndexRecordOption,
    tokenizer::TextAnalyzer,
};
use taskindex_query::{
    QueryError, QueryExpr, RangeExpr, has_boolean_connectives, has_query_syntax, parse,
};
use tracing::debug;

use crate::{
    analyzer::{analyze, build_analyzer},
    field::TaskField,
    schema::IndexSchema,
};

/// Result of compiling one expression. `None` means the expression analyzed
/// to nothing (e.g. punctuation only) and contributes no clause.
type Compiled = Result<Option<Box<dyn Query>>, QueryError>;

/// Translates patterns into Tantivy queries against the task schema.
///
/// Translation never fails: a pattern that does not parse, or that names an
/// unknown field, is matched as plain words against the default field.
#[derive(Clone)]
pub struct QueryTranslator {
    /// Index schema for field handles.
    schema: IndexSchema,
    /// Analyzer matching the one used at index time.
    analyzer: TextAnalyzer,
}

impl QueryTranslator {
    /// Creates a translator for the given schema.
    pub fn new(schema: IndexSchema) -> Self {
        Self {
            schema,
            analyzer: build_analyzer(),
        }
    }

    /// Translates a pattern, using `default_field` for unqualified clauses.
    pub fn translate(&self, pattern: &str, default_field: TaskField) -> Box<dyn Query> {
        let mut compiler = Compiler {
            schema: &self.schema,
            analyzer: self.analyzer.clone(),
        };

        if !has_query_syntax(pattern) {
            return compiler.plain(pattern, default_field);
        }

        // Without an explicit connective, adjacent clauses are all required.
        let conjunctive = !has_boolean_connectives(pattern);
        let compiled = parse(pattern).and_then(|expr| match expr {
            Some(expr) => compiler.compile(&expr, default_field, conjunctive),
            None => Ok(None),
        });

        match compiled {
            Ok(Some(query)) => query,
            Ok(None) => compiler.plain(pattern, default_field),
            Err(e) => {
                debug!(pattern, error = %e.message(), "pattern rejected, matching as plain words");
                compiler.plain(pattern, default_field)
            }
        }
    }
}

/// Per-call translation state.
struct Compiler<'a> {
    /// Index schema for field handles.
    schema: &'a IndexSchema,
    /// Analyzer for query words.
    analyzer: TextAnalyzer,
}

impl Compiler<'_> {
    /// Type-ahead match: every word of the pattern must prefix-match `field`.
    fn plain(&mut self, pattern: &str, field: TaskField) -> Box<dyn Query> {
        if field.is_raw() {
            return self.prefix(field, pattern.trim());
        }
        let tokens = analyze(&mut self.analyzer, pattern);
        match tokens.as_slice() {
            [] => self.prefix(field, ""),
            [token] => self.prefix(field, token),
            _ => {
                let clauses = tokens
                    .iter()
                    .map(|token| (Occur::Must, self.prefix(field, token)))
                    .collect();
                Box::new(BooleanQuery::new(clauses))
            }
        }
    }

    /// Compiles an expression. `conjunctive` makes a sequence at this level
    /// required rather than optional; nested levels never are.
    fn compile(&mut self, expr: &QueryExpr, field: TaskField, conjunctive: bool) -> Compiled {
        match expr {
            QueryExpr::Term(text) => Ok(self.term(field, text)),
            QueryExpr::Phrase(words) => Ok(self.phrase(field, words)),
            QueryExpr::Range(range) => Ok(Some(self.range(field, range))),
            QueryExpr::Not(_) => self.boolean(slice::from_ref(expr), Occur::Must, field),
            QueryExpr::And(exprs) => self.boolean(exprs, Occur::Must, field),
            QueryExpr::Or(exprs) => self.boolean(exprs, Occur::Should, field),
            QueryExpr::Sequence(exprs) => {
                let occur = if conjunctive {
                    Occur::Must
                } else {
                    Occur::Should
                };
                self.boolean(exprs, occur, field)
            }
            QueryExpr::Field { name, expr } => {
                let scoped = TaskField::from_name(name)
                    .ok_or_else(|| QueryError::unknown_field(name.as_str()))?;
                self.compile(expr, scoped, false)
            }
        }
    }

    /// Combines clauses with `occur`; negated clauses become `MustNot`.
    ///
    /// A lone positive clause is returned unwrapped. Negations with nothing
    /// positive exclude from the full document set.
    fn boolean(&mut self, exprs: &[QueryExpr], occur: Occur, field: TaskField) -> Compiled {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        let mut positive = 0;

        for expr in exprs {
            if let QueryExpr::Not(inner) = expr {
                if let Some(query) = self.compile(inner, field, false)? {
                    clauses.push((Occur::MustNot, query));
                }
            } else if let Some(query) = self.compile(expr, field, false)? {
                clauses.push((occur, query));
                positive += 1;
            }
        }

        if clauses.is_empty() {
            return Ok(None);
        }
        if positive == 0 {
            clauses.insert(0, (Occur::Must, Box::new(AllQuery)));
        } else if clauses.len() == 1 {
            return Ok(clauses.pop().map(|(_, query)| query));
        }
        Ok(Some(Box::new(BooleanQuery::new(clauses))))
    }

    /// A bare word. Matches as a prefix; words the analyzer splits apart
    /// match as a phrase.
    fn term(&mut self, field: TaskField, text: &str) -> Option<Box<dyn Query>> {
        if field.is_raw() {
            return Some(self.prefix(field, text));
        }
        let tokens = analyze(&mut self.analyzer, text);
        match tokens.as_slice() {
            [] => None,
            [token] => Some(self.prefix(field, token)),
            _ => Some(self.exact(field, &tokens)),
        }
    }

    /// A quoted phrase. Matches exactly, never as a prefix.
    fn phrase(&mut self, field: TaskField, words: &[String]) -> Option<Box<dyn Query>> {
        if field.is_raw() {
            return Some(self.exact(field, &[words.join(" ")]));
        }
        let tokens: Vec<String> = words
            .iter()
            .flat_map(|word| analyze(&mut self.analyzer, word))
            .collect();
        (!tokens.is_empty()).then(|| self.exact(field, &tokens))
    }

    /// Term or phrase query over already analyzed tokens.
    fn exact(&self, field: TaskField, tokens: &[String]) -> Box<dyn Query> {
        let tantivy_field = self.schema.field(field);
        if let [token] = tokens {
            let option = if field.is_raw() {
                IndexRecordOption::Basic
            } else {
                IndexRecordOption::WithFreqs
            };
            let term = Term::from_field_text(tantivy_field, token);
            return Box::new(TermQuery::new(term, option));
        }
        let terms = tokens
            .iter()
            .map(|token| Term::from_field_text(tantivy_field, token))
            .collect();
        Box::new(PhraseQuery::new(terms))
    }

    /// Lexicographic range over a field's indexed terms.
    ///
    /// Date fields compare their `yyyyMMddHH` strings as written; bounds on
    /// text fields are lowercased to line up with the analyzer.
    fn range(&self, field: TaskField, range: &RangeExpr) -> Box<dyn Query> {
        let normalize = |value: &str| {
            if field.is_raw() {
                value.to_string()
            } else {
                value.to_lowercase()
            }
        };
        let bound = |value: &Option<String>, inclusive: bool| match value.as_deref() {
            None => Bound::Unbounded,
            Some(v) if inclusive => Bound::Included(normalize(v)),
            Some(v) => Bound::Excluded(normalize(v)),
        };
        let lower = bound(&range.lower, range.lower_inclusive);
        let upper = bound(&range.upper, range.upper_inclusive);

        Box::new(RangeQuery::new_str_bounds(
            field.name().to_string(),
            lower.as_ref().map(String::as_str),
            upper.as_ref().map(String::as_str),
        ))
    }

    /// Matches terms of `field` starting with `prefix`.
    fn prefix(&self, field: TaskField, prefix: &str) -> Box<dyn Query> {
        let pattern = format!("{}.*", regex::escape(prefix));
        match RegexQuery::from_pattern(&pattern, self.schema.field(field)) {
            Ok(query) => Box::new(query),
            Err(e) => {
                debug!(prefix, error = %e, "prefix did not compile, matching nothing");
                Box::new(EmptyQuery)
            }
        }
    }
}

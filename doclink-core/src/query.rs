//! Query model handed to storage backends.
//!
//! The mapper never evaluates a query itself. It builds a [`Query`] (a conjunction of
//! single-field comparisons plus ordering and pagination) and hands it to the backend,
//! which either evaluates it (in-memory) or translates it (MongoDB) through a
//! [`QueryVisitor`].
//!
//! # Query Building
//!
//! ```ignore
//! use doclink::query::{Filter, Query, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::gte("age", 18))
//!     .sort("name", SortDirection::Asc)
//!     .limit(10)
//!     .build();
//! ```

use bson::Bson;
use std::{fmt, str::FromStr};

use crate::error::DocLinkError;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Comparison operators accepted by `where` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `array-contains`: the array field contains the value.
    ArrayContains,
    /// `array-contains-any`: the array field contains any of the listed values.
    ArrayContainsAny,
    /// `in`: the field equals one of the listed values.
    In,
    /// `not-in`: the field equals none of the listed values.
    NotIn,
}

impl WhereOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            WhereOp::Eq => "==",
            WhereOp::Ne => "!=",
            WhereOp::Lt => "<",
            WhereOp::Lte => "<=",
            WhereOp::Gt => ">",
            WhereOp::Gte => ">=",
            WhereOp::ArrayContains => "array-contains",
            WhereOp::ArrayContainsAny => "array-contains-any",
            WhereOp::In => "in",
            WhereOp::NotIn => "not-in",
        }
    }
}

impl FromStr for WhereOp {
    type Err = DocLinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "==" => WhereOp::Eq,
            "!=" => WhereOp::Ne,
            "<" => WhereOp::Lt,
            "<=" => WhereOp::Lte,
            ">" => WhereOp::Gt,
            ">=" => WhereOp::Gte,
            "array-contains" => WhereOp::ArrayContains,
            "array-contains-any" => WhereOp::ArrayContainsAny,
            "in" => WhereOp::In,
            "not-in" => WhereOp::NotIn,
            other => return Err(DocLinkError::InvalidOperator(other.to_string())),
        })
    }
}

impl fmt::Display for WhereOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Single-field comparison.
    Field {
        field: String,
        op: WhereOp,
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: impl Into<String>, op: WhereOp, value: impl Into<Bson>) -> Self {
        Expr::Field {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }
}

/// A structured query: filter, ordering and pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Sort keys, most significant first.
    pub sort: Vec<Sort>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
    /// Number of documents to skip.
    pub offset: Option<usize>,
}

impl Query {
    /// Creates an empty query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Adds a filter, AND-ing it with any existing one.
    pub fn push_filter(&mut self, expr: Expr) {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
    }
}

/// Helper for constructing comparison expressions.
///
/// ```ignore
/// use doclink::query::Filter;
///
/// let expr = Filter::eq("name", "Alice").and(Filter::gt("age", 18));
/// ```
pub struct Filter;

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::Ne, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::Lte, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::Gte, value)
    }

    pub fn array_contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::ArrayContains, value)
    }

    pub fn array_contains_any(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::ArrayContainsAny, values)
    }

    pub fn is_in(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::In, values)
    }

    pub fn not_in(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        Expr::field(field, WhereOp::NotIn, values)
    }

    /// Combines multiple expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter expression, AND-ed with any previous one.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.push_filter(filter);
        self
    }

    /// Appends a sort key.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort.push(Sort { field: field.into(), direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}

/// Visitor over filter expressions, implemented by backends.
pub trait QueryVisitor {
    type Output;
    type Error: Into<DocLinkError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: WhereOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_round_trip_through_strings() {
        for op in [
            WhereOp::Eq,
            WhereOp::Ne,
            WhereOp::Lt,
            WhereOp::Lte,
            WhereOp::Gt,
            WhereOp::Gte,
            WhereOp::ArrayContains,
            WhereOp::ArrayContainsAny,
            WhereOp::In,
            WhereOp::NotIn,
        ] {
            assert_eq!(op.as_str().parse::<WhereOp>().unwrap(), op);
        }

        assert!(matches!(
            "=~".parse::<WhereOp>(),
            Err(DocLinkError::InvalidOperator(op)) if op == "=~"
        ));
    }

    #[test]
    fn chained_filters_flatten_into_one_conjunction() {
        let query = Query::builder()
            .filter(Filter::gte("age", 18))
            .filter(Filter::lt("age", 65))
            .filter(Filter::eq("active", true))
            .build();

        match query.filter {
            Some(Expr::And(exprs)) => assert_eq!(exprs.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }
    }
}

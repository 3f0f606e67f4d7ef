//! Query expression evaluation for in-memory document filtering.
//!
//! Integers of either width compare exactly with each other. Comparisons that involve
//! a float go through `f64`. A comparison against a field the document lacks never
//! matches, whatever the operator.

use bson::{Bson, DateTime, Document};
use std::cmp::Ordering;

use doclink_core::{
    error::{DocLinkError, DocLinkResult},
    query::{Expr, QueryVisitor, Sort, SortDirection, WhereOp},
};

/// Type-erased, comparable representation of BSON values.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    /// Int32 and Int64, widened
    Int(i64),
    Number(f64),
    String(&'a str),
    DateTime(DateTime),
    Array(Vec<Comparable<'a>>),
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Values with no ordering of their own, compared by equality only
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::Array(array) => Comparable::Array(
                array
                    .iter()
                    .map(Comparable::from)
                    .collect()
            ),
            Bson::Document(document) => Comparable::Map(
                document
                    .iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl Comparable<'_> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Bool(_) => 1,
            Comparable::Int(_) | Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::DateTime(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Map(_) => 6,
            Comparable::Other(_) => 7,
        }
    }

    /// Total order used for sorting: values of different types order by type.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }

    fn elements(&self) -> &[Comparable<'_>] {
        match self {
            Comparable::Array(items) => items,
            _ => &[],
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Int(a), Comparable::Int(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64) == *b,
            (Comparable::Number(a), Comparable::Int(b)) => *a == (*b as f64),
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Int(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::Int(a), Comparable::Number(b)) => (*a as f64).partial_cmp(b),
            (Comparable::Number(a), Comparable::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocLinkResult<bool> {
        self.visit_expr(expr)
    }

    /// Orders two documents by a list of sort keys, most significant first.
    pub fn compare(left: &Document, right: &Document, sort: &[Sort]) -> Ordering {
        sort.iter()
            .map(|key| {
                let left = left
                    .get(&key.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);
                let right = right
                    .get(&key.field)
                    .map(Comparable::from)
                    .unwrap_or(Comparable::Null);

                match key.direction {
                    SortDirection::Asc => left.sort_cmp(&right),
                    SortDirection::Desc => right.sort_cmp(&left),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocLinkError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_field(&mut self, field: &str, op: WhereOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(field) else {
            return Ok(false);
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            WhereOp::Eq => left == right,
            WhereOp::Ne => left != right,
            WhereOp::Lt | WhereOp::Lte | WhereOp::Gt | WhereOp::Gte => match left.partial_cmp(&right) {
                Some(ordering) => match op {
                    WhereOp::Lt => ordering.is_lt(),
                    WhereOp::Lte => ordering.is_le(),
                    WhereOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                },
                None => false,
            },
            WhereOp::ArrayContains => left
                .elements()
                .iter()
                .any(|item| *item == right),
            WhereOp::ArrayContainsAny => left
                .elements()
                .iter()
                .any(|item| right.elements().contains(item)),
            WhereOp::In => right.elements().contains(&left),
            WhereOp::NotIn => !right.elements().contains(&left),
        })
    }
}

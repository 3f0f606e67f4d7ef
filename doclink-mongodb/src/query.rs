//! Query translation from doclink filter expressions to MongoDB query documents.

use bson::{Bson, Document, doc};

use doclink_core::{
    error::DocLinkError,
    query::{Expr, QueryVisitor, Sort, SortDirection, WhereOp},
};

/// Translates filter expressions into MongoDB's native query syntax.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Builds the sort document for a list of sort keys, most significant first.
    pub fn sort_document(sort: &[Sort]) -> Document {
        sort.iter()
            .map(|key| {
                (
                    key.field.clone(),
                    Bson::Int32(match key.direction {
                        SortDirection::Asc => 1,
                        SortDirection::Desc => -1,
                    }),
                )
            })
            .collect()
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocLinkError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_field(&mut self, field: &str, op: WhereOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let list = || match value {
            Bson::Array(_) => Ok(value.clone()),
            _ => Err(DocLinkError::Backend(format!(
                "Operator {op} requires an array value"
            ))),
        };

        Ok(doc! {
            field: match op {
                WhereOp::Eq => doc! { "$eq": value },
                WhereOp::Ne => doc! { "$ne": value },
                WhereOp::Lt => doc! { "$lt": value },
                WhereOp::Lte => doc! { "$lte": value },
                WhereOp::Gt => doc! { "$gt": value },
                WhereOp::Gte => doc! { "$gte": value },
                // An equality on an array field matches any element
                WhereOp::ArrayContains => doc! { "$elemMatch": { "$eq": value } },
                WhereOp::ArrayContainsAny | WhereOp::In => doc! { "$in": list()? },
                WhereOp::NotIn => doc! { "$nin": list()?, "$exists": true },
            }
        })
    }
}

//! Write-side field values.
//!
//! Writes distinguish plain values from references explicitly: [`Fields::set`] stores a
//! scalar and [`Fields::reference`] stores a handle to another document. Nothing is
//! inferred from the runtime shape of a value.

use bson::Bson;

use crate::record::{AsReference, Reference};

/// A value supplied to a write.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Bson),
    Reference(Reference),
}

/// An ordered set of field assignments for `create` and `update`.
///
/// Assigning the same field twice keeps the last value.
///
/// # Example
///
/// ```ignore
/// let fields = Fields::new()
///     .set("name", "B")
///     .reference("manager", &alice);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, FieldValue)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a plain value.
    pub fn set(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.with(field, FieldValue::Scalar(value.into()))
    }

    /// Assigns a reference to another document.
    pub fn reference(self, field: impl Into<String>, target: impl AsReference) -> Self {
        self.with(field, FieldValue::Reference(target.as_reference()))
    }

    /// Assigns an already-tagged value.
    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        let field = field.into();

        match self
            .entries
            .iter_mut()
            .find(|(name, _)| *name == field)
        {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((field, value)),
        }

        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    #[test]
    fn later_assignment_wins_and_keeps_position() {
        let fields = Fields::new()
            .set("name", "A")
            .set("age", 3)
            .set("name", "B");

        let collected = fields
            .iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect::<Vec<_>>();

        assert_eq!(
            collected,
            vec![
                ("name".to_string(), FieldValue::Scalar(Bson::String("B".to_string()))),
                ("age".to_string(), FieldValue::Scalar(Bson::Int32(3))),
            ]
        );
    }

    #[test]
    fn reference_accepts_records() {
        let target = Record::new("u1", "User");
        let fields = Fields::new().reference("manager", &target);

        assert_eq!(
            fields.into_iter().next(),
            Some((
                "manager".to_string(),
                FieldValue::Reference(Reference::new("u1", "User"))
            ))
        );
    }
}

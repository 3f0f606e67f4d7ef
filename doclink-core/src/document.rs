//! The declarative contract every mapped entity type satisfies.
//!
//! An entity type is a Rust type implementing [`DocumentClass`]. The trait carries no
//! data of its own; it names the class, its backing collection and its two field
//! registries. [`ClassMetadata`] is the runtime form of that contract, the value the
//! [`Registry`](crate::registry::Registry) stores and every other component reads.
//!
//! No validation happens here. Writes are validated by the
//! [`Gateway`](crate::gateway::Gateway).

use std::collections::{BTreeMap, BTreeSet};

/// Core trait that every mapped entity type implements.
///
/// # Example
///
/// ```ignore
/// use doclink::document::DocumentClass;
///
/// pub struct User;
///
/// impl DocumentClass for User {
///     fn class_name() -> &'static str {
///         "User"
///     }
///
///     fn fields() -> &'static [&'static str] {
///         &["name"]
///     }
///
///     fn references() -> &'static [(&'static str, &'static str)] {
///         &[("manager", "User")]
///     }
/// }
/// ```
pub trait DocumentClass: Send + Sync + 'static {
    /// Returns the entity-type identifier. Reference targets are named by this value.
    fn class_name() -> &'static str;

    /// Returns the name of the backing collection.
    ///
    /// Defaults to the class name.
    fn collection_name() -> &'static str {
        Self::class_name()
    }

    /// Returns the plain (scalar) fields legal on write.
    fn fields() -> &'static [&'static str];

    /// Returns `(field, target class name)` pairs for the reference fields.
    fn references() -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Builds the runtime metadata for this class.
    fn metadata() -> ClassMetadata {
        Self::references()
            .iter()
            .fold(
                ClassMetadata::builder(Self::class_name())
                    .storage_name(Self::collection_name())
                    .fields(Self::fields().iter().copied()),
                |builder, (field, target)| builder.reference(*field, *target),
            )
            .build()
    }
}

/// Runtime metadata of one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    name: String,
    storage_name: String,
    fields: BTreeSet<String>,
    references: BTreeMap<String, String>,
}

impl ClassMetadata {
    /// Creates a builder for the class with the given name.
    pub fn builder(name: impl Into<String>) -> ClassMetadataBuilder {
        ClassMetadataBuilder::new(name)
    }

    /// Returns the entity-type identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the backing collection name.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// Returns the registered plain fields.
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Returns the registered reference fields and their target classes.
    pub fn references(&self) -> &BTreeMap<String, String> {
        &self.references
    }

    pub fn is_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn is_reference(&self, field: &str) -> bool {
        self.references.contains_key(field)
    }

    /// Returns the target class of a reference field, if `field` is one.
    pub fn reference_target(&self, field: &str) -> Option<&str> {
        self.references
            .get(field)
            .map(String::as_str)
    }
}

/// Builder for [`ClassMetadata`].
///
/// The storage name defaults to the class name.
#[derive(Debug, Clone)]
pub struct ClassMetadataBuilder {
    name: String,
    storage_name: Option<String>,
    fields: BTreeSet<String>,
    references: BTreeMap<String, String>,
}

impl ClassMetadataBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage_name: None,
            fields: BTreeSet::new(),
            references: BTreeMap::new(),
        }
    }

    /// Sets the backing collection name.
    pub fn storage_name(mut self, storage_name: impl Into<String>) -> Self {
        self.storage_name = Some(storage_name.into());
        self
    }

    /// Registers a plain field.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into());
        self
    }

    /// Registers several plain fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Registers a reference field pointing at documents of class `target`.
    pub fn reference(mut self, field: impl Into<String>, target: impl Into<String>) -> Self {
        self.references
            .insert(field.into(), target.into());
        self
    }

    pub fn build(self) -> ClassMetadata {
        ClassMetadata {
            storage_name: self
                .storage_name
                .unwrap_or_else(|| self.name.clone()),
            name: self.name,
            fields: self.fields,
            references: self.references,
        }
    }
}

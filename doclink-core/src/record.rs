//! In-memory document instances and the values they hold.
//!
//! A [`Record`] is an identity plus a map from field name to [`Value`]. The map may hold
//! stored fields the class metadata does not declare. [`Instance<D>`] layers the entity
//! type on top of a record.

use bson::{Bson, de::deserialize_from_bson};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::BTreeMap,
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
};

use crate::{document::DocumentClass, error::DocLinkResult};

/// A reference handle: the identity and class of another document, never its data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Reference {
    id: String,
    class: String,
}

impl Reference {
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self { id: id.into(), class: class.into() }
    }

    /// Returns the identity of the referenced document.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the class name of the referenced document.
    pub fn class(&self) -> &str {
        &self.class
    }
}

/// Capability of naming a document: anything that exposes an identity and a class.
pub trait AsReference {
    fn as_reference(&self) -> Reference;
}

impl AsReference for Reference {
    fn as_reference(&self) -> Reference {
        self.clone()
    }
}

impl AsReference for Record {
    fn as_reference(&self) -> Reference {
        self.reference()
    }
}

impl<D: DocumentClass> AsReference for Instance<D> {
    fn as_reference(&self) -> Reference {
        self.record.reference()
    }
}

impl<T: AsReference + ?Sized> AsReference for &T {
    fn as_reference(&self) -> Reference {
        (**self).as_reference()
    }
}

/// A field value as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A plain value copied from the stored document.
    Scalar(Bson),
    /// An unhydrated reference to another document.
    Reference(Reference),
    /// A hydrated reference: the fetched target document.
    Document(Box<Record>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Bson> {
        match self {
            Value::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Record> {
        match self {
            Value::Document(record) => Some(record),
            _ => None,
        }
    }

    /// Returns `true` if this value is a reference handle still waiting to be hydrated.
    pub fn is_unhydrated(&self) -> bool {
        matches!(self, Value::Reference(_))
    }
}

impl From<Bson> for Value {
    fn from(value: Bson) -> Self {
        Value::Scalar(value)
    }
}

impl From<Reference> for Value {
    fn from(reference: Reference) -> Self {
        Value::Reference(reference)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Document(Box::new(record))
    }
}

/// One materialized document of some entity type.
///
/// The identity is fixed at construction; field values can be changed freely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: String,
    class: String,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    ///
    /// Records are normally produced by the
    /// [`snapshot`](crate::snapshot) translator rather than built by hand.
    pub fn new(id: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields
            .insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    pub fn scalar(&self, field: &str) -> Option<&Bson> {
        self.get(field)
            .and_then(Value::as_scalar)
    }

    /// Returns the reference handle held by `field`, if it has not been hydrated.
    pub fn reference_to(&self, field: &str) -> Option<&Reference> {
        self.get(field)
            .and_then(Value::as_reference)
    }

    /// Returns the hydrated document held by `field`.
    pub fn document(&self, field: &str) -> Option<&Record> {
        self.get(field)
            .and_then(Value::as_document)
    }

    /// Deserializes a scalar field into `T`.
    ///
    /// Returns `Ok(None)` when the field is absent or holds a reference.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the stored value does not fit `T`.
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> DocLinkResult<Option<T>> {
        self.scalar(field)
            .map(|value| deserialize_from_bson(value.clone()))
            .transpose()
            .map_err(Into::into)
    }

    /// Produces a reference handle naming this record.
    pub fn reference(&self) -> Reference {
        Reference::new(self.id.clone(), self.class.clone())
    }

    /// Converts this record to JSON, hydrated references included.
    pub fn to_json(&self) -> DocLinkResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Tags this record with its entity type, if the class matches.
    pub fn into_instance<D: DocumentClass>(self) -> Option<Instance<D>> {
        (self.class == D::class_name()).then(|| Instance::from_record(self))
    }
}

/// A [`Record`] known to belong to entity type `D`.
pub struct Instance<D> {
    record: Record,
    _marker: PhantomData<fn() -> D>,
}

impl<D: DocumentClass> Instance<D> {
    pub(crate) fn from_record(record: Record) -> Self {
        Self { record, _marker: PhantomData }
    }

    /// Produces a reference handle naming this instance.
    pub fn reference(&self) -> Reference {
        Reference::new(self.record.id.clone(), D::class_name())
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

impl<D> Deref for Instance<D> {
    type Target = Record;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl<D> DerefMut for Instance<D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.record
    }
}

impl<D> Clone for Instance<D> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
            _marker: PhantomData,
        }
    }
}

impl<D> PartialEq for Instance<D> {
    fn eq(&self, other: &Self) -> bool {
        self.record == other.record
    }
}

impl<D> fmt::Debug for Instance<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Instance")
            .field(&self.record)
            .finish()
    }
}

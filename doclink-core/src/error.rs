//! Error types and result types for mapper and backend operations.
//!
//! Every fallible operation in the workspace returns [`DocLinkResult<T>`]. Backend
//! failures travel through the mapper untouched, so a caller sees exactly the
//! variant the backend produced.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the mapper or a storage backend.
///
/// Absence is never an error: lookups that find nothing return `None`.
#[derive(Error, Debug)]
pub enum DocLinkError {
    /// Serialization/deserialization error when converting between formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The process-wide gateway was used before [`initialize`](crate::gateway::initialize).
    #[error("Gateway has not been initialized")]
    NotInitialized,
    /// The process-wide gateway was initialized twice.
    #[error("Gateway has already been initialized")]
    AlreadyInitialized,
    /// A write supplied a field that is neither a plain field nor a reference field.
    #[error("You are trying to create unknown field \"{field}\" in \"{class}\"")]
    UnknownField {
        /// The entity type being written.
        class: String,
        /// The offending field name.
        field: String,
    },
    /// A preload asked for a field that is not registered as a reference.
    #[error("Field \"{field}\" of \"{class}\" is not a reference field")]
    UnknownReference {
        /// The entity type being queried.
        class: String,
        /// The offending field name.
        field: String,
    },
    /// A reference field was given a value that cannot name a document of its target type.
    #[error("Invalid reference value for field \"{field}\" in \"{class}\"")]
    InvalidReference {
        /// The entity type being written.
        class: String,
        /// The offending field name.
        field: String,
    },
    /// A comparison operator string could not be parsed.
    #[error("Invalid query operator: {0}")]
    InvalidOperator(String),
    /// The entity type has no registered metadata.
    #[error("Document class not registered: {0}")]
    ClassNotRegistered(String),
    /// The entity type was registered twice.
    #[error("Document class already registered: {0}")]
    ClassAlreadyRegistered(String),
    /// A reference field names a target class that was never registered.
    #[error("Reference field \"{field}\" of \"{class}\" targets unregistered class \"{target}\"")]
    UnregisteredReferenceTarget {
        /// The entity type declaring the reference.
        class: String,
        /// The reference field.
        field: String,
        /// The missing target class.
        target: String,
    },
    /// Two entity types claimed the same backing collection.
    #[error("Collection {storage} is already used by document class {class}")]
    StorageNameConflict {
        /// The contested collection name.
        storage: String,
        /// The class that registered it first.
        class: String,
    },
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for mapper and backend operations.
pub type DocLinkResult<T> = Result<T, DocLinkError>;

impl From<BsonError> for DocLinkError {
    fn from(err: BsonError) -> Self {
        DocLinkError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocLinkError {
    fn from(err: SerdeJsonError) -> Self {
        DocLinkError::Serialization(err.to_string())
    }
}

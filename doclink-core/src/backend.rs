//! Storage backend abstraction.
//!
//! The mapper reaches the database only through [`StoreBackend`]: insertion that
//! returns the store-assigned identity, lookup by identity with an explicit existence
//! flag ([`Snapshot`]), merge updates, deletion, filtered queries and whole-collection
//! listing. Transport, consistency and persistence are the backend's business.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use doclink::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//!
//! let id = backend.insert_document(doc! { "name": "Alice", "age": 30 }, "users").await?;
//! let snapshot = backend.get_document(&id, "users").await?;
//! assert!(snapshot.exists());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Document;
use std::{any::Any, fmt::Debug};

use crate::{error::DocLinkResult, query::Query};

/// A raw stored record as returned by a backend.
///
/// `data` is `None` when no document with this identity exists.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    id: String,
    data: Option<Document>,
}

impl Snapshot {
    /// A snapshot of an existing document.
    pub fn found(id: impl Into<String>, data: Document) -> Self {
        Self { id: id.into(), data: Some(data) }
    }

    /// A snapshot recording that no document has this identity.
    pub fn missing(id: impl Into<String>) -> Self {
        Self { id: id.into(), data: None }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&Document> {
        self.data.as_ref()
    }

    pub fn into_parts(self) -> (String, Option<Document>) {
        (self.id, self.data)
    }
}

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks. The mapper issues reference fetches concurrently.
///
/// # Error Handling
///
/// Backends report failures as [`DocLinkError`](crate::error::DocLinkError) values; the
/// mapper returns them to the caller unchanged. A missing document on read is not an
/// error, it is a [`Snapshot::missing`].
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a document and returns the identity the store assigned to it.
    ///
    /// The collection is created if it doesn't exist.
    async fn insert_document(&self, document: Document, collection: &str) -> DocLinkResult<String>;

    /// Fetches one document by identity.
    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot>;

    /// Merges `document` into the stored document with identity `id`.
    ///
    /// Fields not present in `document` are left untouched. Returns
    /// [`DocumentNotFound`](crate::error::DocLinkError::DocumentNotFound) if there is no
    /// such document.
    async fn update_document(
        &self,
        id: &str,
        document: Document,
        collection: &str,
    ) -> DocLinkResult<()>;

    /// Deletes one document by identity.
    ///
    /// Returns [`DocumentNotFound`](crate::error::DocLinkError::DocumentNotFound) if there
    /// is no such document.
    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()>;

    /// Runs a structured query against a collection.
    ///
    /// Results come back in the store's order: insertion order unless the query sorts.
    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>>;

    /// Lists every document of a collection.
    async fn list_documents(&self, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        StoreBackend::query_documents(self, Query::new(), collection).await
    }

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocLinkResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_document(&self, document: Document, collection: &str) -> DocLinkResult<String> {
        StoreBackend::insert_document(*self, document, collection).await
    }

    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot> {
        StoreBackend::get_document(*self, id, collection).await
    }

    async fn update_document(
        &self,
        id: &str,
        document: Document,
        collection: &str,
    ) -> DocLinkResult<()> {
        StoreBackend::update_document(*self, id, document, collection).await
    }

    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()> {
        StoreBackend::delete_document(*self, id, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        StoreBackend::query_documents(*self, query, collection).await
    }

    async fn list_documents(&self, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        StoreBackend::list_documents(*self, collection).await
    }
}

#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn insert_document(&self, document: Document, collection: &str) -> DocLinkResult<String>;
    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot>;
    async fn update_document(
        &self,
        id: &str,
        document: Document,
        collection: &str,
    ) -> DocLinkResult<()>;
    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()>;
    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>>;
    async fn list_documents(&self, collection: &str) -> DocLinkResult<Vec<Snapshot>>;
    async fn shutdown_boxed(self: Box<Self>) -> DocLinkResult<()>;

    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<B: StoreBackend + 'static> DynStoreBackend for B {
    async fn insert_document(&self, document: Document, collection: &str) -> DocLinkResult<String> {
        StoreBackend::insert_document(self, document, collection).await
    }

    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot> {
        StoreBackend::get_document(self, id, collection).await
    }

    async fn update_document(
        &self,
        id: &str,
        document: Document,
        collection: &str,
    ) -> DocLinkResult<()> {
        StoreBackend::update_document(self, id, document, collection).await
    }

    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()> {
        StoreBackend::delete_document(self, id, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        StoreBackend::query_documents(self, query, collection).await
    }

    async fn list_documents(&self, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        StoreBackend::list_documents(self, collection).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocLinkResult<()> {
        StoreBackend::shutdown(*self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[async_trait]
impl StoreBackend for Box<dyn DynStoreBackend> {
    async fn insert_document(&self, document: Document, collection: &str) -> DocLinkResult<String> {
        DynStoreBackend::insert_document(&**self, document, collection).await
    }

    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot> {
        DynStoreBackend::get_document(&**self, id, collection).await
    }

    async fn update_document(
        &self,
        id: &str,
        document: Document,
        collection: &str,
    ) -> DocLinkResult<()> {
        DynStoreBackend::update_document(&**self, id, document, collection).await
    }

    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()> {
        DynStoreBackend::delete_document(&**self, id, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        DynStoreBackend::query_documents(&**self, query, collection).await
    }

    async fn list_documents(&self, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        DynStoreBackend::list_documents(&**self, collection).await
    }

    async fn shutdown(self) -> DocLinkResult<()> {
        DynStoreBackend::shutdown_boxed(self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocLinkResult<Self::Backend>;
}

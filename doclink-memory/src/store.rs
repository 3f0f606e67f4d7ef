//! In-memory storage implementation.
//!
//! Documents live in per-collection maps behind an async-aware read-write lock. Each
//! collection also remembers insertion order, which is the order unsorted queries and
//! listings return.

use async_trait::async_trait;
use bson::Document;
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};
use tracing::trace;
use uuid::Uuid;

use doclink_core::{
    backend::{Snapshot, StoreBackend, StoreBackendBuilder},
    error::{DocLinkError, DocLinkResult},
    query::Query,
};

use crate::evaluator::DocumentEvaluator;

#[derive(Debug, Default, Clone)]
struct Collection {
    order: Vec<String>,
    documents: HashMap<String, Document>,
}

impl Collection {
    fn iter(&self) -> impl Iterator<Item = (&String, &Document)> {
        self.order
            .iter()
            .filter_map(|id| self.documents.get_key_value(id))
    }
}

type StoreMap = HashMap<String, Collection>;

/// Thread-safe in-memory document storage backend.
///
/// Identities are random UUIDs rendered as strings.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries scan every document of a collection. There are no indexes.
///
/// # Example
///
/// ```ignore
/// use doclink_memory::InMemoryStore;
/// use doclink::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
///
/// let id = store.insert_document(doc! { "name": "Alice", "age": 30 }, "users").await?;
/// let snapshot = store.get_document(&id, "users").await?;
/// assert!(snapshot.exists());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns the number of documents stored in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map(|collection| collection.order.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, document: Document, collection: &str) -> DocLinkResult<String> {
        let id = Uuid::new_v4().to_string();

        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        collection_map.order.push(id.clone());
        collection_map.documents.insert(id.clone(), document);

        trace!(collection, id = %id, "inserted document");

        Ok(id)
    }

    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot> {
        let store = self.store.read().await;

        Ok(
            match store
                .get(collection)
                .and_then(|collection_map| collection_map.documents.get(id))
            {
                Some(document) => Snapshot::found(id, document.clone()),
                None => Snapshot::missing(id),
            }
        )
    }

    async fn update_document(&self, id: &str, document: Document, collection: &str) -> DocLinkResult<()> {
        let mut store = self.store.write().await;

        let existing = store
            .get_mut(collection)
            .and_then(|collection_map| collection_map.documents.get_mut(id))
            .ok_or_else(|| DocLinkError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        for (field, value) in document {
            existing.insert(field, value);
        }

        trace!(collection, id, "updated document");

        Ok(())
    }

    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()> {
        let mut store = self.store.write().await;

        let collection_map = store
            .get_mut(collection)
            .ok_or_else(|| DocLinkError::DocumentNotFound(id.to_string(), collection.to_string()))?;

        if collection_map.documents.remove(id).is_none() {
            return Err(DocLinkError::DocumentNotFound(id.to_string(), collection.to_string()));
        }

        collection_map.order.retain(|existing| existing != id);

        trace!(collection, id, "deleted document");

        Ok(())
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(collection_map) => collection_map,
            None => return Ok(vec![]),
        };

        let mut matched = Vec::new();

        for (id, document) in collection_map.iter() {
            let keep = match &query.filter {
                Some(filter) => DocumentEvaluator::new(document).evaluate(filter)?,
                None => true,
            };

            if keep {
                matched.push((id, document));
            }
        }

        // Stable, so ties keep insertion order
        if !query.sort.is_empty() {
            matched.sort_by(|(_, left), (_, right)| DocumentEvaluator::compare(left, right, &query.sort));
        }

        trace!(collection, matched = matched.len(), "queried documents");

        Ok(
            matched
                .into_iter()
                .skip(query.offset.unwrap_or(0))
                .take(query.limit.unwrap_or(usize::MAX))
                .map(|(id, document)| Snapshot::found(id.as_str(), document.clone()))
                .collect()
        )
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// ```ignore
/// use doclink_memory::InMemoryStore;
/// use doclink::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocLinkResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

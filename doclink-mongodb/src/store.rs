use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use tracing::trace;
use uuid::Uuid;

use doclink_core::{
    backend::{Snapshot, StoreBackend, StoreBackendBuilder},
    error::{DocLinkError, DocLinkResult},
    query::{Query, QueryVisitor},
};

use crate::query::MongoQueryTranslator;

/// MongoDB storage backend.
///
/// Documents are stored with a random UUID string as their `_id`, which is also the
/// identity the mapper sees. The `_id` field is stripped from returned data.
#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

fn backend_error(error: mongodb::error::Error) -> DocLinkError {
    DocLinkError::Backend(error.to_string())
}

/// Splits a stored document into its identity and its data.
fn restore_document(mut document: Document) -> DocLinkResult<Snapshot> {
    let id = match document.remove("_id") {
        Some(Bson::String(id)) => id,
        Some(Bson::ObjectId(id)) => id.to_hex(),
        Some(other) => other.to_string(),
        None => return Err(DocLinkError::Backend("Stored document has no _id".to_string())),
    };

    Ok(Snapshot::found(id, document))
}

/// Paging and ordering options for a query. Sizes past the server's range saturate.
fn find_options(query: &Query) -> FindOptions {
    let mut options = FindOptions::default();

    if let Some(limit) = query.limit {
        options.limit = Some(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if let Some(skip) = query.offset {
        options.skip = Some(u64::try_from(skip).unwrap_or(u64::MAX));
    }

    // Natural order is not guaranteed to be insertion order, so tie-break on _id
    let mut sort = MongoQueryTranslator::sort_document(&query.sort);
    if !sort.is_empty() {
        sort.insert("_id", 1);
        options.sort = Some(sort);
    }

    options
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, mut document: Document, collection: &str) -> DocLinkResult<String> {
        let id = Uuid::new_v4().to_string();
        document.insert("_id", id.clone());

        self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(backend_error)?;

        trace!(collection, id = %id, "inserted document");

        Ok(id)
    }

    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot> {
        match self
            .get_collection(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(backend_error)?
        {
            Some(document) => restore_document(document),
            None => Ok(Snapshot::missing(id)),
        }
    }

    async fn update_document(&self, id: &str, mut document: Document, collection: &str) -> DocLinkResult<()> {
        document.remove("_id");

        let result = self
            .get_collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": document })
            .await
            .map_err(backend_error)?;

        if result.matched_count == 0 {
            return Err(DocLinkError::DocumentNotFound(id.to_string(), collection.to_string()));
        }

        trace!(collection, id, "updated document");

        Ok(())
    }

    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()> {
        let result = self
            .get_collection(collection)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(backend_error)?;

        if result.deleted_count == 0 {
            return Err(DocLinkError::DocumentNotFound(id.to_string(), collection.to_string()));
        }

        trace!(collection, id, "deleted document");

        Ok(())
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        // The server reads a zero limit as no limit at all.
        if query.limit == Some(0) {
            return Ok(Vec::new());
        }

        let options = find_options(&query);

        let filter = match &query.filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
            None => doc! {},
        };

        trace!(collection, filter = %filter, "querying documents");

        self.get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)?
            .into_iter()
            .map(restore_document)
            .collect()
    }

    async fn shutdown(self) -> DocLinkResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocLinkResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocLinkError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocLinkError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

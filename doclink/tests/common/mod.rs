#![allow(dead_code)]

use async_trait::async_trait;
use bson::Document;
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use doclink::{memory::InMemoryStore, prelude::*};

pub struct User;

impl DocumentClass for User {
    fn class_name() -> &'static str {
        "User"
    }

    fn collection_name() -> &'static str {
        "users"
    }

    fn fields() -> &'static [&'static str] {
        &["name", "age", "tags"]
    }

    fn references() -> &'static [(&'static str, &'static str)] {
        &[("manager", "User"), ("team", "Team")]
    }
}

pub struct Team;

impl DocumentClass for Team {
    fn class_name() -> &'static str {
        "Team"
    }

    fn collection_name() -> &'static str {
        "teams"
    }

    fn fields() -> &'static [&'static str] {
        &["title"]
    }
}

pub fn gateway<B: StoreBackend>(backend: B) -> Gateway<B> {
    Gateway::builder(backend)
        .register::<User>()
        .unwrap()
        .register::<Team>()
        .unwrap()
        .build()
        .unwrap()
}

pub fn name<D: DocumentClass>(instance: &Instance<D>) -> String {
    instance
        .get_as::<String>("name")
        .unwrap()
        .unwrap()
}

pub fn names<D: DocumentClass>(instances: &[Instance<D>]) -> Vec<String> {
    instances.iter().map(name).collect()
}

/// Counts reads by identity.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: InMemoryStore,
    reads: Mutex<HashMap<String, usize>>,
}

impl CountingStore {
    pub fn reads_of(&self, id: &str) -> usize {
        self.reads
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().unwrap().values().sum()
    }

    pub fn reset(&self) {
        self.reads.lock().unwrap().clear();
    }
}

#[async_trait]
impl StoreBackend for CountingStore {
    async fn insert_document(&self, document: Document, collection: &str) -> DocLinkResult<String> {
        self.inner.insert_document(document, collection).await
    }

    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot> {
        *self
            .reads
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default() += 1;

        self.inner.get_document(id, collection).await
    }

    async fn update_document(&self, id: &str, document: Document, collection: &str) -> DocLinkResult<()> {
        self.inner.update_document(id, document, collection).await
    }

    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()> {
        self.inner.delete_document(id, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        self.inner.query_documents(query, collection).await
    }
}

/// Fails every read by identity once `fail_reads` is switched on.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: InMemoryStore,
    fail_reads: AtomicBool,
}

impl FailingStore {
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl StoreBackend for FailingStore {
    async fn insert_document(&self, document: Document, collection: &str) -> DocLinkResult<String> {
        self.inner.insert_document(document, collection).await
    }

    async fn get_document(&self, id: &str, collection: &str) -> DocLinkResult<Snapshot> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DocLinkError::Backend(format!("connection reset reading {id}")));
        }

        self.inner.get_document(id, collection).await
    }

    async fn update_document(&self, id: &str, document: Document, collection: &str) -> DocLinkResult<()> {
        self.inner.update_document(id, document, collection).await
    }

    async fn delete_document(&self, id: &str, collection: &str) -> DocLinkResult<()> {
        self.inner.delete_document(id, collection).await
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocLinkResult<Vec<Snapshot>> {
        self.inner.query_documents(query, collection).await
    }
}

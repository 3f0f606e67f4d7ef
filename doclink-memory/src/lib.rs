//! In-memory document storage backend for doclink.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development,
//! tests and small deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Insertion order** - Unsorted queries and listings return documents in the order they were inserted
//! - **Full query support** - Every `where` operator, multi-key sorting and offset/limit
//!
//! # Quick Start
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryStore};
//!
//! let gateway = Gateway::builder(InMemoryStore::builder().build().await?)
//!     .register::<User>()?
//!     .build()?;
//!
//! let alice = gateway.create::<User>(Fields::new().set("name", "Alice")).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as doclink_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};

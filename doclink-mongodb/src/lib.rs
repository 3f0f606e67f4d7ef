//! MongoDB backend implementation for doclink.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Filters, sorting and pagination are translated to MongoDB queries and run by the
//! server.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! doclink = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use doclink::{backend::StoreBackendBuilder, mongodb::MongoDbStore, prelude::*};
//!
//! let store = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!     .build()
//!     .await?;
//!
//! let gateway = Gateway::builder(store).register::<User>()?.build()?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as doclink_mongodb;

pub mod query;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};

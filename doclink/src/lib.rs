//! Main doclink crate: a lightweight object-document mapper.
//!
//! Entity types declare their plain fields and their reference fields (fields that
//! point at another document by identity). The [`Gateway`](gateway::Gateway) validates
//! writes against those declarations, reads documents back as records, and resolves
//! reference fields into the documents they point at, fetching each distinct target
//! once per query.
//!
//! # Features
//!
//! - **Declared schemas** - Unknown fields are rejected on write
//! - **Reference hydration** - Reference fields come back as the referenced records
//! - **Chainable queries** - `where`, ordering, pagination and preload, run lazily
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryStore};
//!
//! pub struct User;
//!
//! impl DocumentClass for User {
//!     fn class_name() -> &'static str { "User" }
//!     fn fields() -> &'static [&'static str] { &["name", "age"] }
//!     fn references() -> &'static [(&'static str, &'static str)] { &[("manager", "User")] }
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocLinkResult<()> {
//!     let gateway = Gateway::builder(InMemoryStore::builder().build().await?)
//!         .register::<User>()?
//!         .build()?;
//!
//!     let alice = gateway
//!         .create::<User>(Fields::new().set("name", "A").set("age", 41))
//!         .await?;
//!
//!     gateway
//!         .create::<User>(Fields::new().set("name", "B").reference("manager", &alice))
//!         .await?;
//!
//!     // Every user, with `manager` replaced by the manager's record
//!     let users = gateway.preload::<User, _, _>(["manager"]).get().await?;
//!
//!     // Adults only, oldest first, ten per page
//!     let adults = gateway
//!         .where_::<User>("age", WhereOp::Gte, 18)
//!         .order_by("age", SortDirection::Desc)
//!         .get_page(PaginationParams::new(1, 10))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Process-wide Gateway
//!
//! A gateway can be installed once for the whole process and fetched from anywhere:
//!
//! ```ignore
//! doclink::gateway::initialize(gateway)?;
//!
//! let user = doclink::gateway::global()?.find_by_id::<User>(&id).await?;
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - `mongodb` - Persistent MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use doclink_core::{
    backend, chain, document, error, fields, gateway, page, query, record, registry, snapshot,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use doclink_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use doclink_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}

//! A lightweight object-document mapper over document stores.
//!
//! This crate is the core of the doclink project and provides:
//!
//! - **Document contract** ([`document`]) - Declaring entity types, their fields and references
//! - **Class registry** ([`registry`]) - Runtime metadata keyed by class name
//! - **Records** ([`record`]) - Materialized documents, reference handles and typed instances
//! - **Write payloads** ([`fields`]) - Field assignments for create and update
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Snapshot translation** ([`snapshot`]) - Turning raw stored data into records
//! - **Query model** ([`query`]) - Filters, ordering and pagination handed to backends
//! - **Query chains** ([`chain`]) - Lazy filtered reads with reference hydration
//! - **Gateway** ([`gateway`]) - The entry point: create, find, query, preload
//! - **Error handling** ([`error`]) - Error and result types
//! - **Pagination** ([`page`]) - Page parameters and page results
//!
//! # Example
//!
//! ```ignore
//! use doclink::prelude::*;
//!
//! pub struct User;
//!
//! impl DocumentClass for User {
//!     fn class_name() -> &'static str {
//!         "User"
//!     }
//!
//!     fn fields() -> &'static [&'static str] {
//!         &["name", "age"]
//!     }
//!
//!     fn references() -> &'static [(&'static str, &'static str)] {
//!         &[("manager", "User")]
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as doclink_core;

pub mod backend;
pub mod chain;
pub mod document;
pub mod error;
pub mod fields;
pub mod gateway;
pub mod page;
pub mod query;
pub mod record;
pub mod registry;
pub mod snapshot;

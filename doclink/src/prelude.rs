//! Convenient re-exports of commonly used types from doclink.
//!
//! ```ignore
//! use doclink::prelude::*;
//! ```

pub use doclink_core::{
    backend::{Snapshot, StoreBackend, StoreBackendBuilder},
    chain::QueryChain,
    document::{ClassMetadata, DocumentClass},
    error::{DocLinkError, DocLinkResult},
    fields::{FieldValue, Fields},
    gateway::{Gateway, GatewayConfig},
    page::{Page, PaginationParams},
    query::{Expr, Filter, Query, SortDirection, WhereOp},
    record::{AsReference, Instance, Record, Reference, Value},
};

//! The single entry point of the mapper.
//!
//! A [`Gateway`] owns the backend handle and the class [`Registry`]. It validates writes,
//! runs single-document operations itself and hands filtered or preloading reads to a
//! [`QueryChain`].
//!
//! # Example
//!
//! ```ignore
//! use doclink::{prelude::*, memory::InMemoryStore};
//!
//! let gateway = Gateway::builder(InMemoryStore::new())
//!     .register::<User>()?
//!     .build()?;
//!
//! let alice = gateway.create::<User>(Fields::new().set("name", "A")).await?;
//! let bob = gateway
//!     .create::<User>(Fields::new().set("name", "B").reference("manager", &alice))
//!     .await?;
//!
//! let users = gateway.preload::<User, _, _>(["manager"]).get().await?;
//! ```
//!
//! A process-wide gateway can be installed once with [`initialize`] and fetched anywhere
//! with [`global`].

use bson::{Bson, Document};
use std::{collections::BTreeSet, sync::OnceLock};
use tracing::debug;

use crate::{
    backend::{self, StoreBackend},
    chain::QueryChain,
    document::{ClassMetadata, DocumentClass},
    error::{DocLinkError, DocLinkResult},
    fields::{FieldValue, Fields},
    query::{Expr, Query, WhereOp},
    record::{Instance, Record},
    registry::Registry,
    snapshot,
};

/// Tuning knobs for a [`Gateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    hydration_concurrency: usize,
    hydrate_references: bool,
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many reference fetches a query chain keeps in flight at once.
    ///
    /// Values below 1 are raised to 1.
    pub fn with_hydration_concurrency(mut self, concurrency: usize) -> Self {
        self.hydration_concurrency = concurrency.max(1);
        self
    }

    /// Sets whether query chains hydrate registered reference fields by default.
    pub fn with_hydrate_references(mut self, hydrate: bool) -> Self {
        self.hydrate_references = hydrate;
        self
    }

    pub fn hydration_concurrency(&self) -> usize {
        self.hydration_concurrency
    }

    pub fn hydrate_references(&self) -> bool {
        self.hydrate_references
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            hydration_concurrency: 16,
            hydrate_references: true,
        }
    }
}

#[derive(Debug)]
pub struct Gateway<B: StoreBackend> {
    backend: B,
    registry: Registry,
    config: GatewayConfig,
}

impl<B: StoreBackend> Gateway<B> {
    pub fn builder(backend: B) -> GatewayBuilder<B> {
        GatewayBuilder::new(backend)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Creates a document of class `D` and returns it as stored.
    ///
    /// Reference fields accept a reference to a document of the registered target class
    /// or a raw identity string; the identity is what gets stored.
    ///
    /// # Errors
    ///
    /// Returns [`DocLinkError::UnknownField`] for a field that is neither a plain nor a
    /// reference field of `D`, [`DocLinkError::InvalidReference`] for a reference field
    /// given something that cannot name a target, and any backend error unchanged.
    pub async fn create<D: DocumentClass>(&self, fields: Fields) -> DocLinkResult<Instance<D>> {
        let metadata = self.registry.metadata_of::<D>()?;
        let document = encode_fields(&metadata, fields)?;

        let id = self
            .backend
            .insert_document(document, metadata.storage_name())
            .await?;

        debug!(class = metadata.name(), id = %id, "created document");

        self.reload::<D>(&metadata, &id).await
    }

    /// Merges `fields` into an existing document and returns it as stored.
    ///
    /// Fields are validated exactly like [`Gateway::create`].
    ///
    /// # Errors
    ///
    /// Returns [`DocLinkError::DocumentNotFound`] if no document has this identity.
    pub async fn update<D: DocumentClass>(
        &self,
        id: &str,
        fields: Fields,
    ) -> DocLinkResult<Instance<D>> {
        let metadata = self.registry.metadata_of::<D>()?;
        let document = encode_fields(&metadata, fields)?;

        self.backend
            .update_document(id, document, metadata.storage_name())
            .await?;

        debug!(class = metadata.name(), id, "updated document");

        self.reload::<D>(&metadata, id).await
    }

    /// Deletes a document of class `D`.
    pub async fn delete<D: DocumentClass>(&self, id: &str) -> DocLinkResult<()> {
        let metadata = self.registry.metadata_of::<D>()?;

        self.backend
            .delete_document(id, metadata.storage_name())
            .await?;

        debug!(class = metadata.name(), id, "deleted document");

        Ok(())
    }

    /// Fetches one document by identity. Reference fields stay unhydrated.
    ///
    /// Returns `Ok(None)` if no such document exists.
    pub async fn find_by_id<D: DocumentClass>(&self, id: &str) -> DocLinkResult<Option<Instance<D>>> {
        let metadata = self.registry.metadata_of::<D>()?;
        let snapshot = self
            .backend
            .get_document(id, metadata.storage_name())
            .await?;

        Ok(snapshot::translate(&metadata, snapshot).map(Instance::from_record))
    }

    /// Starts a filtered query chain with a single comparison. Nothing runs until
    /// [`QueryChain::get`].
    pub fn where_<D: DocumentClass>(
        &self,
        field: impl Into<String>,
        op: WhereOp,
        value: impl Into<Bson>,
    ) -> QueryChain<'_, B, D> {
        let mut query = Query::new();
        query.push_filter(Expr::field(field, op, value));

        QueryChain::filtered(self, query)
    }

    /// Fetches every document of class `D`. Reference fields stay unhydrated.
    pub async fn all<D: DocumentClass>(&self) -> DocLinkResult<Vec<Instance<D>>> {
        let metadata = self.registry.metadata_of::<D>()?;
        let snapshots = self
            .backend
            .list_documents(metadata.storage_name())
            .await?;

        Ok(snapshot::translate_all(&metadata, snapshots)
            .into_iter()
            .map(Instance::from_record)
            .collect())
    }

    /// Starts a query chain over the whole collection that hydrates `fields`.
    ///
    /// Duplicate field names are collapsed.
    pub fn preload<D, I, S>(&self, fields: I) -> QueryChain<'_, B, D>
    where
        D: DocumentClass,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryChain::preload_only(
            self,
            fields
                .into_iter()
                .map(Into::into)
                .collect::<BTreeSet<String>>(),
        )
    }

    /// Fetches one document of the named class, translated but not hydrated.
    pub(crate) async fn find_record(&self, class: &str, id: &str) -> DocLinkResult<Option<Record>> {
        let metadata = self.registry.get(class)?;
        let snapshot = self
            .backend
            .get_document(id, metadata.storage_name())
            .await?;

        Ok(snapshot::translate(&metadata, snapshot))
    }

    async fn reload<D: DocumentClass>(
        &self,
        metadata: &ClassMetadata,
        id: &str,
    ) -> DocLinkResult<Instance<D>> {
        let snapshot = self
            .backend
            .get_document(id, metadata.storage_name())
            .await?;

        snapshot::translate(metadata, snapshot)
            .map(Instance::from_record)
            .ok_or_else(|| {
                DocLinkError::DocumentNotFound(id.to_string(), metadata.storage_name().to_string())
            })
    }

    /// Erases the backend type so the gateway can be stored process-wide.
    pub fn into_dyn(self) -> DynGateway
    where
        B: 'static,
    {
        Gateway {
            backend: Box::new(self.backend),
            registry: self.registry,
            config: self.config,
        }
    }

    /// Shuts down the gateway and releases backend resources.
    pub async fn shutdown(self) -> DocLinkResult<()> {
        self.backend.shutdown().await
    }
}

/// Builder for [`Gateway`]. Classes can only be registered here.
#[derive(Debug)]
pub struct GatewayBuilder<B: StoreBackend> {
    backend: B,
    registry: Registry,
    config: GatewayConfig,
}

impl<B: StoreBackend> GatewayBuilder<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            registry: Registry::new(),
            config: GatewayConfig::default(),
        }
    }

    /// Registers the document class `D`.
    ///
    /// # Errors
    ///
    /// Fails if the class name or its collection is already registered.
    pub fn register<D: DocumentClass>(mut self) -> DocLinkResult<Self> {
        self.registry.register::<D>()?;
        Ok(self)
    }

    /// Registers hand-built class metadata.
    pub fn register_metadata(mut self, metadata: ClassMetadata) -> DocLinkResult<Self> {
        self.registry
            .register_metadata(metadata)?;
        Ok(self)
    }

    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Finishes the gateway once every reference target is registered.
    ///
    /// # Errors
    ///
    /// Returns [`DocLinkError::UnregisteredReferenceTarget`] if a registered class
    /// references a class that was not registered.
    pub fn build(self) -> DocLinkResult<Gateway<B>> {
        self.registry.validate_references()?;

        Ok(Gateway {
            backend: self.backend,
            registry: self.registry,
            config: self.config,
        })
    }
}

/// A gateway over a type-erased backend.
pub type DynGateway = Gateway<Box<dyn backend::DynStoreBackend>>;

static GATEWAY: OnceLock<DynGateway> = OnceLock::new();

/// Installs the process-wide gateway.
///
/// # Errors
///
/// Returns [`DocLinkError::AlreadyInitialized`] if a gateway was installed before.
pub fn initialize<B: StoreBackend + 'static>(gateway: Gateway<B>) -> DocLinkResult<&'static DynGateway> {
    GATEWAY
        .set(gateway.into_dyn())
        .map_err(|_| DocLinkError::AlreadyInitialized)?;

    global()
}

/// Returns the process-wide gateway.
///
/// # Errors
///
/// Returns [`DocLinkError::NotInitialized`] if [`initialize`] has not been called.
pub fn global() -> DocLinkResult<&'static DynGateway> {
    GATEWAY
        .get()
        .ok_or(DocLinkError::NotInitialized)
}

fn encode_fields(metadata: &ClassMetadata, fields: Fields) -> DocLinkResult<Document> {
    // Unknown names win over bad values, wherever they sit in the payload.
    if let Some((field, _)) = fields
        .iter()
        .find(|(field, _)| !metadata.is_field(field) && !metadata.is_reference(field))
    {
        return Err(DocLinkError::UnknownField {
            class: metadata.name().to_string(),
            field: field.to_string(),
        });
    }

    fields
        .into_iter()
        .try_fold(Document::new(), |mut document, (field, value)| {
            let stored = match (metadata.reference_target(&field), value) {
                (Some(target), FieldValue::Reference(reference)) if reference.class() == target => {
                    Bson::String(reference.id().to_string())
                }
                (Some(_), FieldValue::Scalar(Bson::String(id))) => Bson::String(id),
                (Some(_), FieldValue::Scalar(Bson::Null)) => Bson::Null,
                (Some(_), _) => {
                    return Err(DocLinkError::InvalidReference {
                        class: metadata.name().to_string(),
                        field,
                    });
                }
                (None, FieldValue::Scalar(value)) if metadata.is_field(&field) => value,
                (None, FieldValue::Reference(reference)) if metadata.is_field(&field) => {
                    Bson::String(reference.id().to_string())
                }
                (None, _) => {
                    return Err(DocLinkError::UnknownField {
                        class: metadata.name().to_string(),
                        field,
                    });
                }
            };

            document.insert(field, stored);
            Ok(document)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Reference;

    fn user() -> ClassMetadata {
        ClassMetadata::builder("User")
            .fields(["name", "age"])
            .reference("manager", "User")
            .build()
    }

    #[test]
    fn encodes_scalars_and_reference_identities() {
        let document = encode_fields(
            &user(),
            Fields::new()
                .set("name", "B")
                .reference("manager", Reference::new("u1", "User")),
        )
        .unwrap();

        assert_eq!(document, bson::doc! { "name": "B", "manager": "u1" });
    }

    #[test]
    fn accepts_raw_identities_for_reference_fields() {
        let document = encode_fields(&user(), Fields::new().set("manager", "u1")).unwrap();

        assert_eq!(document, bson::doc! { "manager": "u1" });
    }

    #[test]
    fn rejects_unknown_fields_whatever_else_is_supplied() {
        let err = encode_fields(
            &user(),
            Fields::new()
                .set("name", "A")
                .set("email", "a@example.com")
                .set("age", 30),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DocLinkError::UnknownField { class, field } if class == "User" && field == "email"
        ));
    }

    #[test]
    fn unknown_field_is_reported_before_an_earlier_invalid_reference() {
        let err = encode_fields(
            &user(),
            Fields::new()
                .set("manager", 12)
                .set("email", "x"),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DocLinkError::UnknownField { field, .. } if field == "email"
        ));
    }

    #[test]
    fn rejects_references_to_the_wrong_class() {
        let err = encode_fields(
            &user(),
            Fields::new().reference("manager", Reference::new("t1", "Team")),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            DocLinkError::InvalidReference { field, .. } if field == "manager"
        ));

        assert!(encode_fields(&user(), Fields::new().set("manager", 12)).is_err());
    }

    #[test]
    fn config_clamps_concurrency() {
        let config = GatewayConfig::new()
            .with_hydration_concurrency(0)
            .with_hydrate_references(false);

        assert_eq!(config.hydration_concurrency(), 1);
        assert!(!config.hydrate_references());
    }
}

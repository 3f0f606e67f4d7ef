//! Lazy, chainable reads with reference hydration.
//!
//! A [`QueryChain`] accumulates filters, ordering, pagination and preload requests and
//! does nothing until [`QueryChain::get`] or [`QueryChain::get_page`] is awaited. Then it
//! runs one backend query, translates the snapshots and replaces reference handles with
//! the referenced records.
//!
//! Every distinct target is fetched once per execution, however many results point at
//! it. Fetches run concurrently, bounded by
//! [`GatewayConfig::hydration_concurrency`](crate::gateway::GatewayConfig::hydration_concurrency).
//! A target that no longer exists leaves its handle in place.

use bson::Bson;
use futures::{StreamExt, TryStreamExt, stream};
use std::{
    collections::{BTreeSet, HashMap},
    marker::PhantomData,
};
use tracing::debug;

use crate::{
    backend::StoreBackend,
    document::{ClassMetadata, DocumentClass},
    error::{DocLinkError, DocLinkResult},
    gateway::Gateway,
    page::{Page, PaginationParams},
    query::{Expr, Query, Sort, SortDirection, WhereOp},
    record::{Instance, Record, Reference},
    snapshot,
};

#[must_use = "query chains do nothing until `get` is awaited"]
pub struct QueryChain<'a, B: StoreBackend, D: DocumentClass> {
    gateway: &'a Gateway<B>,
    // None lists the whole collection.
    query: Option<Query>,
    preload: BTreeSet<String>,
    hydrate_references: bool,
    _marker: PhantomData<fn() -> D>,
}

impl<'a, B: StoreBackend, D: DocumentClass> QueryChain<'a, B, D> {
    pub(crate) fn filtered(gateway: &'a Gateway<B>, query: Query) -> Self {
        Self {
            gateway,
            query: Some(query),
            preload: BTreeSet::new(),
            hydrate_references: gateway.config().hydrate_references(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn preload_only(gateway: &'a Gateway<B>, preload: BTreeSet<String>) -> Self {
        Self {
            gateway,
            query: None,
            preload,
            hydrate_references: gateway.config().hydrate_references(),
            _marker: PhantomData,
        }
    }

    fn query_mut(&mut self) -> &mut Query {
        self.query.get_or_insert_with(Query::new)
    }

    /// Adds a comparison, AND-ed with every earlier one.
    pub fn where_(mut self, field: impl Into<String>, op: WhereOp, value: impl Into<Bson>) -> Self {
        self.query_mut()
            .push_filter(Expr::field(field, op, value));
        self
    }

    /// Appends a sort key. Earlier keys take precedence.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query_mut()
            .sort
            .push(Sort { field: field.into(), direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query_mut().limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.query_mut().offset = Some(offset);
        self
    }

    /// Restricts the chain to one page of results.
    ///
    /// Use [`QueryChain::get_page`] instead to also learn whether a next page exists.
    pub fn paginate(mut self, params: PaginationParams) -> Self {
        let query = self.query_mut();
        query.offset = Some(params.offset());
        query.limit = Some(params.per_page());
        self
    }

    /// Requests hydration of the given reference fields.
    pub fn preload<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preload
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Hydrates only explicitly preloaded fields.
    pub fn shallow(mut self) -> Self {
        self.hydrate_references = false;
        self
    }

    /// Returns the backend query this chain will run, or `None` when it lists the
    /// whole collection.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn preloaded_fields(&self) -> &BTreeSet<String> {
        &self.preload
    }

    /// Runs the chain.
    ///
    /// # Errors
    ///
    /// Returns [`DocLinkError::UnknownReference`] if a preloaded field is not a reference
    /// field of `D`. Backend errors from the query or from any reference fetch are
    /// returned unchanged.
    pub async fn get(self) -> DocLinkResult<Vec<Instance<D>>> {
        let (items, _) = self.execute(None).await?;
        Ok(items)
    }

    /// Runs the chain for one page, fetching one extra document to detect a next page.
    ///
    /// The extra document is dropped before hydration, so its references are never
    /// fetched.
    pub async fn get_page(mut self, params: PaginationParams) -> DocLinkResult<Page<Instance<D>>> {
        let query = self.query_mut();
        query.offset = Some(params.offset());
        query.limit = Some(params.per_page().saturating_add(1));

        let (items, has_next) = self.execute(Some(params.per_page())).await?;

        Ok(Page::new(items, &params, has_next))
    }

    /// Queries, keeps at most `keep` records, then hydrates them. Also reports whether
    /// any records were cut.
    async fn execute(self, keep: Option<usize>) -> DocLinkResult<(Vec<Instance<D>>, bool)> {
        let metadata = self.gateway.registry().metadata_of::<D>()?;
        let fields = self.hydration_fields(&metadata)?;

        let snapshots = match &self.query {
            Some(query) => {
                self.gateway
                    .backend()
                    .query_documents(query.clone(), metadata.storage_name())
                    .await?
            }
            None => {
                self.gateway
                    .backend()
                    .list_documents(metadata.storage_name())
                    .await?
            }
        };

        let mut records = snapshot::translate_all(&metadata, snapshots);
        let truncated = keep.is_some_and(|keep| records.len() > keep);

        if let Some(keep) = keep {
            records.truncate(keep);
        }

        self.hydrate(&fields, &mut records).await?;

        Ok((
            records
                .into_iter()
                .map(Instance::from_record)
                .collect(),
            truncated,
        ))
    }

    fn hydration_fields(&self, metadata: &ClassMetadata) -> DocLinkResult<BTreeSet<String>> {
        if let Some(field) = self
            .preload
            .iter()
            .find(|field| !metadata.is_reference(field))
        {
            return Err(DocLinkError::UnknownReference {
                class: metadata.name().to_string(),
                field: field.clone(),
            });
        }

        let mut fields = self.preload.clone();

        if self.hydrate_references {
            fields.extend(metadata.references().keys().cloned());
        }

        Ok(fields)
    }

    async fn hydrate(&self, fields: &BTreeSet<String>, records: &mut [Record]) -> DocLinkResult<()> {
        let targets = records
            .iter()
            .flat_map(|record| {
                fields
                    .iter()
                    .filter_map(move |field| record.reference_to(field))
            })
            .cloned()
            .collect::<BTreeSet<Reference>>();

        if targets.is_empty() {
            return Ok(());
        }

        let gateway = self.gateway;
        let requested = targets.len();

        let resolved = stream::iter(targets)
            .map(move |reference| async move {
                let record = gateway
                    .find_record(reference.class(), reference.id())
                    .await?;
                Ok::<_, DocLinkError>((reference, record))
            })
            .buffer_unordered(gateway.config().hydration_concurrency())
            .try_collect::<Vec<_>>()
            .await?
            .into_iter()
            .filter_map(|(reference, record)| record.map(|record| (reference, record)))
            .collect::<HashMap<Reference, Record>>();

        debug!(
            class = D::class_name(),
            fields = ?fields,
            targets = requested,
            missing = requested - resolved.len(),
            "hydrated references"
        );

        for record in records.iter_mut() {
            for field in fields {
                if let Some(target) = record
                    .reference_to(field)
                    .and_then(|reference| resolved.get(reference))
                    .cloned()
                {
                    record.set(field.as_str(), target);
                }
            }
        }

        Ok(())
    }
}

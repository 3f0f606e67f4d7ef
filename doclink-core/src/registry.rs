//! Process-wide class metadata, keyed by entity-type name.
//!
//! The registry is filled while a [`Gateway`](crate::gateway::Gateway) is being built and
//! is read-only afterwards. Registering a class name twice, or giving two classes the
//! same collection, is rejected.

use std::{collections::HashMap, sync::Arc};

use crate::{
    document::{ClassMetadata, DocumentClass},
    error::{DocLinkError, DocLinkResult},
};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    classes: HashMap<String, Arc<ClassMetadata>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the metadata declared by `D`.
    ///
    /// # Errors
    ///
    /// See [`Registry::register_metadata`].
    pub fn register<D: DocumentClass>(&mut self) -> DocLinkResult<()> {
        self.register_metadata(D::metadata())
    }

    /// Registers class metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DocLinkError::ClassAlreadyRegistered`] if the class name is taken and
    /// [`DocLinkError::StorageNameConflict`] if another class already uses the collection.
    pub fn register_metadata(&mut self, metadata: ClassMetadata) -> DocLinkResult<()> {
        if self.classes.contains_key(metadata.name()) {
            return Err(DocLinkError::ClassAlreadyRegistered(metadata.name().to_string()));
        }

        if let Some(existing) = self
            .classes
            .values()
            .find(|existing| existing.storage_name() == metadata.storage_name())
        {
            return Err(DocLinkError::StorageNameConflict {
                storage: metadata.storage_name().to_string(),
                class: existing.name().to_string(),
            });
        }

        self.classes
            .insert(metadata.name().to_string(), Arc::new(metadata));

        Ok(())
    }

    /// Looks up a class by name.
    ///
    /// # Errors
    ///
    /// Returns [`DocLinkError::ClassNotRegistered`] if the class is unknown.
    pub fn get(&self, name: &str) -> DocLinkResult<Arc<ClassMetadata>> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| DocLinkError::ClassNotRegistered(name.to_string()))
    }

    /// Looks up the metadata registered for `D`.
    pub fn metadata_of<D: DocumentClass>(&self) -> DocLinkResult<Arc<ClassMetadata>> {
        self.get(D::class_name())
    }

    /// Checks that every reference field points at a registered class.
    ///
    /// # Errors
    ///
    /// Returns [`DocLinkError::UnregisteredReferenceTarget`] for the first dangling
    /// target, in class-name then field-name order.
    pub fn validate_references(&self) -> DocLinkResult<()> {
        let mut classes = self.classes.values().collect::<Vec<_>>();
        classes.sort_by(|a, b| a.name().cmp(b.name()));

        for metadata in classes {
            if let Some((field, target)) = metadata
                .references()
                .iter()
                .find(|(_, target)| !self.classes.contains_key(target.as_str()))
            {
                return Err(DocLinkError::UnregisteredReferenceTarget {
                    class: metadata.name().to_string(),
                    field: field.clone(),
                    target: target.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

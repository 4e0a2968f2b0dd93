//! Explicit composition of a UDF's setup and forward routines.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::array::IoValue;
use crate::catalog::{CatalogStore, UdfIoCatalogEntry, generate_udf_catalog_entries};
use crate::errors::{Result, UdfIoError};
use crate::forward::ForwardWrapper;
use crate::setup::{SetupArgs, SetupTags, SetupWrapper};

/// A named UDF made up of a wrapped setup routine and a wrapped forward
/// routine over the receiver type `U`.
#[derive(Debug)]
pub struct UdfDefinition<U> {
    name: String,
    setup: SetupWrapper<U>,
    forward: ForwardWrapper<U>,
}

impl<U> UdfDefinition<U> {
    pub fn new(name: impl Into<String>, setup: SetupWrapper<U>, forward: ForwardWrapper<U>) -> Self {
        UdfDefinition {
            name: name.into(),
            setup,
            forward,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn setup(&self) -> &SetupWrapper<U> {
        &self.setup
    }

    pub fn forward(&self) -> &ForwardWrapper<U> {
        &self.forward
    }

    /// Catalog entries for the declared inputs followed by the declared
    /// outputs.
    pub fn catalog_entries(&self) -> Vec<UdfIoCatalogEntry> {
        let tags = self.forward.tags();
        generate_udf_catalog_entries(&tags.input, &tags.output)
    }

    /// Append this UDF's catalog entries to a store.
    pub fn register(&self, store: &dyn CatalogStore) -> Result<()> {
        debug!(name = %self.name, "registering udf catalog entries");
        store.add(self.catalog_entries())
    }

    /// Run setup once on `udf`, producing an instance ready for invocation.
    pub fn instantiate(self: &Arc<Self>, mut udf: U, args: &SetupArgs) -> Result<UdfInstance<U>> {
        debug!(name = %self.name, ?args, "instantiating udf");
        self.setup.call(&mut udf, args)?;
        Ok(UdfInstance {
            definition: self.clone(),
            udf,
        })
    }
}

/// A set up UDF.
///
/// Forward only borrows the instance, so a single instance may be invoked
/// from any number of threads at once when `U` is `Sync`.
#[derive(Debug)]
pub struct UdfInstance<U> {
    definition: Arc<UdfDefinition<U>>,
    udf: U,
}

impl<U> UdfInstance<U> {
    pub fn definition(&self) -> &UdfDefinition<U> {
        &self.definition
    }

    pub fn udf(&self) -> &U {
        &self.udf
    }

    pub fn forward(&self, args: Vec<IoValue>) -> Result<IoValue> {
        self.definition.forward.call(&self.udf, args)
    }
}

/// Metadata recorded for a registered UDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUdf {
    pub name: String,
    pub tags: SetupTags,
    pub entries: Vec<UdfIoCatalogEntry>,
}

/// Registry of UDFs by name.
///
/// Registration may happen while other threads are reading from the
/// registry.
#[derive(Debug, Default)]
pub struct UdfRegistry {
    udfs: RwLock<BTreeMap<String, RegisteredUdf>>,
}

impl UdfRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a UDF, appending its catalog entries to `store`.
    ///
    /// Errors if a UDF with the same name is already registered, in which
    /// case nothing is added to the store.
    pub fn register<U>(&self, def: &UdfDefinition<U>, store: &dyn CatalogStore) -> Result<()> {
        let mut udfs = self.udfs.write();
        if udfs.contains_key(def.name()) {
            return Err(UdfIoError::DuplicateUdf(def.name().to_string()));
        }

        let entries = def.catalog_entries();
        store.add(entries.clone())?;

        debug!(name = %def.name(), entries = entries.len(), "registered udf");
        udfs.insert(
            def.name().to_string(),
            RegisteredUdf {
                name: def.name().to_string(),
                tags: def.setup().tags().clone(),
                entries,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<RegisteredUdf> {
        self.udfs.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.udfs.read().contains_key(name)
    }

    /// Names of all registered UDFs in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.udfs.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.udfs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.udfs.read().is_empty()
    }
}

//! Catalog metadata for UDF inputs and outputs.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::datatype::{ArrayElementType, Dimensions, LogicalType};
use crate::descriptor::{ArgumentDescriptor, IoArgument};
use crate::errors::Result;

/// Catalog record describing a single UDF input or output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdfIoCatalogEntry {
    pub name: String,
    pub logical_type: LogicalType,
    pub is_nullable: bool,
    pub element_type: ArrayElementType,
    pub dimensions: Dimensions,
    pub is_input: bool,
}

/// Generate catalog entries for all inputs followed by all outputs.
pub fn generate_udf_catalog_entries(
    inputs: &[ArgumentDescriptor],
    outputs: &[ArgumentDescriptor],
) -> Vec<UdfIoCatalogEntry> {
    let entries: Vec<_> = inputs
        .iter()
        .flat_map(|arg| arg.generate_catalog_entries(true))
        .chain(
            outputs
                .iter()
                .flat_map(|arg| arg.generate_catalog_entries(false)),
        )
        .collect();
    debug!(
        inputs = inputs.len(),
        outputs = outputs.len(),
        entries = entries.len(),
        "generated udf catalog entries"
    );
    entries
}

/// Append-only store for catalog entries.
pub trait CatalogStore: Sync + Send {
    fn add(&self, entries: Vec<UdfIoCatalogEntry>) -> Result<()>;
}

/// Catalog store holding entries in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    entries: RwLock<Vec<UdfIoCatalogEntry>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries added so far.
    pub fn entries(&self) -> Vec<UdfIoCatalogEntry> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn add(&self, entries: Vec<UdfIoCatalogEntry>) -> Result<()> {
        debug!(count = entries.len(), "adding catalog entries");
        self.entries.write().extend(entries);
        Ok(())
    }
}

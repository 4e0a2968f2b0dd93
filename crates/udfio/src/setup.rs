//! Wrapping of a UDF's one time setup routine.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Keyword arguments passed to a UDF's setup routine.
pub type SetupArgs = BTreeMap<String, serde_json::Value>;

type SetupFn<U> = dyn Fn(&mut U, &SetupArgs) -> Result<()> + Send + Sync;

/// Metadata describing how the engine may schedule a UDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupTags {
    /// Whether results for identical inputs may be cached.
    pub cachable: bool,
    /// Free form category of the UDF.
    pub udf_type: String,
    /// Whether the UDF accepts batched inputs.
    pub batchable: bool,
}

impl Default for SetupTags {
    fn default() -> Self {
        SetupTags {
            cachable: false,
            udf_type: "Abstract".to_string(),
            batchable: true,
        }
    }
}

/// A setup routine along with its scheduling tags.
///
/// The routine is never validated or altered, calling the wrapper is
/// identical to calling the routine.
pub struct SetupWrapper<U> {
    func: Box<SetupFn<U>>,
    tags: SetupTags,
}

impl<U> SetupWrapper<U> {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut U, &SetupArgs) -> Result<()> + Send + Sync + 'static,
    {
        SetupWrapper {
            func: Box::new(func),
            tags: SetupTags::default(),
        }
    }

    /// Wrapper around a routine that does nothing.
    pub fn noop() -> Self {
        Self::new(|_, _| Ok(()))
    }

    pub fn with_tags(mut self, tags: SetupTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn cachable(mut self, cachable: bool) -> Self {
        self.tags.cachable = cachable;
        self
    }

    pub fn udf_type(mut self, udf_type: impl Into<String>) -> Self {
        self.tags.udf_type = udf_type.into();
        self
    }

    pub fn batchable(mut self, batchable: bool) -> Self {
        self.tags.batchable = batchable;
        self
    }

    pub fn tags(&self) -> &SetupTags {
        &self.tags
    }

    pub fn call(&self, udf: &mut U, args: &SetupArgs) -> Result<()> {
        (self.func)(udf, args)
    }
}

impl<U> fmt::Debug for SetupWrapper<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupWrapper")
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

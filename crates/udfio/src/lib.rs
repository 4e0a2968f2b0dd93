//! Input and output contracts for user defined functions.
//!
//! A UDF declares its arguments with descriptors ([`ArrayArgument`],
//! [`TableArgument`]). Descriptors produce catalog entries at registration
//! time, and at invocation time coerce raw values into the declared element
//! type and shape. [`SetupWrapper`] and [`ForwardWrapper`] attach this
//! metadata to a UDF's setup and forward routines, and [`UdfDefinition`]
//! composes the two.

pub mod array;
pub mod catalog;
pub mod datatype;
pub mod descriptor;
pub mod errors;
pub mod forward;
pub mod setup;
pub mod udf;

pub use array::{ArrayBackend, ArrowTensor, HostArray, HostBuffer, IoValue, NestedValue};
pub use catalog::{
    CatalogStore,
    MemoryCatalogStore,
    UdfIoCatalogEntry,
    generate_udf_catalog_entries,
};
pub use datatype::{ArrayElementType, Dim, Dimensions, LogicalType};
pub use descriptor::{ArgumentDescriptor, ArrayArgument, IoArgument, TableArgument};
pub use errors::{Direction, Result, UdfIoError, UdfIoErrorKind};
pub use forward::{ArityPolicy, ForwardConfig, ForwardTags, ForwardWrapper};
pub use setup::{SetupArgs, SetupTags, SetupWrapper};
pub use udf::{RegisteredUdf, UdfDefinition, UdfInstance, UdfRegistry};

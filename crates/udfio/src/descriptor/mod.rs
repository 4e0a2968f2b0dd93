//! Declarative descriptions of UDF arguments.

mod array;
mod table;

pub use array::ArrayArgument;
pub use table::TableArgument;

use crate::array::IoValue;
use crate::catalog::UdfIoCatalogEntry;
use crate::errors::Result;

/// Capabilities shared by every argument descriptor.
pub trait IoArgument {
    /// Produce the catalog entries describing this argument.
    fn generate_catalog_entries(&self, is_input: bool) -> Vec<UdfIoCatalogEntry>;

    /// Convert the value to the descriptor's representation and element type.
    fn check_array_and_convert_type(&self, value: IoValue) -> Result<IoValue>;

    /// Convert the value to the descriptor's shape.
    fn check_array_and_convert_shape(&self, value: IoValue) -> Result<IoValue>;

    /// Validate a value against this descriptor, returning the coerced value.
    ///
    /// Element type is coerced before shape.
    fn validate_object(&self, value: IoValue, _is_input: bool) -> Result<IoValue> {
        let value = self.check_array_and_convert_type(value)?;
        self.check_array_and_convert_shape(value)
    }
}

/// Any argument descriptor that can be attached to a UDF.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentDescriptor {
    Array(ArrayArgument),
    Table(TableArgument),
}

impl ArgumentDescriptor {
    /// Name used when reporting on this descriptor.
    pub fn display_name(&self) -> String {
        match self {
            Self::Array(arg) => arg.name().to_string(),
            Self::Table(table) => format!("table({})", table.columns().join(", ")),
        }
    }
}

impl IoArgument for ArgumentDescriptor {
    fn generate_catalog_entries(&self, is_input: bool) -> Vec<UdfIoCatalogEntry> {
        match self {
            Self::Array(arg) => arg.generate_catalog_entries(is_input),
            Self::Table(table) => table.generate_catalog_entries(is_input),
        }
    }

    fn check_array_and_convert_type(&self, value: IoValue) -> Result<IoValue> {
        match self {
            Self::Array(arg) => arg.check_array_and_convert_type(value),
            Self::Table(table) => table.check_array_and_convert_type(value),
        }
    }

    fn check_array_and_convert_shape(&self, value: IoValue) -> Result<IoValue> {
        match self {
            Self::Array(arg) => arg.check_array_and_convert_shape(value),
            Self::Table(table) => table.check_array_and_convert_shape(value),
        }
    }

    fn validate_object(&self, value: IoValue, is_input: bool) -> Result<IoValue> {
        match self {
            Self::Array(arg) => arg.validate_object(value, is_input),
            Self::Table(table) => table.validate_object(value, is_input),
        }
    }
}

impl From<ArrayArgument> for ArgumentDescriptor {
    fn from(value: ArrayArgument) -> Self {
        ArgumentDescriptor::Array(value)
    }
}

impl From<TableArgument> for ArgumentDescriptor {
    fn from(value: TableArgument) -> Self {
        ArgumentDescriptor::Table(value)
    }
}

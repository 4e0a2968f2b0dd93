//! Runtime values handed to and returned from UDFs, and the backends that
//! coerce them into a canonical array representation.
//!
//! Two array ecosystems are supported. The host backend uses [`HostArray`], a
//! typed contiguous buffer with a shape. The arrow backend uses
//! [`ArrowTensor`], a flat arrow primitive array with a shape. Either backend
//! accepts the other's native representation as well as arbitrarily nested
//! sequences ([`NestedValue`]).

pub mod host;
pub mod nested;
pub mod tensor;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

pub use self::host::{HostArray, HostBuffer, HostNative};
pub use self::nested::NestedValue;
pub use self::tensor::ArrowTensor;
use crate::datatype::{ArrayElementType, Dim, Dimensions};
use crate::errors::{Result, UdfIoError};

/// A value passed into or returned from a UDF.
#[derive(Debug, Clone)]
pub enum IoValue {
    Host(HostArray),
    Arrow(ArrowTensor),
    Nested(NestedValue),
    Table(RecordBatch),
    Utf8(String),
    /// Some value the engine doesn't know how to interpret.
    Opaque(Arc<dyn Any + Send + Sync>),
    /// Ordered sequence of values, used for UDFs with multiple outputs.
    Tuple(Vec<IoValue>),
}

impl IoValue {
    /// Human readable name of the representation, used in error messages.
    pub const fn representation_name(&self) -> &'static str {
        match self {
            Self::Host(_) => "host array",
            Self::Arrow(_) => "arrow tensor",
            Self::Nested(_) => "nested sequence",
            Self::Table(_) => "table",
            Self::Utf8(_) => "string",
            Self::Opaque(_) => "opaque value",
            Self::Tuple(_) => "tuple",
        }
    }

    /// Shape of the value if it's an array of some kind.
    ///
    /// Nested sequences report `None` since their shape is only known after
    /// conversion.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Self::Host(arr) => Some(arr.shape()),
            Self::Arrow(tensor) => Some(tensor.shape()),
            _ => None,
        }
    }

    /// Element type of the value if it's a typed array.
    pub fn element_type(&self) -> Option<ArrayElementType> {
        match self {
            Self::Host(arr) => Some(arr.element_type()),
            Self::Arrow(tensor) => Some(tensor.element_type()),
            _ => None,
        }
    }

    pub fn try_into_host(self) -> Result<HostArray> {
        HostArray::try_from_value(self)
    }

    pub fn try_into_arrow(self) -> Result<ArrowTensor> {
        ArrowTensor::try_from_value(self)
    }

    pub fn try_into_tuple(self) -> Result<Vec<IoValue>> {
        match self {
            Self::Tuple(vals) => Ok(vals),
            other => Err(UdfIoError::unsupported(
                "tuple",
                other.representation_name(),
            )),
        }
    }
}

impl PartialEq for IoValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Host(a), Self::Host(b)) => a == b,
            (Self::Arrow(a), Self::Arrow(b)) => a == b,
            (Self::Nested(a), Self::Nested(b)) => a == b,
            (Self::Table(a), Self::Table(b)) => a == b,
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            _ => false,
        }
    }
}

impl From<HostArray> for IoValue {
    fn from(value: HostArray) -> Self {
        IoValue::Host(value)
    }
}

impl From<ArrowTensor> for IoValue {
    fn from(value: ArrowTensor) -> Self {
        IoValue::Arrow(value)
    }
}

impl From<NestedValue> for IoValue {
    fn from(value: NestedValue) -> Self {
        IoValue::Nested(value)
    }
}

impl From<RecordBatch> for IoValue {
    fn from(value: RecordBatch) -> Self {
        IoValue::Table(value)
    }
}

/// Array ecosystem a descriptor coerces values into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayBackend {
    #[default]
    Host,
    Arrow,
}

impl ArrayBackend {
    pub const fn target_name(&self) -> &'static str {
        match self {
            Self::Host => "host array",
            Self::Arrow => "arrow tensor",
        }
    }

    /// Convert a value into this backend's native representation without
    /// changing its element type or shape.
    pub fn to_native(&self, value: IoValue) -> Result<IoValue> {
        Ok(match self {
            Self::Host => IoValue::Host(HostArray::try_from_value(value)?),
            Self::Arrow => IoValue::Arrow(ArrowTensor::try_from_value(value)?),
        })
    }

    /// Convert a value into this backend's native representation and cast its
    /// elements to `element_type`.
    pub fn convert_type(&self, value: IoValue, element_type: ArrayElementType) -> Result<IoValue> {
        Ok(match self {
            Self::Host => IoValue::Host(HostArray::try_from_value(value)?.cast(element_type)?),
            Self::Arrow => IoValue::Arrow(ArrowTensor::try_from_value(value)?.cast(element_type)?),
        })
    }

    /// Convert a value into this backend's native representation and reshape
    /// it to `dims`.
    pub fn convert_shape(&self, value: IoValue, dims: &[Dim]) -> Result<IoValue> {
        Ok(match self {
            Self::Host => IoValue::Host(HostArray::try_from_value(value)?.reshape(dims)?),
            Self::Arrow => IoValue::Arrow(ArrowTensor::try_from_value(value)?.reshape(dims)?),
        })
    }
}

impl fmt::Display for ArrayBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_name())
    }
}

/// Number of elements held by an array of the given shape, `None` on
/// overflow.
pub(crate) fn checked_len(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &n| acc.checked_mul(n))
}

/// Compute the concrete shape for reshaping an array with shape `current` to
/// the declared `dims`.
///
/// A single wildcard axis is inferred from the element count. With more than
/// one wildcard axis nothing can be inferred, so the current shape is kept if
/// it has the same number of axes and agrees on every fixed axis.
pub(crate) fn resolve_shape(dims: &[Dim], current: &[usize]) -> Result<Vec<usize>> {
    let mismatch = |reason: String| UdfIoError::ShapeMismatch {
        expected: Dimensions::Axes(dims.to_vec()),
        actual: current.to_vec(),
        reason,
    };
    let len = checked_len(current).ok_or_else(|| mismatch("array shape overflows".to_string()))?;

    let wildcards = dims.iter().filter(|d| matches!(d, Dim::Any)).count();
    let fixed_product = dims
        .iter()
        .filter_map(Dim::fixed)
        .try_fold(1usize, |acc, n| acc.checked_mul(n))
        .ok_or_else(|| mismatch("requested shape overflows".to_string()))?;

    match wildcards {
        0 => {
            if fixed_product != len {
                return Err(mismatch(format!(
                    "cannot reshape array of size {len} into shape {}",
                    Dimensions::Axes(dims.to_vec())
                )));
            }
            Ok(dims.iter().filter_map(Dim::fixed).collect())
        }
        1 => {
            if fixed_product == 0 || len % fixed_product != 0 {
                return Err(mismatch(format!(
                    "cannot reshape array of size {len} into shape {}",
                    Dimensions::Axes(dims.to_vec())
                )));
            }
            let inferred = len / fixed_product;
            Ok(dims
                .iter()
                .map(|d| d.fixed().unwrap_or(inferred))
                .collect())
        }
        _ => {
            if dims.len() != current.len() {
                return Err(mismatch(format!(
                    "expected {} axes, array has {}",
                    dims.len(),
                    current.len()
                )));
            }
            for (axis, (dim, have)) in dims.iter().zip(current).enumerate() {
                if let Dim::Fixed(want) = dim {
                    if want != have {
                        return Err(mismatch(format!(
                            "axis {axis} has length {have}, expected {want}"
                        )));
                    }
                }
            }
            Ok(current.to_vec())
        }
    }
}

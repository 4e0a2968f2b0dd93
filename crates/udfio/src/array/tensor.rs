use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, PrimitiveArray};
use arrow::datatypes::{
    ArrowPrimitiveType,
    DataType,
    Float32Type,
    Float64Type,
    Int8Type,
    Int16Type,
    Int32Type,
    Int64Type,
};
use num_traits::AsPrimitive;
use tracing::trace;

use super::host::{HostArray, HostBuffer};
use super::{IoValue, checked_len, resolve_shape};
use crate::datatype::{ArrayElementType, Dim, Dimensions};
use crate::errors::{Result, UdfIoError};

/// An n-dimensional array backed by a flat arrow primitive array.
///
/// Values are stored in row-major order. Nulls are permitted in the
/// underlying array but prevent conversion to a [`HostArray`].
#[derive(Debug, Clone)]
pub struct ArrowTensor {
    shape: Vec<usize>,
    element_type: ArrayElementType,
    values: ArrayRef,
}

impl PartialEq for ArrowTensor {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape
            && self.element_type == other.element_type
            && self.values.as_ref() == other.values.as_ref()
    }
}

fn element_type_for(datatype: &DataType) -> Option<ArrayElementType> {
    Some(match datatype {
        DataType::Int8 => ArrayElementType::Int8,
        DataType::Int16 => ArrayElementType::Int16,
        DataType::Int32 => ArrayElementType::Int32,
        DataType::Int64 => ArrayElementType::Int64,
        DataType::Float32 => ArrayElementType::Float32,
        DataType::Float64 => ArrayElementType::Float64,
        _ => return None,
    })
}

fn cast_primitive<I, O>(arr: &PrimitiveArray<I>) -> ArrayRef
where
    I: ArrowPrimitiveType,
    O: ArrowPrimitiveType,
    I::Native: AsPrimitive<O::Native>,
{
    Arc::new(arr.unary::<_, O>(|v| v.as_()))
}

macro_rules! cast_from {
    ($values:expr, $src:ty, $to:expr) => {{
        let arr = $values.as_primitive::<$src>();
        match $to {
            ArrayElementType::Int8 => cast_primitive::<$src, Int8Type>(arr),
            ArrayElementType::Int16 => cast_primitive::<$src, Int16Type>(arr),
            ArrayElementType::Int32 => cast_primitive::<$src, Int32Type>(arr),
            ArrayElementType::Int64 => cast_primitive::<$src, Int64Type>(arr),
            ArrayElementType::Float32 => cast_primitive::<$src, Float32Type>(arr),
            ArrayElementType::Float64 => cast_primitive::<$src, Float64Type>(arr),
            ArrayElementType::Any => return Err(UdfIoError::UnknownElementType($to)),
        }
    }};
}

impl ArrowTensor {
    /// Create a new tensor from a flat arrow array.
    ///
    /// Errors if the array isn't one of the supported numeric types, or if the
    /// shape doesn't cover every value.
    pub fn try_new(shape: Vec<usize>, values: ArrayRef) -> Result<Self> {
        let element_type = element_type_for(values.data_type()).ok_or_else(|| {
            UdfIoError::unsupported(
                "arrow tensor",
                format!("arrow array of type {}", values.data_type()),
            )
        })?;

        let mismatch = |reason: String| UdfIoError::ShapeMismatch {
            expected: Dimensions::fixed(shape.iter().copied()),
            actual: vec![values.len()],
            reason,
        };
        let len = checked_len(&shape).ok_or_else(|| mismatch("shape overflows".to_string()))?;
        if len != values.len() {
            return Err(mismatch(format!(
                "shape holds {len} elements, array has {}",
                values.len()
            )));
        }

        Ok(ArrowTensor {
            shape,
            element_type,
            values,
        })
    }

    /// Create a one dimensional tensor.
    pub fn try_from_array(values: ArrayRef) -> Result<Self> {
        Self::try_new(vec![values.len()], values)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub const fn element_type(&self) -> ArrayElementType {
        self.element_type
    }

    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// Reshape to the given dimensions, keeping element order.
    pub fn reshape(self, dims: &[Dim]) -> Result<Self> {
        let shape = resolve_shape(dims, &self.shape)?;
        trace!(from = ?self.shape, to = ?shape, "reshaping arrow tensor");
        Ok(ArrowTensor {
            shape,
            element_type: self.element_type,
            values: self.values,
        })
    }

    /// Cast elements to a different type, keeping the shape.
    ///
    /// Uses the same `as` semantics as host arrays so both backends produce
    /// identical values. Nulls are preserved.
    pub fn cast(self, to: ArrayElementType) -> Result<Self> {
        if self.element_type == to {
            return Ok(self);
        }
        trace!(from = %self.element_type, %to, "casting arrow tensor");

        let values = match self.values.data_type() {
            DataType::Int8 => cast_from!(self.values, Int8Type, to),
            DataType::Int16 => cast_from!(self.values, Int16Type, to),
            DataType::Int32 => cast_from!(self.values, Int32Type, to),
            DataType::Int64 => cast_from!(self.values, Int64Type, to),
            DataType::Float32 => cast_from!(self.values, Float32Type, to),
            DataType::Float64 => cast_from!(self.values, Float64Type, to),
            other => {
                return Err(UdfIoError::unsupported(
                    "arrow tensor",
                    format!("arrow array of type {other}"),
                ));
            }
        };

        Ok(ArrowTensor {
            shape: self.shape,
            element_type: to,
            values,
        })
    }

    /// Copy a host array into a new tensor.
    pub fn from_host(arr: &HostArray) -> Self {
        let values: ArrayRef = match arr.buffer() {
            HostBuffer::Int8(v) => Arc::new(PrimitiveArray::<Int8Type>::from(v.clone())),
            HostBuffer::Int16(v) => Arc::new(PrimitiveArray::<Int16Type>::from(v.clone())),
            HostBuffer::Int32(v) => Arc::new(PrimitiveArray::<Int32Type>::from(v.clone())),
            HostBuffer::Int64(v) => Arc::new(PrimitiveArray::<Int64Type>::from(v.clone())),
            HostBuffer::Float32(v) => Arc::new(PrimitiveArray::<Float32Type>::from(v.clone())),
            HostBuffer::Float64(v) => Arc::new(PrimitiveArray::<Float64Type>::from(v.clone())),
        };

        ArrowTensor {
            shape: arr.shape().to_vec(),
            element_type: arr.element_type(),
            values,
        }
    }

    /// Copy into a host array.
    ///
    /// Errors if the tensor contains nulls since host arrays have no validity.
    pub fn to_host(&self) -> Result<HostArray> {
        if self.values.null_count() > 0 {
            return Err(UdfIoError::unsupported(
                "host array",
                format!(
                    "arrow tensor containing {} nulls",
                    self.values.null_count()
                ),
            ));
        }

        let buffer = match self.element_type {
            ArrayElementType::Int8 => {
                HostBuffer::Int8(self.values.as_primitive::<Int8Type>().values().to_vec())
            }
            ArrayElementType::Int16 => {
                HostBuffer::Int16(self.values.as_primitive::<Int16Type>().values().to_vec())
            }
            ArrayElementType::Int32 => {
                HostBuffer::Int32(self.values.as_primitive::<Int32Type>().values().to_vec())
            }
            ArrayElementType::Int64 => {
                HostBuffer::Int64(self.values.as_primitive::<Int64Type>().values().to_vec())
            }
            ArrayElementType::Float32 => {
                HostBuffer::Float32(self.values.as_primitive::<Float32Type>().values().to_vec())
            }
            ArrayElementType::Float64 => {
                HostBuffer::Float64(self.values.as_primitive::<Float64Type>().values().to_vec())
            }
            // Never constructed with `Any`.
            ArrayElementType::Any => return Err(UdfIoError::UnknownElementType(self.element_type)),
        };

        HostArray::try_new(self.shape.clone(), buffer)
    }

    /// Convert any supported representation into an arrow tensor.
    pub fn try_from_value(value: IoValue) -> Result<Self> {
        match value {
            IoValue::Arrow(tensor) => Ok(tensor),
            IoValue::Host(arr) => Ok(Self::from_host(&arr)),
            IoValue::Nested(nested) => Ok(Self::from_host(&HostArray::try_from_nested(nested)?)),
            other @ (IoValue::Table(_)
            | IoValue::Utf8(_)
            | IoValue::Opaque(_)
            | IoValue::Tuple(_)) => Err(UdfIoError::unsupported(
                "arrow tensor",
                other.representation_name(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{Float32Array, Int8Array, Int32Array, StringArray};

    use super::*;
    use crate::errors::UdfIoErrorKind;

    #[test]
    fn try_new_rejects_non_numeric() {
        let values: ArrayRef = Arc::new(StringArray::from(vec!["a", "b"]));
        let err = ArrowTensor::try_from_array(values).unwrap_err();
        assert_eq!(UdfIoErrorKind::UnsupportedRepresentation, err.kind());
    }

    #[test]
    fn try_new_checks_element_count() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let err = ArrowTensor::try_new(vec![2, 2], values).unwrap_err();
        assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());
    }

    #[test]
    fn try_new_rejects_overflowing_shape() {
        let values: ArrayRef = Arc::new(Int8Array::from(Vec::<i8>::new()));
        let err = ArrowTensor::try_new(vec![usize::MAX, 2], values.clone()).unwrap_err();
        assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());

        let err = ArrowTensor::try_new(vec![usize::MAX / 2 + 1, 2], values).unwrap_err();
        assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());
    }

    #[test]
    fn equality_compares_values() {
        let a: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3, 4]));
        let b: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3, 4]));
        let a = ArrowTensor::try_from_array(a).unwrap();
        let b = ArrowTensor::try_from_array(b).unwrap();
        assert_eq!(a, b);

        let reshaped = b.clone().reshape(&[Dim::Fixed(2), Dim::Fixed(2)]).unwrap();
        assert_ne!(a, reshaped);

        let other: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3, 5]));
        assert_ne!(a, ArrowTensor::try_from_array(other).unwrap());
    }

    #[test]
    fn cast_int_to_float() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let tensor = ArrowTensor::try_from_array(values)
            .unwrap()
            .cast(ArrayElementType::Float32)
            .unwrap();

        assert_eq!(ArrayElementType::Float32, tensor.element_type());
        assert_eq!(&DataType::Float32, tensor.values().data_type());
        let expected: ArrayRef = Arc::new(Float32Array::from(vec![1.0, 2.0, 3.0]));
        assert_eq!(&expected, tensor.values());
    }

    #[test]
    fn cast_preserves_nulls() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None, Some(3)]));
        let tensor = ArrowTensor::try_from_array(values)
            .unwrap()
            .cast(ArrayElementType::Int64)
            .unwrap();
        assert_eq!(1, tensor.values().null_count());
    }

    #[test]
    fn host_round_trip() {
        let host = HostArray::from_vec(vec![1.5_f64, 2.5, 3.5, 4.5])
            .reshape(&[Dim::Fixed(2), Dim::Fixed(2)])
            .unwrap();
        let tensor = host.to_arrow();
        assert_eq!(&[2, 2], tensor.shape());

        let back = tensor.to_host().unwrap();
        assert_eq!(host, back);
    }

    #[test]
    fn nulls_cannot_become_host() {
        let values: ArrayRef = Arc::new(Int32Array::from(vec![Some(1), None]));
        let tensor = ArrowTensor::try_from_array(values).unwrap();
        let err = tensor.to_host().unwrap_err();
        assert_eq!(UdfIoErrorKind::UnsupportedRepresentation, err.kind());
    }
}

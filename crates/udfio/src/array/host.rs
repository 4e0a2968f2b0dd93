use num_traits::AsPrimitive;
use tracing::trace;

use super::nested::{NestedLeaves, NestedValue};
use super::{ArrowTensor, IoValue, checked_len, resolve_shape};
use crate::datatype::{ArrayElementType, Dim, Dimensions};
use crate::errors::{Result, UdfIoError};

/// Typed contiguous storage for a host array.
#[derive(Debug, Clone, PartialEq)]
pub enum HostBuffer {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Cast every value in a slice using `as` semantics.
///
/// Float to int conversions truncate toward zero and saturate, int to int
/// conversions wrap.
fn cast_primitive<A, B>(vals: &[A]) -> Vec<B>
where
    A: AsPrimitive<B>,
    B: Copy + 'static,
{
    vals.iter().map(|v| v.as_()).collect()
}

macro_rules! cast_to {
    ($vals:expr, $to:expr) => {
        match $to {
            ArrayElementType::Int8 => HostBuffer::Int8(cast_primitive($vals)),
            ArrayElementType::Int16 => HostBuffer::Int16(cast_primitive($vals)),
            ArrayElementType::Int32 => HostBuffer::Int32(cast_primitive($vals)),
            ArrayElementType::Int64 => HostBuffer::Int64(cast_primitive($vals)),
            ArrayElementType::Float32 => HostBuffer::Float32(cast_primitive($vals)),
            ArrayElementType::Float64 => HostBuffer::Float64(cast_primitive($vals)),
            ArrayElementType::Any => return Err(UdfIoError::UnknownElementType($to)),
        }
    };
}

impl HostBuffer {
    pub fn len(&self) -> usize {
        match self {
            Self::Int8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn element_type(&self) -> ArrayElementType {
        match self {
            Self::Int8(_) => ArrayElementType::Int8,
            Self::Int16(_) => ArrayElementType::Int16,
            Self::Int32(_) => ArrayElementType::Int32,
            Self::Int64(_) => ArrayElementType::Int64,
            Self::Float32(_) => ArrayElementType::Float32,
            Self::Float64(_) => ArrayElementType::Float64,
        }
    }

    /// Cast to a new buffer with the given element type.
    pub fn cast(&self, to: ArrayElementType) -> Result<HostBuffer> {
        Ok(match self {
            Self::Int8(v) => cast_to!(v, to),
            Self::Int16(v) => cast_to!(v, to),
            Self::Int32(v) => cast_to!(v, to),
            Self::Int64(v) => cast_to!(v, to),
            Self::Float32(v) => cast_to!(v, to),
            Self::Float64(v) => cast_to!(v, to),
        })
    }
}

/// Primitive types that can be stored in a host array.
pub trait HostNative: Copy + Sized + 'static {
    const ELEMENT_TYPE: ArrayElementType;

    fn into_buffer(vals: Vec<Self>) -> HostBuffer;
    fn try_slice(buf: &HostBuffer) -> Option<&[Self]>;
}

macro_rules! impl_host_native {
    ($prim:ty, $variant:ident) => {
        impl HostNative for $prim {
            const ELEMENT_TYPE: ArrayElementType = ArrayElementType::$variant;

            fn into_buffer(vals: Vec<Self>) -> HostBuffer {
                HostBuffer::$variant(vals)
            }

            fn try_slice(buf: &HostBuffer) -> Option<&[Self]> {
                match buf {
                    HostBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_host_native!(i8, Int8);
impl_host_native!(i16, Int16);
impl_host_native!(i32, Int32);
impl_host_native!(i64, Int64);
impl_host_native!(f32, Float32);
impl_host_native!(f64, Float64);

/// An n-dimensional array stored in row-major order in host memory.
#[derive(Debug, Clone, PartialEq)]
pub struct HostArray {
    shape: Vec<usize>,
    buffer: HostBuffer,
}

impl HostArray {
    /// Create a new array, checking that the shape covers every element in
    /// the buffer.
    pub fn try_new(shape: Vec<usize>, buffer: HostBuffer) -> Result<Self> {
        let mismatch = |reason: String| UdfIoError::ShapeMismatch {
            expected: Dimensions::fixed(shape.iter().copied()),
            actual: vec![buffer.len()],
            reason,
        };
        let len = checked_len(&shape).ok_or_else(|| mismatch("shape overflows".to_string()))?;
        if len != buffer.len() {
            return Err(mismatch(format!(
                "shape holds {len} elements, buffer has {}",
                buffer.len()
            )));
        }
        Ok(HostArray { shape, buffer })
    }

    /// Create a one dimensional array.
    pub fn from_vec<T: HostNative>(vals: Vec<T>) -> Self {
        HostArray {
            shape: vec![vals.len()],
            buffer: T::into_buffer(vals),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub const fn element_type(&self) -> ArrayElementType {
        self.buffer.element_type()
    }

    pub fn buffer(&self) -> &HostBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> HostBuffer {
        self.buffer
    }

    /// Get the values as a typed slice, returns None if `T` doesn't match the
    /// element type.
    pub fn values<T: HostNative>(&self) -> Option<&[T]> {
        T::try_slice(&self.buffer)
    }

    /// Reshape to the given dimensions, keeping element order.
    pub fn reshape(self, dims: &[Dim]) -> Result<Self> {
        let shape = resolve_shape(dims, &self.shape)?;
        trace!(from = ?self.shape, to = ?shape, "reshaping host array");
        Ok(HostArray {
            shape,
            buffer: self.buffer,
        })
    }

    /// Cast elements to a different type, keeping the shape.
    pub fn cast(self, to: ArrayElementType) -> Result<Self> {
        if self.element_type() == to {
            return Ok(self);
        }
        trace!(from = %self.element_type(), %to, "casting host array");
        let buffer = self.buffer.cast(to)?;
        Ok(HostArray {
            shape: self.shape,
            buffer,
        })
    }

    /// Build an array from a nested sequence.
    ///
    /// Integer only sequences produce `Int64` arrays, any float in the
    /// sequence produces a `Float64` array.
    pub fn try_from_nested(nested: NestedValue) -> Result<Self> {
        let (shape, leaves) = nested.flatten()?;
        let buffer = match leaves {
            NestedLeaves::Int(vals) => HostBuffer::Int64(vals),
            NestedLeaves::Float(vals) => HostBuffer::Float64(vals),
        };
        Ok(HostArray { shape, buffer })
    }

    /// Convert any supported representation into a host array.
    pub fn try_from_value(value: IoValue) -> Result<Self> {
        match value {
            IoValue::Host(arr) => Ok(arr),
            IoValue::Nested(nested) => Self::try_from_nested(nested),
            IoValue::Arrow(tensor) => tensor.to_host(),
            other @ (IoValue::Table(_)
            | IoValue::Utf8(_)
            | IoValue::Opaque(_)
            | IoValue::Tuple(_)) => Err(UdfIoError::unsupported(
                "host array",
                other.representation_name(),
            )),
        }
    }

    /// Convert into an arrow tensor with the same shape and values.
    pub fn to_arrow(&self) -> ArrowTensor {
        ArrowTensor::from_host(self)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::errors::UdfIoErrorKind;

    #[test]
    fn try_new_checks_element_count() {
        let arr = HostArray::try_new(vec![2, 2], HostBuffer::Int32(vec![1, 2, 3, 4])).unwrap();
        assert_eq!(&[2, 2], arr.shape());

        let err = HostArray::try_new(vec![2, 2], HostBuffer::Int32(vec![1, 2, 3])).unwrap_err();
        assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());
    }

    #[test]
    fn try_new_rejects_overflowing_shape() {
        let err = HostArray::try_new(vec![usize::MAX, 2], HostBuffer::Int8(Vec::new())).unwrap_err();
        assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());

        let err = HostArray::try_new(vec![usize::MAX / 2 + 1, 2], HostBuffer::Int8(Vec::new())).unwrap_err();
        assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());
    }

    #[test]
    fn reshape_keeps_order() {
        let arr = HostArray::from_vec(vec![1_i64, 2, 3, 4, 5, 6])
            .reshape(&[Dim::Fixed(2), Dim::Fixed(3)])
            .unwrap();
        assert_eq!(&[2, 3], arr.shape());
        assert_eq!(Some(&[1_i64, 2, 3, 4, 5, 6][..]), arr.values::<i64>());
    }

    #[test]
    fn reshape_wrong_element_count() {
        let err = HostArray::from_vec(vec![1.0_f32, 2.0, 3.0])
            .reshape(&[Dim::Fixed(2), Dim::Fixed(2)])
            .unwrap_err();
        assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());
        assert!(err.to_string().contains("(2, 2)"), "{err}");
    }

    #[rstest]
    #[case(ArrayElementType::Int8)]
    #[case(ArrayElementType::Int16)]
    #[case(ArrayElementType::Int32)]
    #[case(ArrayElementType::Int64)]
    #[case(ArrayElementType::Float32)]
    #[case(ArrayElementType::Float64)]
    fn cast_to_each_type(#[case] to: ArrayElementType) {
        let arr = HostArray::from_vec(vec![1_i64, -2, 3]).cast(to).unwrap();
        assert_eq!(to, arr.element_type());
        assert_eq!(&[3], arr.shape());

        // Casting back gets the original values, all of them fit in every type.
        let back = arr.cast(ArrayElementType::Int64).unwrap();
        assert_eq!(Some(&[1_i64, -2, 3][..]), back.values::<i64>());
    }

    #[test]
    fn cast_float_to_int_truncates() {
        let arr = HostArray::from_vec(vec![1.9_f64, -1.9, 300.0])
            .cast(ArrayElementType::Int8)
            .unwrap();
        assert_eq!(Some(&[1_i8, -1, 127][..]), arr.values::<i8>());
    }

    #[test]
    fn cast_to_same_type_is_identity() {
        let arr = HostArray::from_vec(vec![0.5_f32, 1.5]);
        let casted = arr.clone().cast(ArrayElementType::Float32).unwrap();
        assert_eq!(arr, casted);
    }

    #[test]
    fn from_nested_infers_type() {
        let ints = HostArray::try_from_nested(NestedValue::from(vec![vec![1, 2], vec![3, 4]]))
            .unwrap();
        assert_eq!(ArrayElementType::Int64, ints.element_type());
        assert_eq!(&[2, 2], ints.shape());

        let floats =
            HostArray::try_from_nested(NestedValue::from(vec![
                NestedValue::from(1),
                NestedValue::from(2.5),
            ]))
            .unwrap();
        assert_eq!(Some(&[1.0_f64, 2.5][..]), floats.values::<f64>());
    }

    #[test]
    fn from_string_unsupported() {
        let err = HostArray::try_from_value(IoValue::Utf8("a".to_string())).unwrap_err();
        assert_eq!(UdfIoErrorKind::UnsupportedRepresentation, err.kind());
    }
}

use tracing::trace;

use super::IoArgument;
use crate::array::{ArrayBackend, IoValue};
use crate::catalog::UdfIoCatalogEntry;
use crate::datatype::{ArrayElementType, Dimensions, LogicalType};
use crate::errors::Result;

/// Describes a single array shaped argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayArgument {
    name: String,
    is_nullable: bool,
    element_type: ArrayElementType,
    dimensions: Dimensions,
    backend: ArrayBackend,
}

impl ArrayArgument {
    pub fn new(name: impl Into<String>, backend: ArrayBackend) -> Self {
        ArrayArgument {
            name: name.into(),
            is_nullable: false,
            element_type: ArrayElementType::Any,
            dimensions: Dimensions::Any,
            backend,
        }
    }

    /// Argument coerced to a host array.
    pub fn host(name: impl Into<String>) -> Self {
        Self::new(name, ArrayBackend::Host)
    }

    /// Argument coerced to an arrow tensor.
    pub fn arrow(name: impl Into<String>) -> Self {
        Self::new(name, ArrayBackend::Arrow)
    }

    pub fn with_element_type(mut self, element_type: ArrayElementType) -> Self {
        self.element_type = element_type;
        self
    }

    pub fn with_dimensions(mut self, dimensions: impl Into<Dimensions>) -> Self {
        self.dimensions = dimensions.into();
        self
    }

    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_nullable(&self) -> bool {
        self.is_nullable
    }

    pub fn element_type(&self) -> ArrayElementType {
        self.element_type
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn backend(&self) -> ArrayBackend {
        self.backend
    }

    pub fn logical_type(&self) -> LogicalType {
        LogicalType::NdArray
    }

    pub(crate) fn catalog_entry(&self, is_input: bool) -> UdfIoCatalogEntry {
        UdfIoCatalogEntry {
            name: self.name.clone(),
            logical_type: self.logical_type(),
            is_nullable: self.is_nullable,
            element_type: self.element_type,
            dimensions: self.dimensions.clone(),
            is_input,
        }
    }
}

impl IoArgument for ArrayArgument {
    fn generate_catalog_entries(&self, is_input: bool) -> Vec<UdfIoCatalogEntry> {
        vec![self.catalog_entry(is_input)]
    }

    fn check_array_and_convert_type(&self, value: IoValue) -> Result<IoValue> {
        // `Any` accepts the value as is, no representation change either.
        if self.element_type.is_any() {
            return Ok(value);
        }
        trace!(name = %self.name, to = %self.element_type, backend = %self.backend, "converting type");
        self.backend.convert_type(value, self.element_type)
    }

    fn check_array_and_convert_shape(&self, value: IoValue) -> Result<IoValue> {
        match &self.dimensions {
            Dimensions::Any => Ok(value),
            Dimensions::Axes(dims) => {
                trace!(name = %self.name, to = %self.dimensions, backend = %self.backend, "converting shape");
                self.backend.convert_shape(value, dims)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int64Array};
    use proptest::prelude::*;

    use super::*;
    use crate::array::{ArrowTensor, HostArray, NestedValue};
    use crate::datatype::Dim;
    use crate::errors::UdfIoErrorKind;

    fn backends() -> impl Strategy<Value = ArrayBackend> {
        prop_oneof![Just(ArrayBackend::Host), Just(ArrayBackend::Arrow)]
    }

    fn element_types() -> impl Strategy<Value = ArrayElementType> {
        proptest::sample::select(ArrayElementType::CONCRETE.to_vec())
    }

    #[test]
    fn nested_list_to_float32_vector() {
        let arg = ArrayArgument::host("x")
            .with_element_type(ArrayElementType::Float32)
            .with_dimensions([3]);

        let out = arg
            .validate_object(NestedValue::from(vec![1, 2, 3]).into(), true)
            .unwrap();
        let out = out.try_into_host().unwrap();
        assert_eq!(&[3], out.shape());
        assert_eq!(Some(&[1.0_f32, 2.0, 3.0][..]), out.values::<f32>());
    }

    #[test]
    fn any_type_accepts_verbatim() {
        let arg = ArrayArgument::arrow("x");
        let value = IoValue::Utf8("not an array".to_string());
        let out = arg.validate_object(value.clone(), true).unwrap();
        assert_eq!(value, out);
    }

    #[test]
    fn any_type_with_shape_still_reshapes() {
        let arg = ArrayArgument::host("x").with_dimensions([Dim::Fixed(2), Dim::Any]);
        let out = arg
            .validate_object(HostArray::from_vec(vec![1_i16, 2, 3, 4]).into(), false)
            .unwrap();
        let out = out.try_into_host().unwrap();
        assert_eq!(ArrayElementType::Int16, out.element_type());
        assert_eq!(&[2, 2], out.shape());
    }

    #[test]
    fn host_descriptor_accepts_arrow_tensor() {
        let values: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3, 4]));
        let tensor = ArrowTensor::try_from_array(values).unwrap();

        let arg = ArrayArgument::host("x")
            .with_element_type(ArrayElementType::Int32)
            .with_dimensions([2, 2]);
        let out = arg.validate_object(tensor.into(), true).unwrap();
        let out = match out {
            IoValue::Host(arr) => arr,
            other => panic!("expected host array, got {other:?}"),
        };
        assert_eq!(Some(&[1_i32, 2, 3, 4][..]), out.values::<i32>());
    }

    #[test]
    fn arrow_descriptor_accepts_host_array() {
        let arg = ArrayArgument::arrow("x").with_element_type(ArrayElementType::Float64);
        let out = arg
            .validate_object(HostArray::from_vec(vec![1_i8, 2]).into(), true)
            .unwrap();
        let out = match out {
            IoValue::Arrow(tensor) => tensor,
            other => panic!("expected arrow tensor, got {other:?}"),
        };
        assert_eq!(ArrayElementType::Float64, out.element_type());
    }

    #[test]
    fn unsupported_representation_with_concrete_type() {
        let arg = ArrayArgument::host("x").with_element_type(ArrayElementType::Int8);
        let err = arg
            .validate_object(IoValue::Utf8("a".to_string()), true)
            .unwrap_err();
        assert_eq!(UdfIoErrorKind::UnsupportedRepresentation, err.kind());
    }

    #[test]
    fn catalog_entry_fields() {
        let arg = ArrayArgument::arrow("frame")
            .with_nullable(true)
            .with_element_type(ArrayElementType::Int8)
            .with_dimensions([Dim::Any, Dim::Fixed(3)]);
        let entries = arg.generate_catalog_entries(true);
        assert_eq!(
            vec![UdfIoCatalogEntry {
                name: "frame".to_string(),
                logical_type: LogicalType::NdArray,
                is_nullable: true,
                element_type: ArrayElementType::Int8,
                dimensions: Dimensions::Axes(vec![Dim::Any, Dim::Fixed(3)]),
                is_input: true,
            }],
            entries
        );
    }

    proptest! {
        #[test]
        fn reshape_to_matching_dims(
            dims in proptest::collection::vec(1usize..5, 1..4),
            backend in backends(),
        ) {
            let len: usize = dims.iter().product();
            let vals: Vec<i64> = (0..len as i64).collect();
            let arg = ArrayArgument::new("x", backend).with_dimensions(Dimensions::fixed(dims.clone()));

            let out = arg.validate_object(HostArray::from_vec(vals).into(), true).unwrap();
            prop_assert_eq!(Some(dims.as_slice()), out.shape());
        }

        #[test]
        fn reshape_to_mismatched_dims(
            dims in proptest::collection::vec(1usize..5, 1..4),
            extra in 1usize..4,
            backend in backends(),
        ) {
            let len: usize = dims.iter().product::<usize>() + extra;
            let vals: Vec<i64> = (0..len as i64).collect();
            let arg = ArrayArgument::new("x", backend).with_dimensions(Dimensions::fixed(dims));

            let err = arg.validate_object(HostArray::from_vec(vals).into(), true).unwrap_err();
            prop_assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());
        }

        #[test]
        fn coercion_is_idempotent(
            vals in proptest::collection::vec(-100i64..100, 1..32),
            element_type in element_types(),
            backend in backends(),
        ) {
            let dims = [Dim::Fixed(vals.len())];
            let arg = ArrayArgument::new("x", backend)
                .with_element_type(element_type)
                .with_dimensions(dims);

            let once = arg.validate_object(NestedValue::from(vals).into(), true).unwrap();
            let twice = arg.validate_object(once.clone(), true).unwrap();
            prop_assert_eq!(Some(element_type), once.element_type());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn cross_backend_round_trip(
            vals in proptest::collection::vec(-1000i64..1000, 1..32),
            element_type in element_types(),
        ) {
            let host = HostArray::from_vec(vals).cast(element_type).unwrap();

            let to_arrow = ArrayArgument::arrow("x").with_element_type(element_type);
            let to_host = ArrayArgument::host("x").with_element_type(element_type);

            let tensor = to_arrow.validate_object(host.clone().into(), true).unwrap();
            prop_assert!(matches!(tensor, IoValue::Arrow(_)));
            let back = to_host.validate_object(tensor, true).unwrap();
            prop_assert_eq!(IoValue::Host(host), back);
        }
    }
}

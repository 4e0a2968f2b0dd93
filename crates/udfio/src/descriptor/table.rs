use std::collections::HashSet;

use arrow::record_batch::RecordBatch;
use tracing::debug;

use super::{ArrayArgument, IoArgument};
use crate::array::{ArrowTensor, IoValue};
use crate::catalog::UdfIoCatalogEntry;
use crate::datatype::{ArrayElementType, Dimensions};
use crate::errors::{Result, UdfIoError};

/// Describes a group of named array columns passed as a single table shaped
/// argument.
///
/// The table descriptor itself does not coerce values. Per column coercion is
/// done by whoever materializes the columns, using [`Self::column_descriptors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArgument {
    columns: Vec<String>,
    column_types: Vec<ArrayElementType>,
    column_shapes: Vec<Dimensions>,
}

impl TableArgument {
    /// Create a new table descriptor.
    ///
    /// Empty `column_types` or `column_shapes` default to `Any` for every
    /// column. Non-empty lists must have one entry per column.
    pub fn try_new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        column_types: Vec<ArrayElementType>,
        column_shapes: Vec<Dimensions>,
    ) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        let column_types = if column_types.is_empty() {
            vec![ArrayElementType::Any; columns.len()]
        } else {
            column_types
        };
        let column_shapes = if column_shapes.is_empty() {
            vec![Dimensions::Any; columns.len()]
        } else {
            column_shapes
        };

        if columns.len() != column_types.len() || columns.len() != column_shapes.len() {
            return Err(UdfIoError::LengthMismatch {
                columns: columns.len(),
                column_types: column_types.len(),
                column_shapes: column_shapes.len(),
            });
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(UdfIoError::DuplicateColumn(col.clone()));
            }
        }

        Ok(TableArgument {
            columns,
            column_types,
            column_shapes,
        })
    }

    /// Table descriptor with no type or shape constraints on any column.
    pub fn try_with_columns<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self> {
        Self::try_new(columns, Vec::new(), Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_types(&self) -> &[ArrayElementType] {
        &self.column_types
    }

    pub fn column_shapes(&self) -> &[Dimensions] {
        &self.column_shapes
    }

    /// Per column descriptors for materializing this table.
    pub fn column_descriptors(&self) -> Vec<ArrayArgument> {
        self.columns
            .iter()
            .zip(&self.column_types)
            .zip(&self.column_shapes)
            .map(|((name, ty), shape)| {
                ArrayArgument::arrow(name.clone())
                    .with_element_type(*ty)
                    .with_dimensions(shape.clone())
            })
            .collect()
    }

    /// Pull each declared column out of a batch and coerce it with its column
    /// descriptor.
    ///
    /// Returned values are in declared column order. Columns in the batch
    /// that aren't declared are ignored.
    pub fn materialize_columns(&self, batch: &RecordBatch) -> Result<Vec<IoValue>> {
        self.column_descriptors()
            .into_iter()
            .map(|desc| {
                let col = batch
                    .column_by_name(desc.name())
                    .ok_or_else(|| UdfIoError::MissingColumn(desc.name().to_string()))?;
                ArrowTensor::try_from_array(col.clone())
                    .and_then(|tensor| desc.validate_object(tensor.into(), true))
                    .map_err(|e| UdfIoError::InvalidColumn {
                        column: desc.name().to_string(),
                        source: Box::new(e),
                    })
            })
            .collect()
    }
}

impl IoArgument for TableArgument {
    fn generate_catalog_entries(&self, is_input: bool) -> Vec<UdfIoCatalogEntry> {
        debug!(columns = ?self.columns, is_input, "generating table catalog entries");
        self.column_descriptors()
            .iter()
            .map(|desc| desc.catalog_entry(is_input))
            .collect()
    }

    fn check_array_and_convert_type(&self, value: IoValue) -> Result<IoValue> {
        Ok(value)
    }

    fn check_array_and_convert_shape(&self, value: IoValue) -> Result<IoValue> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Float32Array, Int32Array, StringArray};

    use super::*;
    use crate::datatype::{Dim, LogicalType};
    use crate::errors::UdfIoErrorKind;

    #[test]
    fn default_types_and_shapes() {
        let table = TableArgument::try_with_columns(["a", "b"]).unwrap();
        let entries = table.generate_catalog_entries(false);

        assert_eq!(2, entries.len());
        for (entry, name) in entries.iter().zip(["a", "b"]) {
            assert_eq!(name, entry.name);
            assert_eq!(LogicalType::NdArray, entry.logical_type);
            assert_eq!(ArrayElementType::Any, entry.element_type);
            assert_eq!(Dimensions::Any, entry.dimensions);
            assert!(!entry.is_nullable);
            assert!(!entry.is_input);
        }
    }

    #[test]
    fn explicit_types_and_shapes() {
        let table = TableArgument::try_new(
            ["labels", "bboxes"],
            vec![ArrayElementType::Int32, ArrayElementType::Float32],
            vec![Dimensions::Axes(vec![Dim::Any]), Dimensions::from([Dim::Any, Dim::Fixed(4)])],
        )
        .unwrap();

        let entries = table.generate_catalog_entries(true);
        assert_eq!(ArrayElementType::Float32, entries[1].element_type);
        assert_eq!(
            Dimensions::Axes(vec![Dim::Any, Dim::Fixed(4)]),
            entries[1].dimensions
        );
        assert!(entries.iter().all(|e| e.is_input && !e.is_nullable));
    }

    #[test]
    fn length_mismatch_at_construction() {
        let err = TableArgument::try_new(["a", "b"], vec![ArrayElementType::Int32], Vec::new())
            .unwrap_err();
        assert_eq!(UdfIoErrorKind::LengthMismatch, err.kind());

        let err = TableArgument::try_new(["a"], Vec::new(), vec![Dimensions::Any; 2]).unwrap_err();
        assert_eq!(UdfIoErrorKind::LengthMismatch, err.kind());
    }

    #[test]
    fn duplicate_columns() {
        let err = TableArgument::try_with_columns(["a", "a"]).unwrap_err();
        assert_eq!(UdfIoErrorKind::DuplicateColumn, err.kind());
    }

    #[test]
    fn validate_passes_value_through() {
        let table = TableArgument::try_with_columns(["a"]).unwrap();
        let value = IoValue::Utf8("anything".to_string());
        assert_eq!(value, table.validate_object(value.clone(), true).unwrap());
    }

    #[test]
    fn materialize_columns_coerces() {
        let table = TableArgument::try_new(
            ["score", "id"],
            vec![ArrayElementType::Float64, ArrayElementType::Any],
            Vec::new(),
        )
        .unwrap();

        let id: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        let score: ArrayRef = Arc::new(Float32Array::from(vec![0.5, 0.25]));
        let batch = RecordBatch::try_from_iter([("id", id), ("score", score)]).unwrap();

        let cols = table.materialize_columns(&batch).unwrap();
        assert_eq!(2, cols.len());
        assert_eq!(Some(ArrayElementType::Float64), cols[0].element_type());
        assert_eq!(Some(ArrayElementType::Int32), cols[1].element_type());
    }

    #[test]
    fn materialize_missing_column() {
        let table = TableArgument::try_with_columns(["missing"]).unwrap();
        let id: ArrayRef = Arc::new(Int32Array::from(vec![1]));
        let batch = RecordBatch::try_from_iter([("id", id)]).unwrap();

        let err = table.materialize_columns(&batch).unwrap_err();
        assert_eq!(UdfIoErrorKind::MissingColumn, err.kind());
    }

    #[test]
    fn materialize_non_numeric_column_names_column() {
        let table = TableArgument::try_with_columns(["id", "label"]).unwrap();
        let id: ArrayRef = Arc::new(Int32Array::from(vec![1, 2]));
        let label: ArrayRef = Arc::new(StringArray::from(vec!["cat", "dog"]));
        let batch = RecordBatch::try_from_iter([("id", id), ("label", label)]).unwrap();

        let err = table.materialize_columns(&batch).unwrap_err();
        assert_eq!(UdfIoErrorKind::UnsupportedRepresentation, err.kind());
        match &err {
            UdfIoError::InvalidColumn { column, .. } => assert_eq!("label", column),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Invalid column label: "), "{err}");
    }

    #[test]
    fn materialize_coercion_failure_names_column() {
        let table = TableArgument::try_new(
            ["boxes"],
            Vec::new(),
            vec![Dimensions::from([Dim::Any, Dim::Fixed(4)])],
        )
        .unwrap();
        let boxes: ArrayRef = Arc::new(Int32Array::from(vec![1, 2, 3]));
        let batch = RecordBatch::try_from_iter([("boxes", boxes)]).unwrap();

        let err = table.materialize_columns(&batch).unwrap_err();
        assert_eq!(UdfIoErrorKind::ShapeMismatch, err.kind());
        assert!(err.to_string().starts_with("Invalid column boxes: "), "{err}");
    }
}

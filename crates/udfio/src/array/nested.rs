use crate::errors::{Result, UdfIoError};

/// Deepest nesting accepted when flattening a [`NestedValue`].
pub const MAX_NESTING_DEPTH: usize = 64;

/// A list-like value such as `[[1, 2], [3, 4]]`.
///
/// Only values nested at most [`MAX_NESTING_DEPTH`] lists deep can be
/// converted into arrays.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedValue {
    Int(i64),
    Float(f64),
    List(Vec<NestedValue>),
}

/// Flattened leaves of a nested value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NestedLeaves {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl NestedValue {
    /// Flatten into a row-major shape and leaf values.
    ///
    /// The shape is taken from the first element at each level and every
    /// other element must agree with it. Recursion while collecting leaves
    /// never goes deeper than the shape's rank.
    pub(crate) fn flatten(&self) -> Result<(Vec<usize>, NestedLeaves)> {
        let mut shape = Vec::new();
        let mut curr = self;
        while let NestedValue::List(items) = curr {
            if shape.len() == MAX_NESTING_DEPTH {
                return Err(UdfIoError::unsupported(
                    "a rectangular array",
                    format!("sequence nested deeper than {MAX_NESTING_DEPTH} levels"),
                ));
            }
            shape.push(items.len());
            match items.first() {
                Some(first) => curr = first,
                None => break,
            }
        }

        let mut ints = Vec::new();
        let mut floats = Vec::new();
        let mut has_float = false;
        self.collect_leaves(&shape, 0, &mut ints, &mut floats, &mut has_float)?;

        let leaves = if has_float || ints.is_empty() {
            // Empty sequences default to floats.
            NestedLeaves::Float(floats)
        } else {
            NestedLeaves::Int(ints)
        };

        Ok((shape, leaves))
    }

    fn collect_leaves(
        &self,
        shape: &[usize],
        depth: usize,
        ints: &mut Vec<i64>,
        floats: &mut Vec<f64>,
        has_float: &mut bool,
    ) -> Result<()> {
        match self {
            NestedValue::List(items) => {
                if shape.get(depth) != Some(&items.len()) {
                    return Err(ragged(depth));
                }
                for item in items {
                    item.collect_leaves(shape, depth + 1, ints, floats, has_float)?;
                }
            }
            NestedValue::Int(v) => {
                if depth != shape.len() {
                    return Err(ragged(depth));
                }
                ints.push(*v);
                floats.push(*v as f64);
            }
            NestedValue::Float(v) => {
                if depth != shape.len() {
                    return Err(ragged(depth));
                }
                *has_float = true;
                floats.push(*v);
            }
        }
        Ok(())
    }
}

fn ragged(depth: usize) -> UdfIoError {
    UdfIoError::unsupported(
        "a rectangular array",
        format!("ragged nested sequence at depth {depth}"),
    )
}

impl From<i32> for NestedValue {
    fn from(value: i32) -> Self {
        NestedValue::Int(value as i64)
    }
}

impl From<i64> for NestedValue {
    fn from(value: i64) -> Self {
        NestedValue::Int(value)
    }
}

impl From<f32> for NestedValue {
    fn from(value: f32) -> Self {
        NestedValue::Float(value as f64)
    }
}

impl From<f64> for NestedValue {
    fn from(value: f64) -> Self {
        NestedValue::Float(value)
    }
}

impl<T: Into<NestedValue>> From<Vec<T>> for NestedValue {
    fn from(value: Vec<T>) -> Self {
        NestedValue::List(value.into_iter().map(Into::into).collect())
    }
}

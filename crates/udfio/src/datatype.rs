use std::fmt;

use serde::{Deserialize, Serialize};

/// Element type of an array argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArrayElementType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Accept any element type.
    ///
    /// Only meaningful on descriptors. Values are never cast to `Any`.
    #[default]
    Any,
}

impl ArrayElementType {
    /// All element types that can be used as a cast target.
    pub const CONCRETE: [ArrayElementType; 6] = [
        ArrayElementType::Int8,
        ArrayElementType::Int16,
        ArrayElementType::Int32,
        ArrayElementType::Int64,
        ArrayElementType::Float32,
        ArrayElementType::Float64,
    ];

    pub const fn is_any(&self) -> bool {
        matches!(self, ArrayElementType::Any)
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, ArrayElementType::Float32 | ArrayElementType::Float64)
    }
}

impl fmt::Display for ArrayElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int8 => write!(f, "INT8"),
            Self::Int16 => write!(f, "INT16"),
            Self::Int32 => write!(f, "INT32"),
            Self::Int64 => write!(f, "INT64"),
            Self::Float32 => write!(f, "FLOAT32"),
            Self::Float64 => write!(f, "FLOAT64"),
            Self::Any => write!(f, "ANY"),
        }
    }
}

/// Logical column type recorded in the catalog.
///
/// Every UDF argument is currently an n-dimensional array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalType {
    #[default]
    NdArray,
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NdArray => write!(f, "NDARRAY"),
        }
    }
}

/// A single axis of a declared shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dim {
    Fixed(usize),
    /// Axis of any length.
    Any,
}

impl Dim {
    pub const fn fixed(&self) -> Option<usize> {
        match self {
            Self::Fixed(n) => Some(*n),
            Self::Any => None,
        }
    }
}

impl From<usize> for Dim {
    fn from(value: usize) -> Self {
        Dim::Fixed(value)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Any => write!(f, "*"),
        }
    }
}

/// Declared shape of an array argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimensions {
    /// No constraint on the shape, including the number of axes.
    #[default]
    Any,
    Axes(Vec<Dim>),
}

impl Dimensions {
    /// Fully fixed shape.
    pub fn fixed(axes: impl IntoIterator<Item = usize>) -> Self {
        Dimensions::Axes(axes.into_iter().map(Dim::Fixed).collect())
    }

    pub fn axes(&self) -> Option<&[Dim]> {
        match self {
            Self::Any => None,
            Self::Axes(axes) => Some(axes),
        }
    }

    pub const fn is_any(&self) -> bool {
        matches!(self, Dimensions::Any)
    }
}

impl From<Vec<Dim>> for Dimensions {
    fn from(value: Vec<Dim>) -> Self {
        Dimensions::Axes(value)
    }
}

impl<const N: usize> From<[usize; N]> for Dimensions {
    fn from(value: [usize; N]) -> Self {
        Dimensions::fixed(value)
    }
}

impl<const N: usize> From<[Dim; N]> for Dimensions {
    fn from(value: [Dim; N]) -> Self {
        Dimensions::Axes(value.to_vec())
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "*"),
            Self::Axes(axes) => {
                write!(f, "(")?;
                for (idx, axis) in axes.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{axis}")?;
                }
                // Match tuple formatting for single axis shapes.
                if axes.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
        }
    }
}

use std::result;

use thiserror::Error;

use crate::{dim::Dim, key::Key};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Rank or shape of the parts of a variable disagree, or dims are not what an operation needs
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Two variables disagree on the extent of the same dimension
    #[error("dimension {dim} has extent {existing}, cannot insert variable with extent {new}")]
    DimensionConflict {
        dim: Dim,
        existing: usize,
        new: usize,
    },

    #[error("dimension {0} not found")]
    DimensionNotFound(Dim),

    #[error("Dataset does not contain such a variable: {0}")]
    KeyNotFound(Key),

    #[error("Dataset already contains a variable with key {0}")]
    DuplicateKey(Key),

    #[error("index {begin}..{end} out of range for dimension {dim} with extent {extent}")]
    IndexOutOfRange {
        dim: Dim,
        begin: usize,
        end: usize,
        extent: usize,
    },

    /// An external array doesn't have the shape of the variable it is written into
    #[error("expected array of shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("operation requires a non-empty extent along dimension {0}")]
    EmptyDimension(Dim),

    #[error("variable has no variances")]
    VariancesMissing,

    /// A mask key was given where a variable is expected
    #[error("{0} names a mask, not a variable")]
    NotAVariable(Key),
}

pub type Result<T> = result::Result<T, Error>;

use std::fmt;

use crate::dim::Dim;

/// Role of a data variable within a dataset
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Measured or derived values
    Value,

    /// Auxiliary per-item information that is carried along but not a measurement
    Attr,
}

/// Identifies a variable in a dataset.
///
/// A coordinate is keyed by the dimension it labels, data by role and name. Masks live in a
/// namespace of their own and are keyed by name only.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Coord(Dim),
    Data(Role, String),
    Mask(String),
}

impl Key {
    pub fn coord(dim: Dim) -> Self {
        Self::Coord(dim)
    }

    pub fn value<S: Into<String>>(name: S) -> Self {
        Self::Data(Role::Value, name.into())
    }

    pub fn attr<S: Into<String>>(name: S) -> Self {
        Self::Data(Role::Attr, name.into())
    }

    pub fn mask<S: Into<String>>(name: S) -> Self {
        Self::Mask(name.into())
    }

    pub fn is_coord(&self) -> bool {
        matches!(self, Self::Coord(_))
    }

    /// The dimension this key is a coordinate for, if it is one
    pub fn coord_dim(&self) -> Option<Dim> {
        match self {
            Self::Coord(dim) => Some(*dim),
            Self::Data(..) | Self::Mask(_) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Coord(_) => None,
            Self::Data(_, name) | Self::Mask(name) => Some(name),
        }
    }
}

impl From<Dim> for Key {
    fn from(dim: Dim) -> Self {
        Self::Coord(dim)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coord(dim) => write!(f, "Coord::{dim}"),
            Self::Data(role, name) => write!(f, "Data::{role:?}({name:?})"),
            Self::Mask(name) => write!(f, "Mask({name:?})"),
        }
    }
}

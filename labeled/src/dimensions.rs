//! The dimension registry of a dataset.
//!
//! A dataset doesn't store the extent of its dimensions anywhere else: every variable reports
//! its own dims and extents and the registry is the single place where these are reconciled.
//! It is updated on every insert and remove, and an insert that would make two variables
//! disagree about the extent of a dimension is rejected before anything is changed.

use crate::{
    dim::Dim,
    errors::{Error, Result},
};

#[derive(Clone, Debug)]
struct Entry {
    dim: Dim,
    extent: usize,

    /// Number of variables spanning this dimension
    users: usize,
}

/// Ordered mapping of dimension to extent.
///
/// Dims are kept in the order they were first seen.
///
#[derive(Clone, Debug, Default)]
pub struct Dimensions {
    entries: Vec<Entry>,
}

impl Dimensions {
    pub fn new() -> Self {
        Self { entries: vec![] }
    }

    /// Build a set of dimensions from explicit `(dim, extent)` pairs.
    ///
    /// Fails with `DimensionMismatch` if the same dim is listed twice.
    ///
    pub fn from_pairs(pairs: &[(Dim, usize)]) -> Result<Self> {
        let mut dimensions = Self::new();
        for (i, (dim, _)) in pairs.iter().enumerate() {
            if pairs[..i].iter().any(|(other, _)| other == dim) {
                return Err(Error::DimensionMismatch(format!(
                    "dimension {dim} listed more than once"
                )));
            }
        }
        dimensions.add(pairs)?;

        Ok(dimensions)
    }

    /// Dimensions from dims that are already known to be unique
    pub(crate) fn from_unique(dims: &[Dim], shape: &[usize]) -> Self {
        Self {
            entries: dims
                .iter()
                .zip(shape)
                .map(|(&dim, &extent)| Entry {
                    dim,
                    extent,
                    users: 1,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, dim: Dim) -> bool {
        self.entries.iter().any(|entry| entry.dim == dim)
    }

    pub fn get(&self, dim: Dim) -> Option<usize> {
        self.entry(dim).map(|entry| entry.extent)
    }

    /// Extent of `dim`, or `DimensionNotFound`
    pub fn extent(&self, dim: Dim) -> Result<usize> {
        self.get(dim).ok_or(Error::DimensionNotFound(dim))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dim, usize)> + '_ {
        self.entries.iter().map(|entry| (entry.dim, entry.extent))
    }

    pub fn dims(&self) -> Vec<Dim> {
        self.entries.iter().map(|entry| entry.dim).collect()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.entries.iter().map(|entry| entry.extent).collect()
    }

    /// Total number of elements an array spanning all of these dimensions would have
    pub fn volume(&self) -> usize {
        self.entries.iter().map(|entry| entry.extent).product()
    }

    /// Make sure a variable with the given dims and extents could be added without conflict.
    ///
    pub(crate) fn check(&self, shape: &[(Dim, usize)]) -> Result<()> {
        for &(dim, extent) in shape {
            if let Some(existing) = self.get(dim) {
                if existing != extent {
                    return Err(Error::DimensionConflict {
                        dim,
                        existing,
                        new: extent,
                    });
                }
            }
        }

        Ok(())
    }

    /// Register a variable spanning the given dims.
    ///
    /// Either all dims are registered or, on conflict, none are.
    ///
    pub(crate) fn add(&mut self, shape: &[(Dim, usize)]) -> Result<()> {
        self.check(shape)?;
        for &(dim, extent) in shape {
            match self.entries.iter_mut().find(|entry| entry.dim == dim) {
                Some(entry) => entry.users += 1,
                None => self.entries.push(Entry {
                    dim,
                    extent,
                    users: 1,
                }),
            }
        }

        Ok(())
    }

    /// Unregister a variable spanning the given dims. Dims without remaining users are dropped.
    ///
    pub(crate) fn remove(&mut self, dims: &[Dim]) {
        for dim in dims {
            if let Some(entry) = self.entries.iter_mut().find(|entry| entry.dim == *dim) {
                entry.users -= 1;
            }
        }
        self.entries.retain(|entry| entry.users > 0);
    }

    fn entry(&self, dim: Dim) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.dim == dim)
    }
}

/// Two sets of dimensions are equal if they map the same dims to the same extents, regardless of
/// order.
///
impl PartialEq for Dimensions {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(dim, extent)| other.get(dim) == Some(extent))
    }
}

impl Eq for Dimensions {}

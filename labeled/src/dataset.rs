use std::{fmt, mem};

use ndarray::{Array, Array1, Dimension};
use paste::paste;

use crate::{
    buffer::Element,
    dim::Dim,
    dimensions::Dimensions,
    errors::{Error, Result},
    exchange::ArrayExchange,
    key::Key,
    mask::{Mask, MaskView},
    ops::Op,
    variable::{Variable, VariableView},
};

/// A keyed collection of variables with consistent dimensions.
///
/// Variables are keyed either as the coordinate of a dimension or as data with a role and a name.
/// Named boolean masks are kept alongside. All variables and masks spanning the same dimension
/// agree on its extent, which is enforced on insert. Iteration follows insertion order.
///
pub struct Dataset<N = f64>
where
    N: Element,
{
    variables: Vec<(Key, Variable<N>)>,
    masks: Vec<(String, Mask)>,
    dimensions: Dimensions,
}

/// A window onto some or all of the variables of a dataset, possibly sliced.
///
/// All variables in a view alias the storage of the dataset it was made from, so writing through
/// a view writes to the dataset. Views can be sliced and subset further, which still aliases the
/// original dataset.
///
#[derive(Clone)]
pub struct DatasetView<N = f64>
where
    N: Element,
{
    variables: Vec<(Key, VariableView<N>)>,
    masks: Vec<(String, MaskView)>,
}

impl<N> Dataset<N>
where
    N: Element,
{
    pub fn new() -> Self {
        Self {
            variables: vec![],
            masks: vec![],
            dimensions: Dimensions::new(),
        }
    }

    /// Insert a variable under `key`.
    ///
    /// Fails with `DuplicateKey` if there already is a variable for `key`, with
    /// `DimensionConflict` if the variable disagrees with the dataset about the extent of one of
    /// its dims, and with `DimensionMismatch` if `key` is a coordinate key and the variable isn't
    /// one dimensional along that same dim. On failure the dataset is left unchanged.
    ///
    pub fn insert(&mut self, key: Key, variable: Variable<N>) -> Result<()> {
        check_key(&key, &variable)?;
        if self.contains(&key) {
            return Err(Error::DuplicateKey(key));
        }
        self.dimensions.add(&variable.shape_pairs())?;

        log::debug!("insert {key} with dims {:?}", variable.shape_pairs());
        self.variables.push((key, variable));

        Ok(())
    }

    /// Insert a coordinate for `dim` with the given values
    pub fn insert_coord(&mut self, dim: Dim, values: Array1<N>) -> Result<()> {
        self.insert(Key::Coord(dim), Variable::new(&[dim], values)?)
    }

    /// Insert a data variable with role `Value` under `name`
    pub fn insert_data<S, D>(&mut self, name: S, dims: &[Dim], values: Array<N, D>) -> Result<()>
    where
        S: Into<String>,
        D: Dimension,
    {
        self.insert(Key::value(name), Variable::new(dims, values)?)
    }

    /// Insert a data variable with role `Value` and variances under `name`
    pub fn insert_data_with_variances<S, D>(
        &mut self,
        name: S,
        dims: &[Dim],
        values: Array<N, D>,
        variances: Array<N, D>,
    ) -> Result<()>
    where
        S: Into<String>,
        D: Dimension,
    {
        self.insert(
            Key::value(name),
            Variable::with_variances(dims, values, variances)?,
        )
    }

    /// Store `variable` under `key`, returning the variable it replaces, if any.
    ///
    /// A replaced variable keeps its place in the key order. The new variable is checked against
    /// the dimensions of every other variable and mask, so it may change the extent of a dim only
    /// if nothing else spans that dim. On failure the dataset is left unchanged.
    ///
    pub fn replace(&mut self, key: Key, variable: Variable<N>) -> Result<Option<Variable<N>>> {
        check_key(&key, &variable)?;
        let index = match self.variables.iter().position(|(other, _)| *other == key) {
            Some(index) => index,
            None => {
                self.insert(key, variable)?;
                return Ok(None);
            }
        };

        let mut dimensions = self.dimensions.clone();
        dimensions.remove(&self.variables[index].1.dims());
        dimensions.add(&variable.shape_pairs())?;
        self.dimensions = dimensions;

        log::debug!("replace {key} with dims {:?}", variable.shape_pairs());
        let (_, slot) = &mut self.variables[index];

        Ok(Some(mem::replace(slot, variable)))
    }

    /// Remove and return the variable stored under `key`.
    ///
    /// Views that alias the removed variable remain valid and keep seeing its data.
    ///
    pub fn remove(&mut self, key: &Key) -> Result<Variable<N>> {
        let index = self
            .variables
            .iter()
            .position(|(other, _)| other == key)
            .ok_or_else(|| Error::KeyNotFound(key.clone()))?;
        let (_, variable) = self.variables.remove(index);
        self.dimensions.remove(&variable.dims());

        log::debug!("removed {key}");

        Ok(variable)
    }

    /// A view of the variable stored under `key`, or `KeyNotFound`
    pub fn get(&self, key: &Key) -> Result<VariableView<N>> {
        self.variables
            .iter()
            .find(|(other, _)| other == key)
            .map(|(_, variable)| variable.view())
            .ok_or_else(|| Error::KeyNotFound(key.clone()))
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.variables.iter().any(|(other, _)| other == key)
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.variables.iter().map(|(key, _)| key)
    }

    /// Keys and variables, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Variable<N>)> {
        self.variables.iter().map(|(key, variable)| (key, variable))
    }

    /// Insert a mask called `name` with the given flags.
    ///
    /// Fails with `DuplicateKey` if there already is a mask called `name` and with
    /// `DimensionConflict` if the mask disagrees with the dataset about the extent of a dim.
    ///
    pub fn insert_mask<S, D>(&mut self, name: S, dims: &[Dim], values: Array<bool, D>) -> Result<()>
    where
        S: Into<String>,
        D: Dimension,
    {
        self.add_mask(name.into(), Mask::new(dims, values)?)
    }

    /// A view of the mask called `name`, or `KeyNotFound`
    pub fn mask(&self, name: &str) -> Result<MaskView> {
        self.masks
            .iter()
            .find(|(other, _)| other == name)
            .map(|(_, mask)| mask.view())
            .ok_or_else(|| Error::KeyNotFound(Key::mask(name)))
    }

    /// Remove and return the mask called `name`
    pub fn remove_mask(&mut self, name: &str) -> Result<Mask> {
        let index = self
            .masks
            .iter()
            .position(|(other, _)| other == name)
            .ok_or_else(|| Error::KeyNotFound(Key::mask(name)))?;
        let (_, mask) = self.masks.remove(index);
        self.dimensions.remove(&mask.dims());

        log::debug!("removed mask {name:?}");

        Ok(mask)
    }

    /// Names and masks, in insertion order
    pub fn masks(&self) -> impl Iterator<Item = (&str, &Mask)> {
        self.masks.iter().map(|(name, mask)| (name.as_str(), mask))
    }

    fn add_mask(&mut self, name: String, mask: Mask) -> Result<()> {
        if self.masks.iter().any(|(other, _)| *other == name) {
            return Err(Error::DuplicateKey(Key::Mask(name)));
        }
        self.dimensions.add(&mask.shape_pairs())?;

        log::debug!("insert mask {name:?} with dims {:?}", mask.shape_pairs());
        self.masks.push((name, mask));

        Ok(())
    }

    /// The extent of every dimension spanned by a variable or mask of this dataset
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Number of variables, coordinates and data together. Masks aren't counted.
    pub fn size(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// A view of the whole dataset
    pub fn view(&self) -> DatasetView<N> {
        DatasetView {
            variables: self
                .variables
                .iter()
                .map(|(key, variable)| (key.clone(), variable.view()))
                .collect(),
            masks: self
                .masks
                .iter()
                .map(|(name, mask)| (name.clone(), mask.view()))
                .collect(),
        }
    }

    /// See `DatasetView::slice`
    pub fn slice(&self, dim: Dim, index: usize) -> Result<DatasetView<N>> {
        self.view().slice(dim, index)
    }

    /// See `DatasetView::slice_range`
    pub fn slice_range(&self, dim: Dim, begin: usize, end: usize) -> Result<DatasetView<N>> {
        self.view().slice_range(dim, begin, end)
    }

    /// See `DatasetView::subset`
    pub fn subset(&self, name: &str) -> Result<DatasetView<N>> {
        self.view().subset(name)
    }
}

impl<N> Default for Dataset<N>
where
    N: Element,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Make sure `variable` may be stored under `key`
fn check_key<N>(key: &Key, variable: &Variable<N>) -> Result<()>
where
    N: Element,
{
    match key {
        Key::Mask(_) => Err(Error::NotAVariable(key.clone())),
        Key::Coord(dim) if variable.dims() != [*dim] => Err(Error::DimensionMismatch(format!(
            "coordinate for {dim} must span only {dim}, got {:?}",
            variable.dims()
        ))),
        _ => Ok(()),
    }
}

impl<N> DatasetView<N>
where
    N: Element,
{
    pub fn get(&self, key: &Key) -> Result<VariableView<N>> {
        self.variables
            .iter()
            .find(|(other, _)| other == key)
            .map(|(_, variable)| variable.clone())
            .ok_or_else(|| Error::KeyNotFound(key.clone()))
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.variables.iter().any(|(other, _)| other == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.variables.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &VariableView<N>)> {
        self.variables.iter().map(|(key, variable)| (key, variable))
    }

    pub fn mask(&self, name: &str) -> Result<MaskView> {
        self.masks
            .iter()
            .find(|(other, _)| other == name)
            .map(|(_, mask)| mask.clone())
            .ok_or_else(|| Error::KeyNotFound(Key::mask(name)))
    }

    pub fn masks(&self) -> impl Iterator<Item = (&str, &MaskView)> {
        self.masks.iter().map(|(name, mask)| (name.as_str(), mask))
    }

    pub fn size(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// The extent of every dimension spanned by a variable or mask in this view
    pub fn dimensions(&self) -> Dimensions {
        let pairs = self
            .variables
            .iter()
            .flat_map(|(_, variable)| variable.shape_pairs())
            .chain(self.masks.iter().flat_map(|(_, mask)| mask.shape_pairs()));

        let mut dims = vec![];
        let mut shape = vec![];
        for (dim, extent) in pairs {
            if !dims.contains(&dim) {
                dims.push(dim);
                shape.push(extent);
            }
        }

        Dimensions::from_unique(&dims, &shape)
    }

    /// Select a single `index` along `dim`.
    ///
    /// Every variable and mask spanning `dim` is sliced and loses `dim`. The rest are included as
    /// they are. The coordinate for `dim` is dropped from the result altogether, since a single
    /// point has no axis left for it to label. Compare `slice_range`, which keeps the coordinate.
    ///
    /// Fails with `DimensionNotFound` if nothing spans `dim` and with `IndexOutOfRange` if
    /// `index` is past its extent.
    ///
    pub fn slice(&self, dim: Dim, index: usize) -> Result<Self> {
        self.check_dim(dim)?;
        let mut variables = Vec::with_capacity(self.variables.len());
        for (key, variable) in &self.variables {
            if *key == Key::Coord(dim) {
                continue;
            }
            let variable = if variable.contains(dim) {
                variable.slice(dim, index)?
            } else {
                variable.clone()
            };
            variables.push((key.clone(), variable));
        }

        let mut masks = Vec::with_capacity(self.masks.len());
        for (name, mask) in &self.masks {
            let mask = if mask.contains(dim) {
                mask.slice(dim, index)?
            } else {
                mask.clone()
            };
            masks.push((name.clone(), mask));
        }

        Ok(Self { variables, masks })
    }

    /// Select `begin..end` along `dim`.
    ///
    /// Every variable and mask spanning `dim`, including its coordinate, is cropped to the range.
    /// The rest are included as they are.
    ///
    pub fn slice_range(&self, dim: Dim, begin: usize, end: usize) -> Result<Self> {
        self.check_dim(dim)?;
        let mut variables = Vec::with_capacity(self.variables.len());
        for (key, variable) in &self.variables {
            let variable = if variable.contains(dim) {
                variable.slice_range(dim, begin, end)?
            } else {
                variable.clone()
            };
            variables.push((key.clone(), variable));
        }

        let mut masks = Vec::with_capacity(self.masks.len());
        for (name, mask) in &self.masks {
            let mask = if mask.contains(dim) {
                mask.slice_range(dim, begin, end)?
            } else {
                mask.clone()
            };
            masks.push((name.clone(), mask));
        }

        Ok(Self { variables, masks })
    }

    /// Restrict to the data variables called `name`, the coordinates of the dims they span and
    /// the masks that apply to them.
    ///
    /// Fails with `KeyNotFound` if there is no data variable called `name`.
    ///
    pub fn subset(&self, name: &str) -> Result<Self> {
        if !self
            .keys()
            .any(|key| matches!(key, Key::Data(_, other) if other == name))
        {
            return Err(Error::KeyNotFound(Key::value(name)));
        }
        let mut dims = vec![];
        for (key, variable) in &self.variables {
            if let Key::Data(_, other) = key {
                if other == name {
                    dims.extend(variable.dims());
                }
            }
        }

        let variables = self
            .variables
            .iter()
            .filter(|(key, _)| match key {
                Key::Coord(dim) => dims.contains(dim),
                Key::Data(_, other) => other == name,
                Key::Mask(_) => false,
            })
            .map(|(key, variable)| (key.clone(), variable.clone()))
            .collect();
        let masks = self
            .masks
            .iter()
            .filter(|(_, mask)| mask.applies_to(&dims))
            .cloned()
            .collect();

        Ok(Self { variables, masks })
    }

    /// Copy everything seen by this view into a new, independent dataset
    pub fn to_dataset(&self) -> Result<Dataset<N>> {
        let mut dataset = Dataset::new();
        for (key, variable) in &self.variables {
            dataset.insert(key.clone(), variable.copy())?;
        }
        for (name, mask) in &self.masks {
            dataset.add_mask(name.clone(), mask.copy())?;
        }

        Ok(dataset)
    }

    fn check_dim(&self, dim: Dim) -> Result<()> {
        if self.variables.iter().any(|(_, variable)| variable.contains(dim))
            || self.masks.iter().any(|(_, mask)| mask.contains(dim))
        {
            Ok(())
        } else {
            Err(Error::DimensionNotFound(dim))
        }
    }

    /// Apply `op` to the data variable `name` with the data variable of the same name in
    /// `other`, then or each mask of `other` that applies to it into the mask of the same name
    /// here.
    ///
    /// Masks of `other` with no counterpart here are returned if `keep_missing` is set and are a
    /// `KeyNotFound` error otherwise. Everything is checked before anything is written.
    ///
    fn merge_assign(
        &self,
        name: &str,
        other: &Self,
        op: Op,
        keep_missing: bool,
    ) -> Result<Vec<(String, MaskView)>> {
        let key = Key::value(name);
        let lhs = self.get(&key)?;
        let rhs = other.get(&key)?;
        let rhs_dims = rhs.dims();

        let mut merges = vec![];
        let mut missing = vec![];
        for (mask_name, mask) in &other.masks {
            if !mask.applies_to(&rhs_dims) {
                continue;
            }
            match self.mask(mask_name) {
                Ok(target) => {
                    let operand = mask.broadcast(&target.dimensions())?;
                    merges.push((target, operand));
                }
                Err(cause) if !keep_missing => return Err(cause),
                Err(_) => missing.push((mask_name.clone(), mask.clone())),
            }
        }

        lhs.binary_assign(&rhs, op)?;
        for (target, operand) in merges {
            target.or_assign(&operand)?;
        }

        Ok(missing)
    }
}

macro_rules! dataset_ops {
    ($($op:ident),*) => {
        paste! {
            impl<N> Dataset<N>
            where
                N: Element,
            {
                $(
                    #[doc = "In place `" $op "` of the data variable `name` of `other` into the data"]
                    #[doc = "variable `name` of this dataset."]
                    #[doc = ""]
                    #[doc = "Masks of `other` that apply to the operand are or-ed into the masks of the same"]
                    #[doc = "name, and copied over if this dataset doesn't have them yet."]
                    pub fn [<$op _assign>](&mut self, name: &str, other: &DatasetView<N>) -> Result<()> {
                        let missing = self
                            .view()
                            .merge_assign(name, other, Op::[<$op:camel>], true)?;
                        for (mask_name, mask) in missing {
                            self.add_mask(mask_name, mask.copy())?;
                        }

                        Ok(())
                    }
                )*
            }

            impl<N> DatasetView<N>
            where
                N: Element,
            {
                $(
                    #[doc = "In place `" $op "` of the data variable `name` of `other` into the data"]
                    #[doc = "variable `name` of this view."]
                    #[doc = ""]
                    #[doc = "Masks of `other` that apply to the operand are or-ed into the masks of the same"]
                    #[doc = "name. A view can't gain masks, so fails with `KeyNotFound` if one is missing."]
                    pub fn [<$op _assign>](&self, name: &str, other: &DatasetView<N>) -> Result<()> {
                        self.merge_assign(name, other, Op::[<$op:camel>], false)?;

                        Ok(())
                    }
                )*
            }
        }
    };
}

dataset_ops!(add, sub, mul, div);

impl<N> ArrayExchange<N> for Dataset<N>
where
    N: Element,
{
    fn variable(&self, key: &Key) -> Result<VariableView<N>> {
        self.get(key)
    }
}

impl<N> ArrayExchange<N> for DatasetView<N>
where
    N: Element,
{
    fn variable(&self, key: &Key) -> Result<VariableView<N>> {
        self.get(key)
    }
}

/// Datasets are equal if they have the same keys with equal variables and the same masks.
/// Insertion order doesn't matter.
///
impl<N> PartialEq for DatasetView<N>
where
    N: Element,
{
    fn eq(&self, other: &Self) -> bool {
        self.size() == other.size()
            && self.masks.len() == other.masks.len()
            && self.iter().all(|(key, variable)| match other.get(key) {
                Ok(other) => *variable == other,
                Err(_) => false,
            })
            && self.masks().all(|(name, mask)| match other.mask(name) {
                Ok(other) => *mask == other,
                Err(_) => false,
            })
    }
}

impl<N> PartialEq for Dataset<N>
where
    N: Element,
{
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl<N> PartialEq<DatasetView<N>> for Dataset<N>
where
    N: Element,
{
    fn eq(&self, other: &DatasetView<N>) -> bool {
        self.view() == *other
    }
}

impl<N> PartialEq<Dataset<N>> for DatasetView<N>
where
    N: Element,
{
    fn eq(&self, other: &Dataset<N>) -> bool {
        *self == other.view()
    }
}

impl<N> fmt::Debug for DatasetView<N>
where
    N: Element,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetView")
            .field("variables", &self.variables)
            .field("masks", &self.masks)
            .finish()
    }
}

impl<N> fmt::Debug for Dataset<N>
where
    N: Element,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("variables", &self.variables)
            .field("masks", &self.masks)
            .finish()
    }
}

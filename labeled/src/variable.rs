use std::{fmt, ops::Deref, sync::Arc};

use ndarray::{Array, ArrayD, ArrayViewD, Axis, Dimension};

use crate::{
    buffer::{Buffer, Element, SharedBuffer},
    dim::Dim,
    dimensions::Dimensions,
    errors::{Error, Result},
    layout::Layout,
};

/// A labeled multi-dimensional array of values with optional variances.
///
/// A `Variable` owns its buffer. Everything that reads or writes it goes through a
/// `VariableView`, and a `Variable` derefs to the view that sees all of it.
///
pub struct Variable<N = f64>
where
    N: Element,
{
    view: VariableView<N>,
}

/// A window onto some region of a variable's buffer.
///
/// Views alias the buffer of the variable they were made from: writing through a view writes to
/// that variable, and only to the region the view sees. Cloning a view produces another alias of
/// the same region, not a copy. Use `copy` to get independent data.
///
#[derive(Clone)]
pub struct VariableView<N = f64>
where
    N: Element,
{
    pub(crate) buffer: SharedBuffer<N>,
    pub(crate) layout: Layout,
}

impl<N> Variable<N>
where
    N: Element,
{
    /// Create a variable from values, one dim per axis of `values`.
    ///
    /// Fails with `DimensionMismatch` if the number of dims doesn't match the rank of `values` or
    /// if a dim is repeated.
    ///
    pub fn new<D>(dims: &[Dim], values: Array<N, D>) -> Result<Self>
    where
        D: Dimension,
    {
        Self::build(dims, values.into_dyn(), None)
    }

    /// Create a variable from values and variances, which must have the same shape.
    ///
    pub fn with_variances<D>(dims: &[Dim], values: Array<N, D>, variances: Array<N, D>) -> Result<Self>
    where
        D: Dimension,
    {
        Self::build(dims, values.into_dyn(), Some(variances.into_dyn()))
    }

    pub(crate) fn build(
        dims: &[Dim],
        values: ArrayD<N>,
        variances: Option<ArrayD<N>>,
    ) -> Result<Self> {
        check_dims(dims, values.ndim())?;

        Ok(Self::adopt(dims, Buffer::new(values, variances)?))
    }

    /// Wrap a buffer that is already known to be consistent with `dims`
    pub(crate) fn adopt(dims: &[Dim], buffer: Buffer<N>) -> Self {
        let layout = Layout::full(dims, buffer.shape());

        Self {
            view: VariableView {
                buffer: buffer.shared(),
                layout,
            },
        }
    }

    /// Get a view of the whole variable
    pub fn view(&self) -> VariableView<N> {
        self.view.clone()
    }
}

impl<N> Deref for Variable<N>
where
    N: Element,
{
    type Target = VariableView<N>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<N> VariableView<N>
where
    N: Element,
{
    /// Dims of this view, in the order its axes are presented
    pub fn dims(&self) -> Vec<Dim> {
        self.layout.dims()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.layout.shape()
    }

    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Number of elements seen by this view
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, dim: Dim) -> bool {
        self.dims().contains(&dim)
    }

    pub fn extent(&self, dim: Dim) -> Result<usize> {
        self.layout.extent(dim)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::from_unique(&self.dims(), &self.shape())
    }

    pub(crate) fn shape_pairs(&self) -> Vec<(Dim, usize)> {
        self.dims().into_iter().zip(self.shape()).collect()
    }

    pub fn has_variances(&self) -> bool {
        self.buffer.read().variances.is_some()
    }

    /// Whether this view sees every element of the underlying buffer
    pub fn covers_buffer(&self) -> bool {
        let buffer = self.buffer.read();
        self.layout.covers(buffer.shape())
    }

    /// Whether this view and `other` share the same underlying buffer
    pub fn aliases(&self, other: &VariableView<N>) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Select a single `index` along `dim`, removing `dim` from the result.
    ///
    /// Fails with `DimensionNotFound` if this view doesn't span `dim` and with `IndexOutOfRange`
    /// if `index` isn't less than the extent of `dim`.
    ///
    pub fn slice(&self, dim: Dim, index: usize) -> Result<Self> {
        log::trace!("slicing {:?} at {dim}={index}", self.dims());
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            layout: self.layout.slice(dim, index)?,
        })
    }

    /// Select `begin..end` along `dim`. The result still spans `dim`, with extent `end - begin`.
    ///
    /// `begin == end` is allowed and yields an empty view.
    ///
    pub fn slice_range(&self, dim: Dim, begin: usize, end: usize) -> Result<Self> {
        log::trace!("slicing {:?} at {dim}={begin}..{end}", self.dims());
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            layout: self.layout.slice_range(dim, begin, end)?,
        })
    }

    /// Reorder the axes of this view. `dims` must be a permutation of the current dims.
    ///
    pub fn transpose(&self, dims: &[Dim]) -> Result<Self> {
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            layout: self.layout.transpose(dims)?,
        })
    }

    /// Copy the region seen by this view into a new, independent variable
    pub fn copy(&self) -> Variable<N> {
        let buffer = self.buffer.read();
        let values = self.layout.apply(buffer.values.view()).to_owned();
        let variances = buffer
            .variances
            .as_ref()
            .map(|variances| self.layout.apply(variances.view()).to_owned());

        Variable::adopt(&self.dims(), Buffer { values, variances })
    }

    /// Copy this view's data into a new variable spanning `target`.
    ///
    /// Every dim of this view must be in `target` with the same extent. Dims of `target` that
    /// this view doesn't span are filled by repeating the data along them. The result's axes
    /// are in the order of `target`.
    ///
    pub fn broadcast(&self, target: &Dimensions) -> Result<Variable<N>> {
        let ordered = broadcast_order(&self.shape_pairs(), target)?;
        let view = self.transpose(&ordered)?;
        let buffer = view.buffer.read();
        let values = expand(view.layout.apply(buffer.values.view()), &ordered, target)?;
        let variances = match &buffer.variances {
            Some(variances) => Some(expand(
                view.layout.apply(variances.view()),
                &ordered,
                target,
            )?),
            None => None,
        };

        Ok(Variable::adopt(&target.dims(), Buffer { values, variances }))
    }
}

/// Make sure `dims` can be given as the axes of an array of rank `rank`
pub(crate) fn check_dims(dims: &[Dim], rank: usize) -> Result<()> {
    if dims.len() != rank {
        return Err(Error::DimensionMismatch(format!(
            "{} dims {dims:?} given for array of rank {rank}",
            dims.len()
        )));
    }
    for (i, dim) in dims.iter().enumerate() {
        if dims[..i].contains(dim) {
            return Err(Error::DimensionMismatch(format!(
                "dimension {dim} listed more than once in {dims:?}"
            )));
        }
    }

    Ok(())
}

/// The dims of `shape` in the order they appear in `target`, once every one of them has been
/// found in `target` with the same extent.
pub(crate) fn broadcast_order(shape: &[(Dim, usize)], target: &Dimensions) -> Result<Vec<Dim>> {
    for &(dim, extent) in shape {
        match target.get(dim) {
            Some(target_extent) if target_extent == extent => {}
            Some(target_extent) => {
                return Err(Error::DimensionMismatch(format!(
                    "cannot broadcast {dim} with extent {extent} to extent {target_extent}"
                )));
            }
            None => {
                return Err(Error::DimensionMismatch(format!(
                    "cannot broadcast {shape:?} to {:?}, {dim} is missing",
                    target.dims()
                )));
            }
        }
    }

    Ok(target
        .dims()
        .into_iter()
        .filter(|dim| shape.iter().any(|(other, _)| other == dim))
        .collect())
}

/// Insert length 1 axes for the dims of `target` that aren't in `dims`, then repeat along them
pub(crate) fn expand<A>(array: ArrayViewD<A>, dims: &[Dim], target: &Dimensions) -> Result<ArrayD<A>>
where
    A: Clone,
{
    let mut array = array;
    for (axis, dim) in target.dims().iter().enumerate() {
        if !dims.contains(dim) {
            array = array.insert_axis(Axis(axis));
        }
    }

    match array.broadcast(target.shape()) {
        Some(broadcast) => Ok(broadcast.to_owned()),
        None => Err(Error::DimensionMismatch(format!(
            "cannot broadcast array of shape {:?} to {:?}",
            array.shape(),
            target.shape()
        ))),
    }
}

/// Views are equal if they have the same dims, in the same order, and equal values and variances.
///
impl<N> PartialEq for VariableView<N>
where
    N: Element,
{
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims()
            && self.values() == other.values()
            && self.variances() == other.variances()
    }
}

impl<N> PartialEq for Variable<N>
where
    N: Element,
{
    fn eq(&self, other: &Self) -> bool {
        self.view == other.view
    }
}

impl<N> fmt::Debug for VariableView<N>
where
    N: Element,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableView")
            .field("dims", &self.dims())
            .field("values", &self.values())
            .field("variances", &self.variances())
            .finish()
    }
}

impl<N> fmt::Debug for Variable<N>
where
    N: Element,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("dims", &self.dims())
            .field("values", &self.values())
            .field("variances", &self.variances())
            .finish()
    }
}

//! Boolean masks.
//!
//! A mask flags elements of the data in a dataset, e.g. as bad or to be excluded, without
//! touching the data itself. Masks have dims of their own and are sliced through the same layouts
//! as variables, so a slice of a dataset sees the matching slice of each of its masks. Combining
//! masks is always a logical or: an element masked in either operand is masked in the result.

use std::{fmt, ops::Deref, sync::Arc};

use ndarray::{Array, ArrayBase, ArrayD, Data, Dimension, Zip};
use parking_lot::RwLock;

use crate::{
    dim::Dim,
    dimensions::Dimensions,
    errors::{Error, Result},
    layout::Layout,
    variable::{broadcast_order, check_dims, expand},
};

/// A labeled array of flags. `true` means masked.
///
pub struct Mask {
    view: MaskView,
}

/// A window onto some region of a mask, aliasing its storage like `VariableView` does.
///
#[derive(Clone)]
pub struct MaskView {
    buffer: Arc<RwLock<ArrayD<bool>>>,
    layout: Layout,
}

impl Mask {
    /// Create a mask from flags, one dim per axis of `values`.
    ///
    /// Fails with `DimensionMismatch` if the number of dims doesn't match the rank of `values` or
    /// if a dim is repeated.
    ///
    pub fn new<D>(dims: &[Dim], values: Array<bool, D>) -> Result<Self>
    where
        D: Dimension,
    {
        check_dims(dims, values.ndim())?;

        Ok(Self::adopt(dims, values.into_dyn()))
    }

    fn adopt(dims: &[Dim], values: ArrayD<bool>) -> Self {
        let layout = Layout::full(dims, values.shape());

        Self {
            view: MaskView {
                buffer: Arc::new(RwLock::new(values)),
                layout,
            },
        }
    }

    pub fn view(&self) -> MaskView {
        self.view.clone()
    }
}

impl Deref for Mask {
    type Target = MaskView;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl MaskView {
    pub fn dims(&self) -> Vec<Dim> {
        self.layout.dims()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.layout.shape()
    }

    pub fn contains(&self, dim: Dim) -> bool {
        self.dims().contains(&dim)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::from_unique(&self.dims(), &self.shape())
    }

    pub(crate) fn shape_pairs(&self) -> Vec<(Dim, usize)> {
        self.dims().into_iter().zip(self.shape()).collect()
    }

    /// Whether this view and `other` share the same underlying flags
    pub fn aliases(&self, other: &MaskView) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Whether every dim of this mask is one of `dims`
    pub(crate) fn applies_to(&self, dims: &[Dim]) -> bool {
        self.dims().iter().all(|dim| dims.contains(dim))
    }

    pub fn slice(&self, dim: Dim, index: usize) -> Result<Self> {
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            layout: self.layout.slice(dim, index)?,
        })
    }

    pub fn slice_range(&self, dim: Dim, begin: usize, end: usize) -> Result<Self> {
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            layout: self.layout.slice_range(dim, begin, end)?,
        })
    }

    pub fn transpose(&self, dims: &[Dim]) -> Result<Self> {
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            layout: self.layout.transpose(dims)?,
        })
    }

    /// Copy out the flags seen by this view
    pub fn values(&self) -> ArrayD<bool> {
        let buffer = self.buffer.read();
        self.layout.apply(buffer.view()).to_owned()
    }

    /// Whether any element seen by this view is masked
    pub fn any(&self) -> bool {
        let buffer = self.buffer.read();
        self.layout.apply(buffer.view()).iter().any(|&flag| flag)
    }

    /// Overwrite the flags seen by this view. Fails with `ShapeMismatch` unless `values` has
    /// exactly the shape of this view.
    ///
    pub fn set_values<S, D>(&self, values: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = bool>,
        D: Dimension,
    {
        let expected = self.shape();
        if expected != values.shape() {
            return Err(Error::ShapeMismatch {
                expected,
                actual: values.shape().to_vec(),
            });
        }

        let mut buffer = self.buffer.write();
        self.layout
            .apply(buffer.view_mut())
            .assign(&values.view().into_dyn());

        Ok(())
    }

    /// Copy the region seen by this view into a new, independent mask
    pub fn copy(&self) -> Mask {
        Mask::adopt(&self.dims(), self.values())
    }

    /// Copy this view's flags into a new mask spanning `target`, repeating along dims this view
    /// doesn't span. Same rules as `VariableView::broadcast`.
    ///
    pub fn broadcast(&self, target: &Dimensions) -> Result<Mask> {
        let ordered = broadcast_order(&self.shape_pairs(), target)?;
        let view = self.transpose(&ordered)?;
        let buffer = view.buffer.read();
        let values = expand(view.layout.apply(buffer.view()), &ordered, target)?;

        Ok(Mask::adopt(&target.dims(), values))
    }

    /// Mask, in place, every element that is masked in `other`.
    ///
    /// `other` is broadcast to the dims of this view first, so it may span fewer dims but not
    /// more. Fails with `DimensionMismatch` if that isn't possible.
    ///
    pub fn or_assign(&self, other: &MaskView) -> Result<()> {
        let operand = other.broadcast(&self.dimensions())?.values();

        let mut buffer = self.buffer.write();
        Zip::from(self.layout.apply(buffer.view_mut()))
            .and(&operand)
            .for_each(|flag, &masked| *flag |= masked);

        Ok(())
    }
}

/// Masks are equal if they have the same dims, in the same order, and the same flags.
///
impl PartialEq for MaskView {
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims() && self.values() == other.values()
    }
}

impl PartialEq for Mask {
    fn eq(&self, other: &Self) -> bool {
        self.view == other.view
    }
}

impl fmt::Debug for MaskView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskView")
            .field("dims", &self.dims())
            .field("values", &self.values())
            .finish()
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mask")
            .field("dims", &self.dims())
            .field("values", &self.values())
            .finish()
    }
}

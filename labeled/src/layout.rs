//! Describes which part of a root buffer a view sees and in what order.
//!
//! A layout keeps one selection per axis of the root buffer. An axis is either still visible,
//! restricted to a contiguous `begin..end` range, or it has been eliminated by selecting a single
//! index along it. Visible axes are presented in `order`, which starts out as the root's own axis
//! order and only changes by transposing.
//!
//! Slicing a view never looks at the data, it only produces a new layout relative to the same
//! root. That is what makes slices of slices compose: offsets are always folded into the
//! selection against the root, so a view of a view of a view is still a single step away from the
//! buffer.

use ndarray::{ArrayBase, Axis, IxDyn, RawData, Slice};

use crate::{
    dim::Dim,
    errors::{Error, Result},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Selection {
    /// Axis is eliminated, fixed at this index of the root axis
    Index(usize),

    /// Axis is visible, showing `begin..end` of the root axis
    Range(usize, usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    /// Dims of the root buffer, one per root axis
    root_dims: Vec<Dim>,

    /// Selection along each root axis
    selections: Vec<Selection>,

    /// Visible root axes, in the order this view presents them
    order: Vec<usize>,
}

impl Layout {
    /// Layout that sees all of a root buffer with the given dims and shape
    pub(crate) fn full(dims: &[Dim], shape: &[usize]) -> Self {
        Self {
            root_dims: dims.to_vec(),
            selections: shape.iter().map(|&extent| Selection::Range(0, extent)).collect(),
            order: (0..dims.len()).collect(),
        }
    }

    pub(crate) fn dims(&self) -> Vec<Dim> {
        self.order.iter().map(|&axis| self.root_dims[axis]).collect()
    }

    pub(crate) fn shape(&self) -> Vec<usize> {
        self.order
            .iter()
            .map(|&axis| {
                let (begin, end) = self.bounds(axis);
                end - begin
            })
            .collect()
    }

    pub(crate) fn rank(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn extent(&self, dim: Dim) -> Result<usize> {
        let axis = self.order[self.position(dim)?];
        let (begin, end) = self.bounds(axis);

        Ok(end - begin)
    }

    /// Whether this layout sees every element of a root buffer of the given shape
    pub(crate) fn covers(&self, root_shape: &[usize]) -> bool {
        self.selections
            .iter()
            .zip(root_shape)
            .all(|(selection, &extent)| *selection == Selection::Range(0, extent))
    }

    /// Eliminate `dim`, fixing it at `index`
    pub(crate) fn slice(&self, dim: Dim, index: usize) -> Result<Self> {
        let position = self.position(dim)?;
        let axis = self.order[position];
        let (begin, end) = self.bounds(axis);
        if index >= end - begin {
            return Err(Error::IndexOutOfRange {
                dim,
                begin: index,
                end: index + 1,
                extent: end - begin,
            });
        }

        let mut layout = self.clone();
        layout.selections[axis] = Selection::Index(begin + index);
        layout.order.remove(position);

        Ok(layout)
    }

    /// Restrict `dim` to `start..stop`, relative to what this layout currently sees of it
    pub(crate) fn slice_range(&self, dim: Dim, start: usize, stop: usize) -> Result<Self> {
        let axis = self.order[self.position(dim)?];
        let (begin, end) = self.bounds(axis);
        if start > stop || stop > end - begin {
            return Err(Error::IndexOutOfRange {
                dim,
                begin: start,
                end: stop,
                extent: end - begin,
            });
        }

        let mut layout = self.clone();
        layout.selections[axis] = Selection::Range(begin + start, begin + stop);

        Ok(layout)
    }

    /// Present the visible axes in the order given by `dims`, which must be a permutation of the
    /// current dims.
    pub(crate) fn transpose(&self, dims: &[Dim]) -> Result<Self> {
        if dims.len() != self.rank() {
            return Err(Error::DimensionMismatch(format!(
                "cannot transpose {:?} to {dims:?}",
                self.dims()
            )));
        }

        let mut order = Vec::with_capacity(dims.len());
        for dim in dims {
            let axis = self.order[self.position(*dim)?];
            if order.contains(&axis) {
                return Err(Error::DimensionMismatch(format!(
                    "dimension {dim} listed more than once in {dims:?}"
                )));
            }
            order.push(axis);
        }

        Ok(Self {
            order,
            ..self.clone()
        })
    }

    /// Apply this layout to an array view of the whole root buffer.
    ///
    /// Works the same for shared and mutable views, so reads and writes go through exactly the
    /// same region.
    ///
    pub(crate) fn apply<S>(&self, mut array: ArrayBase<S, IxDyn>) -> ArrayBase<S, IxDyn>
    where
        S: RawData,
    {
        for (axis, selection) in self.selections.iter().enumerate() {
            if let Selection::Range(begin, end) = *selection {
                array.slice_axis_inplace(Axis(axis), Slice::from(begin..end));
            }
        }

        // Remove eliminated axes from the back so the remaining axis numbers stay valid
        for (axis, selection) in self.selections.iter().enumerate().rev() {
            if let Selection::Index(index) = *selection {
                array = array.index_axis_move(Axis(axis), index);
            }
        }

        // Position of each visible root axis once eliminated axes are gone
        let mut collapsed = vec![0; self.selections.len()];
        let mut next = 0;
        for (axis, selection) in self.selections.iter().enumerate() {
            if let Selection::Range(..) = selection {
                collapsed[axis] = next;
                next += 1;
            }
        }
        let permutation: Vec<usize> = self.order.iter().map(|&axis| collapsed[axis]).collect();

        array.permuted_axes(permutation)
    }

    fn position(&self, dim: Dim) -> Result<usize> {
        self.order
            .iter()
            .position(|&axis| self.root_dims[axis] == dim)
            .ok_or(Error::DimensionNotFound(dim))
    }

    fn bounds(&self, axis: usize) -> (usize, usize) {
        match self.selections[axis] {
            Selection::Range(begin, end) => (begin, end),
            Selection::Index(index) => (index, index + 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::{array, s, Array, ArrayD};

    /// `0..24` laid out over X=2, Y=3, Z=4
    fn data() -> ArrayD<i32> {
        Array::from_iter(0..24).into_shape(vec![2, 3, 4]).unwrap()
    }

    fn layout() -> Layout {
        Layout::full(&[Dim::X, Dim::Y, Dim::Z], &[2, 3, 4])
    }

    fn flat(layout: &Layout) -> Vec<i32> {
        let data = data();
        let view = layout.apply(data.view());
        view.iter().cloned().collect()
    }

    #[test]
    fn test_full_volume() {
        let layout = layout();
        assert_eq!(layout.dims(), vec![Dim::X, Dim::Y, Dim::Z]);
        assert_eq!(layout.shape(), vec![2, 3, 4]);
        assert!(layout.covers(&[2, 3, 4]));
        assert_eq!(flat(&layout), (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn test_collapse_inner() -> Result<()> {
        let layout = layout().slice(Dim::Z, 0)?;
        assert_eq!(layout.dims(), vec![Dim::X, Dim::Y]);
        assert_eq!(flat(&layout), vec![0, 4, 8, 12, 16, 20]);

        let layout = self::layout().slice(Dim::Z, 3)?;
        assert_eq!(flat(&layout), vec![3, 7, 11, 15, 19, 23]);
        assert!(!layout.covers(&[2, 3, 4]));

        Ok(())
    }

    #[test]
    fn test_collapse_interior() -> Result<()> {
        let layout = layout().slice(Dim::Y, 1)?;
        assert_eq!(layout.dims(), vec![Dim::X, Dim::Z]);
        assert_eq!(flat(&layout), vec![4, 5, 6, 7, 16, 17, 18, 19]);

        Ok(())
    }

    #[test]
    fn test_collapse_inner_and_outer() -> Result<()> {
        let layout = layout().slice(Dim::X, 0)?.slice(Dim::Z, 0)?;
        assert_eq!(layout.dims(), vec![Dim::Y]);
        assert_eq!(flat(&layout), vec![0, 4, 8]);

        Ok(())
    }

    #[test]
    fn test_collapse_all() -> Result<()> {
        let layout = layout()
            .slice(Dim::X, 1)?
            .slice(Dim::Y, 2)?
            .slice(Dim::Z, 3)?;
        assert_eq!(layout.rank(), 0);
        assert_eq!(flat(&layout), vec![23]);

        Ok(())
    }

    #[test]
    fn test_slice_range_inner() -> Result<()> {
        let layout = layout().slice_range(Dim::Z, 0, 2)?;
        assert_eq!(layout.shape(), vec![2, 3, 2]);
        assert_eq!(flat(&layout), vec![0, 1, 4, 5, 8, 9, 12, 13, 16, 17, 20, 21]);

        Ok(())
    }

    #[test]
    fn test_slice_range_of_range() -> Result<()> {
        let layout = layout().slice_range(Dim::Z, 1, 4)?.slice_range(Dim::Z, 1, 3)?;
        assert_eq!(layout.extent(Dim::Z)?, 2);
        let data = data();
        assert_eq!(layout.apply(data.view()), data.slice(s![.., .., 2..4]).into_dyn());

        // Point slice of a range is relative to the range
        let layout = layout.slice(Dim::Z, 1)?;
        assert_eq!(layout.apply(data.view()), data.slice(s![.., .., 3]).into_dyn());

        Ok(())
    }

    #[test]
    fn test_slice_range_empty() -> Result<()> {
        let layout = layout().slice_range(Dim::Y, 3, 3)?;
        assert_eq!(layout.shape(), vec![2, 0, 4]);
        assert!(flat(&layout).is_empty());

        Ok(())
    }

    #[test]
    fn test_slice_errors() {
        let layout = layout();
        assert_eq!(
            layout.slice(Dim::Tof, 0),
            Err(Error::DimensionNotFound(Dim::Tof))
        );
        assert_eq!(
            layout.slice(Dim::X, 2),
            Err(Error::IndexOutOfRange {
                dim: Dim::X,
                begin: 2,
                end: 3,
                extent: 2
            })
        );
        assert!(matches!(
            layout.slice_range(Dim::Y, 2, 1),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            layout.slice_range(Dim::Y, 0, 4),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_eliminated_dim_is_gone() -> Result<()> {
        let layout = layout().slice(Dim::Y, 0)?;
        assert_eq!(layout.slice(Dim::Y, 0), Err(Error::DimensionNotFound(Dim::Y)));

        Ok(())
    }

    #[test]
    fn test_transpose_2d() -> Result<()> {
        let data = Array::from_iter(0..6).into_shape(vec![2, 3]).unwrap();
        let layout = Layout::full(&[Dim::X, Dim::Y], &[2, 3]).transpose(&[Dim::Y, Dim::X])?;
        assert_eq!(layout.dims(), vec![Dim::Y, Dim::X]);
        assert_eq!(layout.shape(), vec![3, 2]);
        let flat: Vec<i32> = layout.apply(data.view()).iter().cloned().collect();
        assert_eq!(flat, vec![0, 3, 1, 4, 2, 5]);

        Ok(())
    }

    #[test]
    fn test_transpose_3d_zxy() -> Result<()> {
        let layout = layout().transpose(&[Dim::Z, Dim::X, Dim::Y])?;
        assert_eq!(
            flat(&layout),
            vec![0, 4, 8, 12, 16, 20, 1, 5, 9, 13, 17, 21, 2, 6, 10, 14, 18, 22, 3, 7, 11, 15, 19, 23]
        );

        Ok(())
    }

    #[test]
    fn test_transpose_then_slice() -> Result<()> {
        let layout = layout()
            .transpose(&[Dim::Z, Dim::Y, Dim::X])?
            .slice(Dim::Y, 1)?
            .slice_range(Dim::Z, 1, 3)?;
        assert_eq!(layout.dims(), vec![Dim::Z, Dim::X]);
        assert_eq!(flat(&layout), vec![5, 17, 6, 18]);

        Ok(())
    }

    #[test]
    fn test_transpose_errors() {
        let layout = layout();
        assert!(matches!(
            layout.transpose(&[Dim::X, Dim::Y]),
            Err(Error::DimensionMismatch(_))
        ));
        assert!(matches!(
            layout.transpose(&[Dim::X, Dim::Y, Dim::Y]),
            Err(Error::DimensionMismatch(_))
        ));
        assert_eq!(
            layout.transpose(&[Dim::X, Dim::Y, Dim::Tof]),
            Err(Error::DimensionNotFound(Dim::Tof))
        );
    }

    #[test]
    fn test_apply_mut_writes_region() -> Result<()> {
        let mut data = data();
        let layout = layout().slice(Dim::X, 1)?.slice_range(Dim::Y, 1, 3)?;
        layout
            .apply(data.view_mut())
            .assign(&array![[-1, -2, -3, -4], [-5, -6, -7, -8]].into_dyn());

        for (i, value) in data.iter().enumerate() {
            let (x, y) = (i / 12, (i / 4) % 3);
            if x == 1 && y >= 1 {
                assert!(*value < 0);
            } else {
                assert_eq!(*value, i as i32);
            }
        }

        Ok(())
    }
}

use std::{fmt::Debug, sync::Arc};

use ndarray::ArrayD;
use num_traits::Float;
use parking_lot::RwLock;

use crate::errors::{Error, Result};

/// Numeric types that can be stored in a variable
///
pub trait Element: Float + Debug + Send + Sync + 'static {}

impl<N> Element for N where N: Float + Debug + Send + Sync + 'static {}

/// Storage owned by a root variable.
///
/// Values and the optional variances always have identical shape.
///
#[derive(Debug)]
pub(crate) struct Buffer<N>
where
    N: Element,
{
    pub(crate) values: ArrayD<N>,
    pub(crate) variances: Option<ArrayD<N>>,
}

/// Root storage shared between a variable and all of the views that alias it
pub(crate) type SharedBuffer<N> = Arc<RwLock<Buffer<N>>>;

impl<N> Buffer<N>
where
    N: Element,
{
    pub(crate) fn new(values: ArrayD<N>, variances: Option<ArrayD<N>>) -> Result<Self> {
        if let Some(variances) = &variances {
            if variances.shape() != values.shape() {
                return Err(Error::DimensionMismatch(format!(
                    "values have shape {:?} but variances have shape {:?}",
                    values.shape(),
                    variances.shape()
                )));
            }
        }

        Ok(Self { values, variances })
    }

    pub(crate) fn shared(self) -> SharedBuffer<N> {
        Arc::new(RwLock::new(self))
    }

    pub(crate) fn shape(&self) -> &[usize] {
        self.values.shape()
    }
}

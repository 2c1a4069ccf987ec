//! Moving data between variables and plain `ndarray` arrays.
//!
//! Reading always copies: the returned array is a snapshot in the dims order of the view it was
//! read from. Writing never reallocates: the array is assigned element by element into the
//! region of the root buffer seen by the view, and must have exactly the view's shape.

use ndarray::{ArrayBase, ArrayD, Data, Dimension};

use crate::{
    buffer::Element,
    errors::{Error, Result},
    key::Key,
    variable::VariableView,
};

impl<N> VariableView<N>
where
    N: Element,
{
    /// Copy out the values seen by this view, with axes in the order of `dims()`
    pub fn values(&self) -> ArrayD<N> {
        let buffer = self.buffer.read();
        self.layout.apply(buffer.values.view()).to_owned()
    }

    /// Copy out the variances seen by this view, if the variable has variances
    pub fn variances(&self) -> Option<ArrayD<N>> {
        let buffer = self.buffer.read();
        buffer
            .variances
            .as_ref()
            .map(|variances| self.layout.apply(variances.view()).to_owned())
    }

    /// Overwrite the values seen by this view.
    ///
    /// Fails with `ShapeMismatch` unless `values` has exactly the shape of this view. Elements of
    /// the root variable outside of this view are left untouched.
    ///
    pub fn set_values<S, D>(&self, values: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = N>,
        D: Dimension,
    {
        self.check_shape(values.shape())?;

        let mut buffer = self.buffer.write();
        self.layout
            .apply(buffer.values.view_mut())
            .assign(&values.view().into_dyn());

        Ok(())
    }

    /// Overwrite the variances seen by this view.
    ///
    /// If the variable has no variances yet they are created, but only if this view sees the
    /// whole variable. Otherwise fails with `VariancesMissing`.
    ///
    pub fn set_variances<S, D>(&self, variances: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = N>,
        D: Dimension,
    {
        self.check_shape(variances.shape())?;

        let mut buffer = self.buffer.write();
        if buffer.variances.is_none() {
            if !self.layout.covers(buffer.shape()) {
                return Err(Error::VariancesMissing);
            }
            buffer.variances = Some(ArrayD::zeros(buffer.shape()));
        }
        if let Some(dest) = buffer.variances.as_mut() {
            self.layout
                .apply(dest.view_mut())
                .assign(&variances.view().into_dyn());
        }

        Ok(())
    }

    /// Overwrite values and, if given, variances in one step.
    ///
    /// Shapes are checked before anything is written, so on error nothing has changed.
    ///
    pub fn write<S, D>(
        &self,
        values: &ArrayBase<S, D>,
        variances: Option<&ArrayBase<S, D>>,
    ) -> Result<()>
    where
        S: Data<Elem = N>,
        D: Dimension,
    {
        self.check_shape(values.shape())?;
        if let Some(variances) = variances {
            self.check_shape(variances.shape())?;
            if !self.has_variances() && !self.covers_buffer() {
                return Err(Error::VariancesMissing);
            }
        }

        self.set_values(values)?;
        if let Some(variances) = variances {
            self.set_variances(variances)?;
        }

        Ok(())
    }

    fn check_shape(&self, actual: &[usize]) -> Result<()> {
        let expected = self.shape();
        if expected != actual {
            return Err(Error::ShapeMismatch {
                expected,
                actual: actual.to_vec(),
            });
        }

        Ok(())
    }
}

/// Keyed access to the arrays of a collection of variables.
///
/// This is the interface consumers outside of this crate use to get data in and out of a
/// dataset or a view of one, without handling variables themselves.
///
pub trait ArrayExchange<N>
where
    N: Element,
{
    /// The view of the variable stored under `key`, or `KeyNotFound`
    fn variable(&self, key: &Key) -> Result<VariableView<N>>;

    fn get_values(&self, key: &Key) -> Result<ArrayD<N>> {
        Ok(self.variable(key)?.values())
    }

    fn get_variances(&self, key: &Key) -> Result<Option<ArrayD<N>>> {
        Ok(self.variable(key)?.variances())
    }

    fn set_values<S, D>(&self, key: &Key, values: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = N>,
        D: Dimension,
    {
        self.variable(key)?.set_values(values)
    }

    fn set_variances<S, D>(&self, key: &Key, variances: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = N>,
        D: Dimension,
    {
        self.variable(key)?.set_variances(variances)
    }
}

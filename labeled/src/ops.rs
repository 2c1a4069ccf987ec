//! Arithmetic on variables.
//!
//! In-place operations write through the view they are called on, just like `set_values`. The
//! right hand side is always copied out before the left hand side is locked for writing, so it is
//! fine for both sides to alias the same variable, e.g. `var.add_assign(&var.slice(Dim::Y, 0)?)`.
//!
//! Variances are propagated assuming uncorrelated operands:
//!
//! * `a + b`, `a - b`: `va + vb`
//! * `a * b`: `va * b² + vb * a²`
//! * `a / b`: `(va + vb * (a / b)²) / b²`

use ndarray::{ArrayD, Axis, Zip};
use paste::paste;

use crate::{
    buffer::{Buffer, Element},
    dim::Dim,
    errors::{Error, Result},
    variable::{Variable, VariableView},
};

#[derive(Clone, Copy, Debug)]
pub(crate) enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    fn value<N>(self, a: N, b: N) -> N
    where
        N: Element,
    {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }

    fn variance<N>(self, a: N, va: N, b: N, vb: N) -> N
    where
        N: Element,
    {
        match self {
            Self::Add | Self::Sub => va + vb,
            Self::Mul => va * b * b + vb * a * a,
            Self::Div => {
                let ratio = a / b;
                (va + vb * ratio * ratio) / (b * b)
            }
        }
    }
}

macro_rules! binary_ops {
    ($($op:ident),*) => {
        paste! {
            impl<N> VariableView<N>
            where
                N: Element,
            {
                $(
                    #[doc = "In place `" $op "` of `other` into the region seen by this view."]
                    #[doc = ""]
                    #[doc = "`other` is broadcast to the dims of this view. Fails with `DimensionMismatch` if"]
                    #[doc = "that isn't possible, and with `VariancesMissing` if `other` has variances but"]
                    #[doc = "this view doesn't."]
                    pub fn [<$op _assign>](&self, other: &VariableView<N>) -> Result<()> {
                        self.binary_assign(other, Op::[<$op:camel>])
                    }
                )*
            }
        }
    };
}

binary_ops!(add, sub, mul, div);

impl<N> VariableView<N>
where
    N: Element,
{
    pub(crate) fn binary_assign(&self, other: &VariableView<N>, op: Op) -> Result<()> {
        let operand = other.broadcast(&self.dimensions())?;
        let rhs = operand.values();
        let rhs_variances = operand.variances();

        let mut buffer = self.buffer.write();
        let Buffer { values, variances } = &mut *buffer;
        if rhs_variances.is_some() && variances.is_none() {
            return Err(Error::VariancesMissing);
        }

        let mut lhs = self.layout.apply(values.view_mut());
        if let Some(variances) = variances.as_mut() {
            let rhs_variances = rhs_variances.unwrap_or_else(|| ArrayD::zeros(rhs.raw_dim()));
            let mut lhs_variances = self.layout.apply(variances.view_mut());
            Zip::from(&mut lhs_variances)
                .and(&lhs)
                .and(&rhs)
                .and(&rhs_variances)
                .for_each(|va, &a, &b, &vb| *va = op.variance(a, *va, b, vb));
        }
        Zip::from(&mut lhs)
            .and(&rhs)
            .for_each(|a, &b| *a = op.value(*a, b));

        Ok(())
    }

    /// Add a constant to every value in this view. Variances are unchanged.
    pub fn add_scalar(&self, scalar: N) {
        self.apply(|value| value + scalar);
    }

    /// Multiply every value in this view by a constant. Variances scale with its square.
    pub fn mul_scalar(&self, scalar: N) {
        let mut buffer = self.buffer.write();
        let Buffer { values, variances } = &mut *buffer;
        self.layout
            .apply(values.view_mut())
            .mapv_inplace(|value| value * scalar);
        if let Some(variances) = variances.as_mut() {
            self.layout
                .apply(variances.view_mut())
                .mapv_inplace(|variance| variance * scalar * scalar);
        }
    }

    /// Replace every value in this view by `f(value)`. Variances are left as they are.
    pub fn apply<F>(&self, f: F)
    where
        F: Fn(N) -> N,
    {
        let mut buffer = self.buffer.write();
        self.layout.apply(buffer.values.view_mut()).mapv_inplace(f);
    }

    /// New variable with the dims of this view and values `f(value)`. The result has no
    /// variances.
    pub fn map<F>(&self, f: F) -> Variable<N>
    where
        F: Fn(N) -> N,
    {
        let values = self.values().mapv(f);
        Variable::adopt(
            &self.dims(),
            Buffer {
                values,
                variances: None,
            },
        )
    }

    /// Sum over `dim`, which is removed from the result.
    ///
    /// Fails with `DimensionNotFound` if this view doesn't span `dim` and with `EmptyDimension`
    /// if the extent of `dim` is zero.
    ///
    pub fn sum(&self, dim: Dim) -> Result<Variable<N>> {
        let (axis, _) = self.reduction_axis(dim)?;
        let values = self.values().sum_axis(axis);
        let variances = self.variances().map(|variances| variances.sum_axis(axis));

        Ok(Variable::adopt(&self.reduced_dims(dim), Buffer { values, variances }))
    }

    /// Mean over `dim`, which is removed from the result.
    ///
    /// Same failure modes as `sum`.
    ///
    pub fn mean(&self, dim: Dim) -> Result<Variable<N>> {
        let (axis, extent) = self.reduction_axis(dim)?;
        let n: N = count(extent);
        let values = self.values().sum_axis(axis).mapv(|sum| sum / n);
        let variances = self
            .variances()
            .map(|variances| variances.sum_axis(axis).mapv(|sum| sum / (n * n)));

        Ok(Variable::adopt(&self.reduced_dims(dim), Buffer { values, variances }))
    }

    fn reduction_axis(&self, dim: Dim) -> Result<(Axis, usize)> {
        let extent = self.extent(dim)?;
        if extent == 0 {
            return Err(Error::EmptyDimension(dim));
        }
        let position = self
            .dims()
            .iter()
            .position(|&other| other == dim)
            .ok_or(Error::DimensionNotFound(dim))?;

        Ok((Axis(position), extent))
    }

    fn reduced_dims(&self, dim: Dim) -> Vec<Dim> {
        self.dims().into_iter().filter(|&other| other != dim).collect()
    }
}

/// A count as a number of the element type
fn count<N>(n: usize) -> N
where
    N: Element,
{
    N::from(n).unwrap_or_else(N::nan)
}

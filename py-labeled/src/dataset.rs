use numpy::{IntoPyArray, PyArrayDyn};

use pyo3::basic::CompareOp;
use pyo3::prelude::*;

use labeled::{self, ArrayExchange, Key, Variable};

use super::helpers::{bool_array, convert_error, dim_names, float_array, parse_dim, parse_dims};

#[pyclass(name = "Dataset")]
pub struct PyDataset {
    inner: labeled::Dataset,
}

#[pymethods]
impl PyDataset {
    #[new]
    fn new() -> Self {
        Self {
            inner: labeled::Dataset::new(),
        }
    }

    #[pyo3(signature = (dim, values, variances=None))]
    fn set_coord(
        &mut self,
        dim: &str,
        values: &PyAny,
        variances: Option<&PyAny>,
    ) -> PyResult<()> {
        let dim = parse_dim(dim)?;
        let variable = new_variable(vec![dim], values, variances)?;
        self.replace(Key::Coord(dim), variable)
    }

    #[pyo3(signature = (name, dims, values, variances=None))]
    fn set_data(
        &mut self,
        name: &str,
        dims: Vec<String>,
        values: &PyAny,
        variances: Option<&PyAny>,
    ) -> PyResult<()> {
        let variable = new_variable(parse_dims(dims)?, values, variances)?;
        self.replace(Key::value(name), variable)
    }

    fn coord(&self, dim: &str) -> PyResult<PyVariableView> {
        let key = Key::Coord(parse_dim(dim)?);
        PyVariableView::wrap(self.inner.get(&key))
    }

    fn data(&self, name: &str) -> PyResult<PyVariableView> {
        PyVariableView::wrap(self.inner.get(&Key::value(name)))
    }

    fn remove_coord(&mut self, dim: &str) -> PyResult<()> {
        let key = Key::Coord(parse_dim(dim)?);
        self.inner.remove(&key).map_err(convert_error)?;

        Ok(())
    }

    fn remove_data(&mut self, name: &str) -> PyResult<()> {
        self.inner.remove(&Key::value(name)).map_err(convert_error)?;

        Ok(())
    }

    fn insert_mask(&mut self, name: &str, dims: Vec<String>, values: &PyAny) -> PyResult<()> {
        let dims = parse_dims(dims)?;
        self.inner
            .insert_mask(name, &dims, bool_array(values)?)
            .map_err(convert_error)
    }

    /// A copy of the flags of the mask called `name`
    fn mask<'py>(&self, py: Python<'py>, name: &str) -> PyResult<&'py PyArrayDyn<bool>> {
        let mask = self.inner.mask(name).map_err(convert_error)?;

        Ok(mask.values().into_pyarray(py))
    }

    fn remove_mask(&mut self, name: &str) -> PyResult<()> {
        self.inner.remove_mask(name).map_err(convert_error)?;

        Ok(())
    }

    fn add_assign(&mut self, name: &str, other: PyRef<PyDatasetView>) -> PyResult<()> {
        self.inner.add_assign(name, &other.inner).map_err(convert_error)
    }

    fn sub_assign(&mut self, name: &str, other: PyRef<PyDatasetView>) -> PyResult<()> {
        self.inner.sub_assign(name, &other.inner).map_err(convert_error)
    }

    fn mul_assign(&mut self, name: &str, other: PyRef<PyDatasetView>) -> PyResult<()> {
        self.inner.mul_assign(name, &other.inner).map_err(convert_error)
    }

    fn div_assign(&mut self, name: &str, other: PyRef<PyDatasetView>) -> PyResult<()> {
        self.inner.div_assign(name, &other.inner).map_err(convert_error)
    }

    fn view(&self) -> PyDatasetView {
        PyDatasetView {
            inner: self.inner.view(),
        }
    }

    fn slice(&self, dim: &str, index: usize) -> PyResult<PyDatasetView> {
        PyDatasetView::wrap(self.inner.slice(parse_dim(dim)?, index))
    }

    fn slice_range(&self, dim: &str, begin: usize, end: usize) -> PyResult<PyDatasetView> {
        PyDatasetView::wrap(self.inner.slice_range(parse_dim(dim)?, begin, end))
    }

    fn subset(&self, name: &str) -> PyResult<PyDatasetView> {
        PyDatasetView::wrap(self.inner.subset(name))
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn __len__(&self) -> usize {
        self.inner.size()
    }

    fn __contains__(&self, name: &str) -> bool {
        self.inner.keys().any(|key| key.name() == Some(name))
    }

    fn dimensions(&self) -> Vec<(&'static str, usize)> {
        self.inner
            .dimensions()
            .iter()
            .map(|(dim, extent)| (dim.name(), extent))
            .collect()
    }

    fn get_values<'py>(&self, py: Python<'py>, name: &str) -> PyResult<&'py PyArrayDyn<f64>> {
        let values = self
            .inner
            .get_values(&Key::value(name))
            .map_err(convert_error)?;

        Ok(values.into_pyarray(py))
    }

    fn set_values(&self, name: &str, values: &PyAny) -> PyResult<()> {
        self.inner
            .set_values(&Key::value(name), &float_array(values)?)
            .map_err(convert_error)
    }
}

impl PyDataset {
    /// Store `variable` under `key`. An existing variable is replaced in place and keeps its
    /// position.
    fn replace(&mut self, key: Key, variable: Variable) -> PyResult<()> {
        self.inner.replace(key, variable).map_err(convert_error)?;

        Ok(())
    }
}

fn new_variable(
    dims: Vec<labeled::Dim>,
    values: &PyAny,
    variances: Option<&PyAny>,
) -> PyResult<Variable> {
    let values = float_array(values)?;
    let variable = match variances {
        Some(variances) => Variable::with_variances(&dims, values, float_array(variances)?),
        None => Variable::new(&dims, values),
    };

    variable.map_err(convert_error)
}

#[pyclass(name = "DatasetView")]
pub struct PyDatasetView {
    inner: labeled::DatasetView,
}

impl PyDatasetView {
    fn wrap(inner: labeled::Result<labeled::DatasetView>) -> PyResult<Self> {
        Ok(Self {
            inner: inner.map_err(convert_error)?,
        })
    }
}

#[pymethods]
impl PyDatasetView {
    fn coord(&self, dim: &str) -> PyResult<PyVariableView> {
        let key = Key::Coord(parse_dim(dim)?);
        PyVariableView::wrap(self.inner.get(&key))
    }

    fn data(&self, name: &str) -> PyResult<PyVariableView> {
        PyVariableView::wrap(self.inner.get(&Key::value(name)))
    }

    fn slice(&self, dim: &str, index: usize) -> PyResult<Self> {
        Self::wrap(self.inner.slice(parse_dim(dim)?, index))
    }

    fn slice_range(&self, dim: &str, begin: usize, end: usize) -> PyResult<Self> {
        Self::wrap(self.inner.slice_range(parse_dim(dim)?, begin, end))
    }

    fn subset(&self, name: &str) -> PyResult<Self> {
        Self::wrap(self.inner.subset(name))
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn __len__(&self) -> usize {
        self.inner.size()
    }

    fn dimensions(&self) -> Vec<(&'static str, usize)> {
        self.inner
            .dimensions()
            .iter()
            .map(|(dim, extent)| (dim.name(), extent))
            .collect()
    }

    fn get_values<'py>(&self, py: Python<'py>, name: &str) -> PyResult<&'py PyArrayDyn<f64>> {
        let values = self
            .inner
            .get_values(&Key::value(name))
            .map_err(convert_error)?;

        Ok(values.into_pyarray(py))
    }

    fn set_values(&self, name: &str, values: &PyAny) -> PyResult<()> {
        self.inner
            .set_values(&Key::value(name), &float_array(values)?)
            .map_err(convert_error)
    }

    /// A copy of the flags of the mask called `name`, as seen by this view
    fn mask<'py>(&self, py: Python<'py>, name: &str) -> PyResult<&'py PyArrayDyn<bool>> {
        let mask = self.inner.mask(name).map_err(convert_error)?;

        Ok(mask.values().into_pyarray(py))
    }

    fn add_assign(&self, name: &str, other: PyRef<Self>) -> PyResult<()> {
        self.inner.add_assign(name, &other.inner).map_err(convert_error)
    }

    fn sub_assign(&self, name: &str, other: PyRef<Self>) -> PyResult<()> {
        self.inner.sub_assign(name, &other.inner).map_err(convert_error)
    }

    fn mul_assign(&self, name: &str, other: PyRef<Self>) -> PyResult<()> {
        self.inner.mul_assign(name, &other.inner).map_err(convert_error)
    }

    fn div_assign(&self, name: &str, other: PyRef<Self>) -> PyResult<()> {
        self.inner.div_assign(name, &other.inner).map_err(convert_error)
    }

    fn to_dataset(&self) -> PyResult<PyDataset> {
        Ok(PyDataset {
            inner: self.inner.to_dataset().map_err(convert_error)?,
        })
    }
}

#[pyclass(name = "VariableView")]
pub struct PyVariableView {
    inner: labeled::VariableView,
}

impl PyVariableView {
    fn wrap(inner: labeled::Result<labeled::VariableView>) -> PyResult<Self> {
        Ok(Self {
            inner: inner.map_err(convert_error)?,
        })
    }
}

#[pymethods]
impl PyVariableView {
    /// A copy of the values seen by this view
    #[getter]
    fn values<'py>(&self, py: Python<'py>) -> &'py PyArrayDyn<f64> {
        self.inner.values().into_pyarray(py)
    }

    #[getter]
    fn variances<'py>(&self, py: Python<'py>) -> Option<&'py PyArrayDyn<f64>> {
        self.inner
            .variances()
            .map(|variances| variances.into_pyarray(py))
    }

    fn set_values(&self, values: &PyAny) -> PyResult<()> {
        self.inner
            .set_values(&float_array(values)?)
            .map_err(convert_error)
    }

    fn set_variances(&self, variances: &PyAny) -> PyResult<()> {
        self.inner
            .set_variances(&float_array(variances)?)
            .map_err(convert_error)
    }

    #[getter]
    fn dims(&self) -> Vec<&'static str> {
        dim_names(self.inner.dims())
    }

    #[getter]
    fn shape(&self) -> Vec<usize> {
        self.inner.shape()
    }

    fn slice(&self, dim: &str, index: usize) -> PyResult<Self> {
        Self::wrap(self.inner.slice(parse_dim(dim)?, index))
    }

    fn slice_range(&self, dim: &str, begin: usize, end: usize) -> PyResult<Self> {
        Self::wrap(self.inner.slice_range(parse_dim(dim)?, begin, end))
    }

    fn transpose(&self, dims: Vec<String>) -> PyResult<Self> {
        Self::wrap(self.inner.transpose(&parse_dims(dims)?))
    }

    fn sum(&self, dim: &str) -> PyResult<Self> {
        let variable = self.inner.sum(parse_dim(dim)?).map_err(convert_error)?;
        Ok(Self {
            inner: variable.view(),
        })
    }

    fn mean(&self, dim: &str) -> PyResult<Self> {
        let variable = self.inner.mean(parse_dim(dim)?).map_err(convert_error)?;
        Ok(Self {
            inner: variable.view(),
        })
    }

    fn __iadd__(&self, other: PyRef<Self>) -> PyResult<()> {
        self.inner.add_assign(&other.inner).map_err(convert_error)
    }

    fn __isub__(&self, other: PyRef<Self>) -> PyResult<()> {
        self.inner.sub_assign(&other.inner).map_err(convert_error)
    }

    fn __imul__(&self, other: PyRef<Self>) -> PyResult<()> {
        self.inner.mul_assign(&other.inner).map_err(convert_error)
    }

    fn __itruediv__(&self, other: PyRef<Self>) -> PyResult<()> {
        self.inner.div_assign(&other.inner).map_err(convert_error)
    }

    fn __richcmp__(&self, py: Python<'_>, other: PyRef<Self>, op: CompareOp) -> PyObject {
        match op {
            CompareOp::Eq => (self.inner == other.inner).into_py(py),
            CompareOp::Ne => (self.inner != other.inner).into_py(py),
            _ => py.NotImplemented(),
        }
    }
}

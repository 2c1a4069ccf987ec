use ndarray::ArrayD;
use numpy::{Element, PyReadonlyArrayDyn};
use pyo3::exceptions::{PyIndexError, PyKeyError, PyValueError};
use pyo3::prelude::*;

use labeled::{Dim, Error};

pub(crate) fn convert_error(cause: Error) -> PyErr {
    match cause {
        Error::KeyNotFound(_) | Error::DuplicateKey(_) => PyKeyError::new_err(cause.to_string()),
        Error::IndexOutOfRange { .. } => PyIndexError::new_err(cause.to_string()),
        _ => PyValueError::new_err(cause.to_string()),
    }
}

pub(crate) fn parse_dim(name: &str) -> PyResult<Dim> {
    name.parse().map_err(convert_error)
}

pub(crate) fn parse_dims(names: Vec<String>) -> PyResult<Vec<Dim>> {
    names.iter().map(|name| parse_dim(name)).collect()
}

pub(crate) fn dim_names(dims: Vec<Dim>) -> Vec<&'static str> {
    dims.iter().map(|dim| dim.name()).collect()
}

/// Copy `values` into an owned float array. Anything NumPy can turn into a float64 array is
/// accepted: integer arrays, nested lists, scalars.
pub(crate) fn float_array(values: &PyAny) -> PyResult<ArrayD<f64>> {
    owned_array(values, "float64")
}

/// Copy `values` into an owned array of flags, as NumPy would convert them to bool
pub(crate) fn bool_array(values: &PyAny) -> PyResult<ArrayD<bool>> {
    owned_array(values, "bool")
}

fn owned_array<T>(values: &PyAny, dtype: &str) -> PyResult<ArrayD<T>>
where
    T: Element,
{
    if let Ok(array) = values.extract::<PyReadonlyArrayDyn<T>>() {
        return Ok(array.to_owned_array());
    }

    let numpy = values.py().import("numpy")?;
    let converted = numpy.call_method1("asarray", (values, dtype))?;

    Ok(converted.extract::<PyReadonlyArrayDyn<T>>()?.to_owned_array())
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::{arr1, arr2, Array3};
    use pyo3::types::PyList;

    #[test]
    fn test_float_array_from_ints() -> PyResult<()> {
        Python::with_gil(|py| {
            let numpy = py.import("numpy")?;
            let ints = numpy
                .call_method1("arange", (24,))?
                .call_method1("reshape", ((4, 3, 2),))?;
            let array = float_array(ints)?;

            let expected = Array3::from_shape_fn((4, 3, 2), |(z, y, x)| (z * 6 + y * 2 + x) as f64);
            assert_eq!(array, expected.into_dyn());

            Ok(())
        })
    }

    #[test]
    fn test_float_array_from_floats_and_lists() -> PyResult<()> {
        Python::with_gil(|py| {
            let numpy = py.import("numpy")?;
            let floats = numpy.call_method1("linspace", (0.0, 1.0, 3))?;
            assert_eq!(float_array(floats)?, arr1(&[0.0, 0.5, 1.0]).into_dyn());

            let nested = PyList::new(py, [PyList::new(py, [1, 2]), PyList::new(py, [3, 4])]);
            assert_eq!(float_array(nested)?, arr2(&[[1.0, 2.0], [3.0, 4.0]]).into_dyn());

            let text = PyList::new(py, ["a", "b"]);
            assert!(float_array(text).is_err());

            Ok(())
        })
    }

    #[test]
    fn test_bool_array_from_ints() -> PyResult<()> {
        Python::with_gil(|py| {
            let numpy = py.import("numpy")?;
            let ints = numpy.call_method1("array", (vec![0, 1, 0],))?;
            assert_eq!(bool_array(ints)?, arr1(&[false, true, false]).into_dyn());

            Ok(())
        })
    }
}

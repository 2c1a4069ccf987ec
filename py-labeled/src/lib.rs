mod dataset;
mod helpers;

pub use dataset::{PyDataset, PyDatasetView, PyVariableView};

use pyo3::prelude::*;

#[pymodule]
fn _labeled(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyDataset>()?;
    m.add_class::<PyDatasetView>()?;
    m.add_class::<PyVariableView>()?;

    Ok(())
}

use ndarray::{Array1, Array2, Array3, ArrayD, Axis, Slice};

use crate::{dataset::Dataset, dim::Dim, key::Key, variable::Variable};

pub(crate) const LX: usize = 2;
pub(crate) const LY: usize = 3;
pub(crate) const LZ: usize = 4;

/// A dataset together with plain copies of everything that went into it
pub(crate) struct Fixture {
    pub(crate) dataset: Dataset,
    pub(crate) reference: Vec<(Key, Vec<Dim>, ArrayD<f64>)>,
}

impl Fixture {
    /// The reference array for `key`
    pub(crate) fn array(&self, key: &Key) -> &ArrayD<f64> {
        self.reference
            .iter()
            .find(|(other, _, _)| other == key)
            .map(|(_, _, array)| array)
            .expect("no such key in fixture")
    }
}

/// Dataset with X=2, Y=3, Z=4:
///
/// * `data1`: `0..24` over (Z, Y, X)
/// * `data2`: ones over (Z, Y, X)
/// * `data3`: `0..8` over (Z, X)
/// * coordinates X, Y and Z, each counting up from 0
///
pub(crate) fn fixture() -> Fixture {
    let data1 = Array3::from_shape_fn((LZ, LY, LX), |(z, y, x)| (z * LY * LX + y * LX + x) as f64);
    let data2 = Array3::ones((LZ, LY, LX));
    let data3 = Array2::from_shape_fn((LZ, LX), |(z, x)| (z * LX + x) as f64);
    let x = Array1::range(0.0, LX as f64, 1.0);
    let y = Array1::range(0.0, LY as f64, 1.0);
    let z = Array1::range(0.0, LZ as f64, 1.0);

    let reference = vec![
        (Key::value("data1"), vec![Dim::Z, Dim::Y, Dim::X], data1.into_dyn()),
        (Key::value("data2"), vec![Dim::Z, Dim::Y, Dim::X], data2.into_dyn()),
        (Key::value("data3"), vec![Dim::Z, Dim::X], data3.into_dyn()),
        (Key::coord(Dim::X), vec![Dim::X], x.into_dyn()),
        (Key::coord(Dim::Y), vec![Dim::Y], y.into_dyn()),
        (Key::coord(Dim::Z), vec![Dim::Z], z.into_dyn()),
    ];

    let mut dataset = Dataset::new();
    for (key, dims, array) in &reference {
        let variable = Variable::new(dims, array.clone()).expect("bad fixture variable");
        dataset.insert(key.clone(), variable).expect("bad fixture variable");
    }

    Fixture { dataset, reference }
}

/// What point slicing `array` at `dim=index` should give, leaving it alone if `dim` isn't in
/// `dims`.
pub(crate) fn array_slice(array: &ArrayD<f64>, dims: &[Dim], dim: Dim, index: usize) -> ArrayD<f64> {
    match dims.iter().position(|&other| other == dim) {
        Some(axis) => array.index_axis(Axis(axis), index).to_owned(),
        None => array.clone(),
    }
}

/// What range slicing `array` at `dim=begin..end` should give, leaving it alone if `dim` isn't in
/// `dims`.
pub(crate) fn array_slice_range(
    array: &ArrayD<f64>,
    dims: &[Dim],
    dim: Dim,
    begin: usize,
    end: usize,
) -> ArrayD<f64> {
    match dims.iter().position(|&other| other == dim) {
        Some(axis) => array.slice_axis(Axis(axis), Slice::from(begin..end)).to_owned(),
        None => array.clone(),
    }
}

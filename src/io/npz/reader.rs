use std::io::{Read, Seek};

use ndarray::Array3;
use ndarray_npy::ReadNpyExt;
use zip::ZipArchive;

use crate::error::Result;

/// Read one named three-dimensional `f64` array out of an `.npz` archive.
pub fn read_npz_array<R: Read + Seek>(reader: R, name: &str) -> Result<Array3<f64>> {
    let mut archive = ZipArchive::new(reader)?;
    let entry = archive.by_name(&format!("{name}.npy"))?;
    Ok(Array3::<f64>::read_npy(entry)?)
}

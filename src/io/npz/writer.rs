use std::io::{Seek, Write};

use ndarray::Array3;
use ndarray_npy::WriteNpyExt;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::dataset::{Dataset, DatasetArrays};
use crate::error::Result;

/// Write named arrays to a compressed `.npz` archive.
///
/// Entries are written in the given order and stamped with the zip epoch, so the same arrays
/// always produce the same bytes.
pub fn write_npz<W: Write + Seek>(writer: W, arrays: &[(&str, &Array3<f64>)]) -> Result<()> {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut zip = ZipWriter::new(writer);
    for (name, array) in arrays {
        debug!(name, shape = ?array.shape(), "Writing array");
        zip.start_file(format!("{name}.npy"), options)?;
        array.write_npy(&mut zip)?;
    }
    zip.finish()?;
    Ok(())
}

/// Write the arrays of a [`Dataset`] to a compressed `.npz` archive.
pub fn write_dataset<W: Write + Seek>(writer: W, dataset: &Dataset) -> Result<()> {
    write_dataset_arrays(writer, &dataset.to_arrays())
}

pub(crate) fn write_dataset_arrays<W: Write + Seek>(writer: W, arrays: &DatasetArrays) -> Result<()> {
    write_npz(writer, &arrays.named())
}

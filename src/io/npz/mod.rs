//! Read and write NumPy `.npz` archives.
//!
//! An archive is a zip file holding one `.npy` entry per named array, the layout written by
//! `numpy.savez_compressed` and read by `numpy.load`.

pub use reader::read_npz_array;
pub use writer::{write_dataset, write_npz};

mod reader;
mod writer;

//! Readers and writers for the files a vectorization run consumes and produces.

pub mod csv;
pub mod npz;

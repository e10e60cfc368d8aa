//! Read topology rows from CSV files.

pub use reader::{read_csv, CSVReaderOptions};

mod reader;

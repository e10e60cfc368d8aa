//! One end-to-end vectorization run: fetch, read, encode, write.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use itertools::Itertools;
use tracing::info;

use crate::config::VectorizeConfig;
use crate::dataset::{DatasetBuilder, DatasetOptions};
use crate::error::{GeoVectorizeError, Result};
use crate::fetch::DatasetFetcher;
use crate::io::csv::{read_csv, CSVReaderOptions};
use crate::io::npz::write_dataset;

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows read from the input.
    pub num_rows: usize,
    /// Records written, after truncation.
    pub num_records: usize,
    pub sequence_length: usize,
    pub broken_records: Vec<usize>,
    pub output: PathBuf,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vectorized {} of {} rows with sequence length {} into {}",
            self.num_records,
            self.num_rows,
            self.sequence_length,
            self.output.display(),
        )?;
        if self.broken_records.is_empty() {
            write!(f, ", no broken records")
        } else {
            write!(
                f,
                ", {} broken records: {}",
                self.broken_records.len(),
                self.broken_records.iter().join(", ")
            )
        }
    }
}

/// Vectorize the dataset described by `config` and write it to `config.output`.
///
/// The input is fetched through `fetcher` first when it is not present locally.
pub fn run(config: &VectorizeConfig, fetcher: &dyn DatasetFetcher) -> Result<RunSummary> {
    config.validate()?;
    fetcher.fetch(&config.input, config.source_url.as_deref())?;

    info!(path = %config.input.display(), "Loading dataset");
    let file = File::open(&config.input).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => GeoVectorizeError::FileNotFound(config.input.clone()),
        _ => err.into(),
    })?;
    let rows = read_csv(
        BufReader::new(file),
        &config.columns,
        CSVReaderOptions::new(config.batch_size),
    )?;

    let dataset = DatasetBuilder::new(DatasetOptions::new(config.max_wkt_len)).build(&rows);

    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    info!(path = %config.output.display(), "Saving vectorized dataset");
    let mut writer = BufWriter::new(File::create(&config.output)?);
    write_dataset(&mut writer, &dataset)?;
    writer.flush()?;

    Ok(RunSummary {
        num_rows: rows.len(),
        num_records: dataset.len(),
        sequence_length: dataset.sequence_length(),
        broken_records: dataset.broken_records().to_vec(),
        output: config.output.clone(),
    })
}

//! Run configuration, loaded from JSON and overridable from the command line.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GeoVectorizeError, Result};

/// Names of the input columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    pub brt_wkt: String,
    pub osm_wkt: String,
    pub intersection_wkt: String,
    pub centroid_distance: String,
    pub geom_distance: String,
    pub brt_centroid: String,
    pub osm_centroid: String,
    pub brt_centroid_rd: String,
    pub osm_centroid_rd: String,
}

impl ColumnNames {
    /// Columns holding WKT strings.
    pub fn wkt_columns(&self) -> [&str; 7] {
        [
            self.brt_wkt.as_str(),
            self.osm_wkt.as_str(),
            self.intersection_wkt.as_str(),
            self.brt_centroid.as_str(),
            self.osm_centroid.as_str(),
            self.brt_centroid_rd.as_str(),
            self.osm_centroid_rd.as_str(),
        ]
    }

    /// Columns holding numbers.
    pub fn numeric_columns(&self) -> [&str; 2] {
        [self.centroid_distance.as_str(), self.geom_distance.as_str()]
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            brt_wkt: "brt_wkt".to_string(),
            osm_wkt: "osm_wkt".to_string(),
            intersection_wkt: "intersection_wkt".to_string(),
            centroid_distance: "centroid_distance".to_string(),
            geom_distance: "geom_distance".to_string(),
            brt_centroid: "brt_centroid".to_string(),
            osm_centroid: "osm_centroid".to_string(),
            brt_centroid_rd: "brt_centroid_rd".to_string(),
            osm_centroid_rd: "osm_centroid_rd".to_string(),
        }
    }
}

/// Everything one vectorization run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VectorizeConfig {
    /// Input CSV with one geometry pair per row.
    pub input: PathBuf,

    /// Where to fetch `input` from when it does not exist locally.
    pub source_url: Option<String>,

    /// Output archive.
    pub output: PathBuf,

    /// Drop rows whose `brt_wkt;osm_wkt` text is longer than this many characters.
    pub max_wkt_len: Option<usize>,

    /// Number of CSV rows per Arrow batch.
    pub batch_size: usize,

    pub columns: ColumnNames,
}

impl Default for VectorizeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("files/topology-training.csv"),
            source_url: None,
            output: PathBuf::from("files/geodata_vectorized.npz"),
            max_wkt_len: Some(300),
            batch_size: 65_536,
            columns: Default::default(),
        }
    }
}

impl VectorizeConfig {
    /// Load a configuration from a JSON file. Missing keys take their default values.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => GeoVectorizeError::FileNotFound(path.to_path_buf()),
            _ => err.into(),
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(GeoVectorizeError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.max_wkt_len == Some(0) {
            return Err(GeoVectorizeError::InvalidConfig(
                "max_wkt_len must be positive, use null to disable truncation".to_string(),
            ));
        }
        if self.input.as_os_str().is_empty() || self.output.as_os_str().is_empty() {
            return Err(GeoVectorizeError::InvalidConfig(
                "input and output paths must not be empty".to_string(),
            ));
        }
        if self.input == self.output {
            return Err(GeoVectorizeError::InvalidConfig(format!(
                "input and output are the same file: {}",
                self.input.display()
            )));
        }
        Ok(())
    }
}

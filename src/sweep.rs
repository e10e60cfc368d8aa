//! Run the vectorizer once per point of a parameter grid.
//!
//! Every point is merged into a base [`VectorizeConfig`] and handed to a run function as an
//! explicit value. Runs are independent: a failing point is reported in its [`SweepRun`] and
//! the sweep moves on.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::VectorizeConfig;
use crate::error::{GeoVectorizeError, Result};

/// One point of a [`ParameterGrid`]: configuration keys and the values to use for them.
pub type Params = Map<String, Value>;

/// Lists of candidate values per configuration key.
///
/// Keys are kept sorted and the grid is the cartesian product of the value lists, the last
/// key varying fastest. Nested configuration values are addressed with dotted keys such as
/// `columns.brt_wkt`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterGrid(BTreeMap<String, Vec<Value>>);

impl ParameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the candidate values for `key`.
    pub fn with_values(mut self, key: impl Into<String>, values: Vec<Value>) -> Self {
        self.0.insert(key.into(), values);
        self
    }

    /// Load a grid from a JSON object mapping keys to arrays of values.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => GeoVectorizeError::FileNotFound(path.to_path_buf()),
            _ => err.into(),
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Number of points in the grid. An empty grid has exactly one, empty, point.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every point of the grid, in order.
    pub fn points(&self) -> Vec<Params> {
        if self.0.is_empty() {
            return vec![Params::new()];
        }
        let keys: Vec<&String> = self.0.keys().collect();
        self.0
            .values()
            .map(|values| values.iter())
            .multi_cartesian_product()
            .map(|combination| {
                keys.iter()
                    .zip(combination)
                    .map(|(key, value)| ((*key).clone(), value.clone()))
                    .collect()
            })
            .collect()
    }
}

fn set_path(target: &mut Value, key: &str, value: Value) -> Result<()> {
    let mut current = target;
    let mut segments = key.split('.').peekable();
    while let Some(segment) = segments.next() {
        let object = current.as_object_mut().ok_or_else(|| {
            GeoVectorizeError::InvalidConfig(format!("{key}: {segment} is not inside an object"))
        })?;
        if segments.peek().is_none() {
            object.insert(segment.to_string(), value);
            return Ok(());
        }
        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    Err(GeoVectorizeError::InvalidConfig(format!(
        "empty parameter key {key:?}"
    )))
}

/// Merge one grid point into `base`.
///
/// Fails when a key does not name a configuration value, when a value has the wrong type or
/// when the result does not validate.
pub fn apply_params(base: &VectorizeConfig, params: &Params) -> Result<VectorizeConfig> {
    let mut value = serde_json::to_value(base)?;
    for (key, param) in params {
        set_path(&mut value, key, param.clone())?;
    }
    let config: VectorizeConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

/// The outcome of one grid point.
#[derive(Debug)]
pub struct SweepRun<T> {
    pub params: Params,
    pub result: Result<T>,
}

/// Call `run` once per grid point with the point's index and merged configuration.
pub fn sweep<T, F>(base: &VectorizeConfig, grid: &ParameterGrid, mut run: F) -> Vec<SweepRun<T>>
where
    F: FnMut(usize, VectorizeConfig) -> Result<T>,
{
    let points = grid.points();
    let num_points = points.len();
    points
        .into_iter()
        .enumerate()
        .map(|(index, params)| {
            let params_json = Value::Object(params.clone());
            info!(index, num_points, params = %params_json, "Starting sweep run");
            let result = apply_params(base, &params).and_then(|config| run(index, config));
            if let Err(err) = &result {
                warn!(index, %err, "Sweep run failed");
            }
            SweepRun { params, result }
        })
        .collect()
}

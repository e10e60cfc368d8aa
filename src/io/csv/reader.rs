use std::io::{Read, Seek};
use std::sync::Arc;

use arrow_array::{Array, Float64Array, RecordBatch, StringArray};
use arrow_csv::reader::Format;
use arrow_csv::ReaderBuilder;
use arrow_schema::{DataType, Field, Schema};
use tracing::{debug, warn};

use crate::config::ColumnNames;
use crate::error::{GeoVectorizeError, Result};
use crate::record::TopologyRecord;

/// Options for the CSV reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CSVReaderOptions {
    /// The number of rows in each batch.
    pub batch_size: usize,
}

impl CSVReaderOptions {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }
}

impl Default for CSVReaderOptions {
    fn default() -> Self {
        Self::new(65_536)
    }
}

/// Read a CSV file with a header row into [`TopologyRecord`]s.
///
/// Columns are looked up by name, any other column is ignored. Distance columns are read as
/// numbers, an empty distance becomes NaN. Every other column is read as text, an empty cell
/// becomes an empty string.
pub fn read_csv<R: Read + Seek>(
    mut reader: R,
    columns: &ColumnNames,
    options: CSVReaderOptions,
) -> Result<Vec<TopologyRecord>> {
    let format = Format::default().with_header(true);
    let (header, _) = format.infer_schema(&mut reader, Some(0))?;
    let schema = Arc::new(topology_schema(&header, columns));
    for name in columns.wkt_columns().into_iter().chain(columns.numeric_columns()) {
        schema
            .index_of(name)
            .map_err(|_| GeoVectorizeError::MissingColumn(name.to_string()))?;
    }

    reader.rewind()?;
    let csv = ReaderBuilder::new(schema)
        .with_format(format)
        .with_batch_size(options.batch_size)
        .build(reader)?;

    let mut records = vec![];
    for batch in csv {
        let batch = batch?;
        debug!(num_rows = batch.num_rows(), "Read CSV batch");
        push_records(&batch, columns, &mut records)?;
    }
    Ok(records)
}

/// Keep the header's column order, typing the distance columns as Float64 and everything
/// else as Utf8.
fn topology_schema(header: &Schema, columns: &ColumnNames) -> Schema {
    let numeric = columns.numeric_columns();
    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|field| {
            let data_type = if numeric.contains(&field.name().as_str()) {
                DataType::Float64
            } else {
                DataType::Utf8
            };
            Field::new(field.name(), data_type, true)
        })
        .collect();
    Schema::new(fields)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| GeoVectorizeError::MissingColumn(name.to_string()))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| GeoVectorizeError::IncorrectColumnType(name.to_string(), "Utf8"))
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .ok_or_else(|| GeoVectorizeError::MissingColumn(name.to_string()))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| GeoVectorizeError::IncorrectColumnType(name.to_string(), "Float64"))
}

fn string_value(array: &StringArray, i: usize) -> String {
    if array.is_null(i) {
        String::new()
    } else {
        array.value(i).to_string()
    }
}

fn push_records(
    batch: &RecordBatch,
    columns: &ColumnNames,
    records: &mut Vec<TopologyRecord>,
) -> Result<()> {
    let brt_wkt = string_column(batch, &columns.brt_wkt)?;
    let osm_wkt = string_column(batch, &columns.osm_wkt)?;
    let intersection_wkt = string_column(batch, &columns.intersection_wkt)?;
    let centroid_distance = float_column(batch, &columns.centroid_distance)?;
    let geom_distance = float_column(batch, &columns.geom_distance)?;
    let brt_centroid = string_column(batch, &columns.brt_centroid)?;
    let osm_centroid = string_column(batch, &columns.osm_centroid)?;
    let brt_centroid_rd = string_column(batch, &columns.brt_centroid_rd)?;
    let osm_centroid_rd = string_column(batch, &columns.osm_centroid_rd)?;

    let offset = records.len();
    let float_value = |array: &Float64Array, name: &str, i: usize| {
        if array.is_null(i) {
            warn!(row = offset + i, column = name, "Missing value, using NaN");
            f64::NAN
        } else {
            array.value(i)
        }
    };

    let mut batch_records = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        batch_records.push(TopologyRecord {
            brt_wkt: string_value(brt_wkt, i),
            osm_wkt: string_value(osm_wkt, i),
            intersection_wkt: string_value(intersection_wkt, i),
            centroid_distance: float_value(centroid_distance, &columns.centroid_distance, i),
            geom_distance: float_value(geom_distance, &columns.geom_distance, i),
            brt_centroid: string_value(brt_centroid, i),
            osm_centroid: string_value(osm_centroid, i),
            brt_centroid_rd: string_value(brt_centroid_rd, i),
            osm_centroid_rd: string_value(osm_centroid_rd, i),
        });
    }
    records.extend(batch_records);
    Ok(())
}

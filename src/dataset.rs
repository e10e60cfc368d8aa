//! Build an encoded [`Dataset`] out of [`TopologyRecord`] rows.

use ndarray::Array3;
use tracing::{debug, info, warn};

use crate::datatypes::{GeoSequence, GeoVector, GEO_VECTOR_LEN};
use crate::record::{Record, TopologyRecord};
use crate::vectorize::{max_points, vectorize_two_wkts, vectorize_wkt};

/// Options for building a [`Dataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetOptions {
    /// Drop rows whose `brt_wkt;osm_wkt` text is longer than this many characters.
    pub max_wkt_len: Option<usize>,
}

impl DatasetOptions {
    pub fn new(max_wkt_len: Option<usize>) -> Self {
        Self { max_wkt_len }
    }
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self::new(Some(300))
    }
}

/// Encoded records sharing a single sequence length.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    sequence_length: usize,
    broken_records: Vec<usize>,
    num_dropped: usize,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Length `L` of every pair and intersection sequence.
    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    /// Indices, in ascending order, of records holding a placeholder for a geometry that
    /// could not be encoded.
    pub fn broken_records(&self) -> &[usize] {
        &self.broken_records
    }

    /// Number of input rows dropped by the `max_wkt_len` filter.
    pub fn num_dropped(&self) -> usize {
        self.num_dropped
    }

    /// Flatten every record into the arrays written to the archive.
    pub fn to_arrays(&self) -> DatasetArrays {
        let records = &self.records;
        let len = self.sequence_length;
        DatasetArrays {
            input_geoms: stack_sequences(records, len, |r| &r.input_geoms),
            intersection: stack_sequences(records, len, |r| &r.intersection),
            centroid_distance: stack_distances(records, |r| r.centroid_distance),
            geom_distance: stack_distances(records, |r| r.geom_distance),
            brt_centroid: stack_sequences(records, 1, |r| &r.brt_centroid),
            osm_centroid: stack_sequences(records, 1, |r| &r.osm_centroid),
            centroids: stack_sequences(records, 2, |r| &r.centroids),
            centroids_rd: stack_sequences(records, 2, |r| &r.centroids_rd),
        }
    }
}

fn stack_sequences(
    records: &[Record],
    sequence_length: usize,
    sequence: impl Fn(&Record) -> &GeoSequence,
) -> Array3<f64> {
    let mut out = Array3::zeros((records.len(), sequence_length, GEO_VECTOR_LEN));
    for (i, record) in records.iter().enumerate() {
        for (j, vector) in sequence(record).iter().enumerate() {
            for (k, value) in vector.to_array().into_iter().enumerate() {
                out[[i, j, k]] = value;
            }
        }
    }
    out
}

fn stack_distances(records: &[Record], distance: impl Fn(&Record) -> [f64; 2]) -> Array3<f64> {
    let mut out = Array3::zeros((records.len(), 1, 2));
    for (i, record) in records.iter().enumerate() {
        for (k, value) in distance(record).into_iter().enumerate() {
            out[[i, 0, k]] = value;
        }
    }
    out
}

/// The eight arrays of a vectorized dataset, `N` records each.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetArrays {
    /// `N × L × 5`
    pub input_geoms: Array3<f64>,
    /// `N × L × 5`
    pub intersection: Array3<f64>,
    /// `N × 1 × 2`
    pub centroid_distance: Array3<f64>,
    /// `N × 1 × 2`
    pub geom_distance: Array3<f64>,
    /// `N × 1 × 5`
    pub brt_centroid: Array3<f64>,
    /// `N × 1 × 5`
    pub osm_centroid: Array3<f64>,
    /// `N × 2 × 5`
    pub centroids: Array3<f64>,
    /// `N × 2 × 5`
    pub centroids_rd: Array3<f64>,
}

impl DatasetArrays {
    /// Every array with its archive name, in archive order.
    pub fn named(&self) -> [(&'static str, &Array3<f64>); 8] {
        [
            ("input_geoms", &self.input_geoms),
            ("intersection", &self.intersection),
            ("centroid_distance", &self.centroid_distance),
            ("geom_distance", &self.geom_distance),
            ("brt_centroid", &self.brt_centroid),
            ("osm_centroid", &self.osm_centroid),
            ("centroids", &self.centroids),
            ("centroids_rd", &self.centroids_rd),
        ]
    }
}

/// Join two length-1 centroid sequences into one of length 2.
///
/// Only rendered centroids are kept, so a placeholder first centroid lets the second one move
/// up. The first centroid no longer ends the sequence when a second one follows it.
fn join_centroids(first: &GeoSequence, second: &GeoSequence) -> GeoSequence {
    let mut vectors: Vec<GeoVector> = first.iter().copied().filter(GeoVector::is_render).collect();
    let tail: Vec<GeoVector> = second.iter().copied().filter(GeoVector::is_render).collect();
    if !tail.is_empty() {
        if let Some(boundary) = vectors.last_mut() {
            *boundary = boundary.into_ring_end();
        }
    }
    vectors.extend(tail);
    GeoSequence::padded(vectors, 2)
}

/// Encode one centroid point, substituting a placeholder when it cannot be parsed.
fn vectorize_centroid(record_index: usize, column: &str, wkt: &str) -> Option<GeoSequence> {
    match vectorize_wkt(wkt, 1) {
        Ok(seq) => Some(seq),
        Err(err) => {
            warn!(record_index, column, %err, "Creating dummy centroid");
            None
        }
    }
}

/// Encode one row. The flag is set when any part of it had to be replaced by a placeholder.
fn encode_record(record_index: usize, row: &TopologyRecord, sequence_length: usize) -> (Record, bool) {
    let geoms = vectorize_two_wkts(&row.brt_wkt, &row.osm_wkt, sequence_length).and_then(
        |input_geoms| Ok((input_geoms, vectorize_wkt(&row.intersection_wkt, sequence_length)?)),
    );
    let mut broken = false;
    let (input_geoms, intersection) = match geoms {
        Ok(geoms) => geoms,
        Err(err) => {
            warn!(record_index, %err, "Creating dummy record");
            broken = true;
            (
                GeoSequence::degenerate(sequence_length),
                GeoSequence::degenerate(sequence_length),
            )
        }
    };

    let mut centroid = |column: &str, wkt: &str| {
        vectorize_centroid(record_index, column, wkt).unwrap_or_else(|| {
            broken = true;
            GeoSequence::degenerate(1)
        })
    };
    let brt_centroid = centroid("brt_centroid", &row.brt_centroid);
    let osm_centroid = centroid("osm_centroid", &row.osm_centroid);
    let brt_centroid_rd = centroid("brt_centroid_rd", &row.brt_centroid_rd);
    let osm_centroid_rd = centroid("osm_centroid_rd", &row.osm_centroid_rd);

    let record = Record {
        input_geoms,
        intersection,
        centroid_distance: [row.centroid_distance, 0.0],
        geom_distance: [row.geom_distance, 0.0],
        centroids: join_centroids(&brt_centroid, &osm_centroid),
        centroids_rd: join_centroids(&brt_centroid_rd, &osm_centroid_rd),
        brt_centroid,
        osm_centroid,
    };
    (record, broken)
}

/// Builds a [`Dataset`] from input rows.
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    options: DatasetOptions,
}

impl DatasetBuilder {
    pub fn new(options: DatasetOptions) -> Self {
        Self { options }
    }

    /// Filter, size and encode `rows`.
    ///
    /// Rows that fail to encode are kept as placeholders so that every array of the dataset
    /// stays aligned; their indices end up in [`Dataset::broken_records`].
    pub fn build(&self, rows: &[TopologyRecord]) -> Dataset {
        let kept: Vec<&TopologyRecord> = rows
            .iter()
            .filter(|row| match self.options.max_wkt_len {
                Some(max_len) => row.pair_text_len() <= max_len,
                None => true,
            })
            .collect();
        let num_dropped = rows.len() - kept.len();
        info!("{} data points in training set", rows.len());
        info!("{} max length data points in training set", kept.len());

        let brt_wkt: Vec<&str> = kept.iter().map(|row| row.brt_wkt.as_str()).collect();
        let osm_wkt: Vec<&str> = kept.iter().map(|row| row.osm_wkt.as_str()).collect();
        let sequence_length = max_points(&brt_wkt, &osm_wkt).max(1);
        info!(sequence_length, "Vectorizing WKT geometries");

        #[cfg(feature = "rayon")]
        let encoded = par_encode_rows(&kept, sequence_length);
        #[cfg(not(feature = "rayon"))]
        let encoded = encode_rows(&kept, sequence_length);

        Dataset::from_encoded(encoded, sequence_length, num_dropped)
    }
}

#[cfg_attr(all(feature = "rayon", not(test)), allow(dead_code))]
fn encode_rows(rows: &[&TopologyRecord], sequence_length: usize) -> Vec<(Record, bool)> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| encode_record(i, row, sequence_length))
        .collect()
}

#[cfg(feature = "rayon")]
fn par_encode_rows(rows: &[&TopologyRecord], sequence_length: usize) -> Vec<(Record, bool)> {
    use rayon::prelude::*;

    rows.par_iter()
        .enumerate()
        .map(|(i, row)| encode_record(i, row, sequence_length))
        .collect()
}

impl Dataset {
    fn from_encoded(
        encoded: Vec<(Record, bool)>,
        sequence_length: usize,
        num_dropped: usize,
    ) -> Self {
        let mut records = Vec::with_capacity(encoded.len());
        let mut broken_records = vec![];
        for (i, (record, broken)) in encoded.into_iter().enumerate() {
            if broken {
                broken_records.push(i);
            }
            records.push(record);
        }
        debug!(?broken_records, "Finished vectorizing");
        if !broken_records.is_empty() {
            warn!(
                "{} of {} records replaced by placeholders",
                broken_records.len(),
                records.len()
            );
        }

        Dataset {
            records,
            sequence_length,
            broken_records,
            num_dropped,
        }
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;
    use crate::datatypes::{GeoVector, FULL_STOP_INDEX, STOP_INDEX, X_INDEX};
    use crate::test::wkt::*;

    fn row(brt_wkt: &str, osm_wkt: &str, intersection_wkt: &str) -> TopologyRecord {
        TopologyRecord {
            brt_wkt: brt_wkt.to_string(),
            osm_wkt: osm_wkt.to_string(),
            intersection_wkt: intersection_wkt.to_string(),
            centroid_distance: 12.5,
            geom_distance: 3.25,
            brt_centroid: "POINT (5.1 52.3)".to_string(),
            osm_centroid: "POINT (5.2 52.4)".to_string(),
            brt_centroid_rd: "POINT (155000 463000)".to_string(),
            osm_centroid_rd: "POINT (155100 463100)".to_string(),
        }
    }

    #[test]
    fn sequence_length_from_pairs() {
        let rows = vec![
            row(POINT, LINE_STRING, POINT),
            row(POLYGON_WITH_HOLE, MULTI_POINT, EMPTY_COLLECTION),
        ];
        let dataset = DatasetBuilder::default().build(&rows);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.sequence_length(), 12);
        assert!(dataset.broken_records().is_empty());
        assert_eq!(dataset.records()[1].input_geoms.num_points(), 12);
        assert!(dataset.records()[1].intersection.is_degenerate());
    }

    #[test]
    fn broken_record_is_placeholder() {
        let rows = vec![
            row(POINT, LINE_STRING, POINT),
            row(MALFORMED, POINT, POINT),
        ];
        let dataset = DatasetBuilder::default().build(&rows);
        assert_eq!(dataset.broken_records(), &[1]);
        let record = &dataset.records()[1];
        assert_eq!(record.input_geoms, GeoSequence::degenerate(4));
        assert_eq!(record.intersection, GeoSequence::degenerate(4));
        assert_eq!(record.centroid_distance, [12.5, 0.0]);

        let arrays = dataset.to_arrays();
        assert_eq!(arrays.input_geoms[[1, 0, FULL_STOP_INDEX]], 1.0);
        assert_eq!(arrays.input_geoms[[1, 0, X_INDEX]], 0.0);
        assert_eq!(arrays.input_geoms[[1, 1, FULL_STOP_INDEX]], 0.0);
    }

    #[test]
    fn intersection_longer_than_pair() {
        let rows = vec![row(POINT, POINT, POLYGON_WITH_HOLE)];
        let dataset = DatasetBuilder::default().build(&rows);
        assert_eq!(dataset.sequence_length(), 2);
        assert_eq!(dataset.broken_records(), &[0]);
    }

    #[test]
    fn broken_centroid() {
        let mut bad = row(POINT, POINT, POINT);
        bad.osm_centroid_rd = "POINT (1".to_string();
        let dataset = DatasetBuilder::default().build(&[bad]);
        assert_eq!(dataset.broken_records(), &[0]);
        let record = &dataset.records()[0];
        assert!(!record.input_geoms.is_degenerate());
        assert_eq!(
            record.centroids_rd.as_slice(),
            &[
                GeoVector::SequenceEnd {
                    x: 155000.0,
                    y: 463000.0
                },
                GeoVector::EndMarker
            ]
        );
    }

    #[test]
    fn truncation() {
        let long = format!("LINESTRING ({})", vec!["0 0"; 200].join(", "));
        let rows = vec![row(POINT, POINT, POINT), row(&long, POINT, POINT)];

        let dataset = DatasetBuilder::default().build(&rows);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.num_dropped(), 1);
        assert_eq!(dataset.sequence_length(), 2);

        let dataset = DatasetBuilder::new(DatasetOptions::new(None)).build(&rows);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.sequence_length(), 201);
    }

    #[test]
    fn centroid_arrays() {
        let dataset = DatasetBuilder::default().build(&[row(POINT, POINT, POINT)]);
        let arrays = dataset.to_arrays();
        assert_eq!(arrays.brt_centroid.shape(), &[1, 1, GEO_VECTOR_LEN]);
        assert_eq!(arrays.centroids.shape(), &[1, 2, GEO_VECTOR_LEN]);
        assert_eq!(
            arrays.brt_centroid.as_slice().unwrap(),
            &[5.1, 52.3, 1.0, 1.0, 1.0]
        );
        assert_eq!(
            arrays.centroids.as_slice().unwrap(),
            &[5.1, 52.3, 1.0, 1.0, 0.0, 5.2, 52.4, 1.0, 1.0, 1.0]
        );
        assert_eq!(arrays.centroids_rd[[0, 0, STOP_INDEX]], 1.0);
        assert_eq!(arrays.centroids_rd[[0, 0, FULL_STOP_INDEX]], 0.0);
        assert_relative_eq!(arrays.centroids_rd[[0, 1, X_INDEX]], 155100.0);
        assert_eq!(arrays.centroid_distance.shape(), &[1, 1, 2]);
        assert_eq!(arrays.geom_distance.as_slice().unwrap(), &[3.25, 0.0]);
    }

    #[test]
    fn empty_input() {
        let dataset = DatasetBuilder::default().build(&[]);
        assert!(dataset.is_empty());
        assert_eq!(dataset.sequence_length(), 1);
        let arrays = dataset.to_arrays();
        assert_eq!(arrays.input_geoms.shape(), &[0, 1, GEO_VECTOR_LEN]);
    }

    #[test]
    fn missing_first_centroid_moves_second_up() {
        let mut bad = row(POINT, POINT, POINT);
        bad.brt_centroid = "POINT (0 0".to_string();
        bad.brt_centroid_rd = "POINT EMPTY".to_string();
        let dataset = DatasetBuilder::default().build(&[bad]);
        assert_eq!(dataset.broken_records(), &[0]);

        let arrays = dataset.to_arrays();
        assert_eq!(
            arrays.centroids.as_slice().unwrap(),
            &[5.2, 52.4, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(
            arrays.centroids_rd.as_slice().unwrap(),
            &[155100.0, 463100.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(
            arrays.brt_centroid.as_slice().unwrap(),
            &[0.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn both_centroids_missing() {
        let joined = join_centroids(&GeoSequence::degenerate(1), &GeoSequence::degenerate(1));
        assert_eq!(joined, GeoSequence::degenerate(2));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_matches_sequential() {
        use std::io::Cursor;

        use crate::config::ColumnNames;
        use crate::io::csv::read_csv;
        use crate::io::npz::write_dataset;
        use crate::test::csv::TOPOLOGY_CSV;

        let rows = read_csv(
            Cursor::new(TOPOLOGY_CSV),
            &ColumnNames::default(),
            Default::default(),
        )
        .unwrap();
        let rows: Vec<TopologyRecord> = rows.iter().cycle().take(400).cloned().collect();
        let kept: Vec<&TopologyRecord> = rows.iter().collect();

        let parallel = DatasetBuilder::default().build(&rows);
        let sequential = Dataset::from_encoded(
            encode_rows(&kept, parallel.sequence_length()),
            parallel.sequence_length(),
            0,
        );
        assert_eq!(parallel.broken_records(), sequential.broken_records());
        assert_eq!(parallel.to_arrays(), sequential.to_arrays());

        let mut parallel_bytes = Cursor::new(vec![]);
        let mut sequential_bytes = Cursor::new(vec![]);
        write_dataset(&mut parallel_bytes, &parallel).unwrap();
        write_dataset(&mut sequential_bytes, &sequential).unwrap();
        assert_eq!(parallel_bytes.into_inner(), sequential_bytes.into_inner());
    }
}

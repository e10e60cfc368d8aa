//! Encode WKT geometries into fixed-length [`GeoSequence`]s.
//!
//! Every coordinate becomes one [`GeoVector`]. The last coordinate of each ring or part is a
//! [`GeoVector::RingEnd`], the last coordinate of the whole sequence is a
//! [`GeoVector::SequenceEnd`]. Shorter sequences are padded up to the requested length, with
//! the first padding slot acting as an explicit [`GeoVector::EndMarker`].
//!
//! ```
//! use geovectorize::datatypes::GeoVector;
//! use geovectorize::vectorize::vectorize_wkt;
//!
//! let seq = vectorize_wkt("POINT (1 2)", 3).unwrap();
//! assert_eq!(
//!     seq.as_slice(),
//!     &[
//!         GeoVector::SequenceEnd { x: 1.0, y: 2.0 },
//!         GeoVector::EndMarker,
//!         GeoVector::Padding,
//!     ]
//! );
//! ```

mod parts;

pub use parts::{num_points, parse_wkt, GeometryParts};

use crate::datatypes::{GeoSequence, GeoVector};
use crate::error::{GeoVectorizeError, Result};

/// The fixed sequence length needed to hold every pair of geometries.
///
/// This is the maximum over all records of the point count of `a[i]` plus the point count of
/// `b[i]`. A string that fails to parse counts as zero points. When the series differ in
/// length, only the records present in both are considered.
pub fn max_points<A, B>(series_a: &[A], series_b: &[B]) -> usize
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    series_a
        .iter()
        .zip(series_b)
        .map(|(a, b)| {
            num_points(a.as_ref()).unwrap_or(0) + num_points(b.as_ref()).unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}

/// Encode parts without padding. The final coordinate, if any, is a sequence end.
fn encode_parts(parts: &GeometryParts) -> Vec<GeoVector> {
    let mut out = Vec::with_capacity(parts.num_coords());
    for part in parts.parts() {
        let num_coords = part.len();
        out.extend(part.iter().enumerate().map(|(i, &(x, y))| {
            if i + 1 == num_coords {
                GeoVector::RingEnd { x, y }
            } else {
                GeoVector::Coordinate { x, y }
            }
        }));
    }

    if let Some(GeoVector::RingEnd { x, y }) = out.last().copied() {
        out.pop();
        out.push(GeoVector::SequenceEnd { x, y });
    }
    out
}

fn pad(vectors: Vec<GeoVector>, sequence_length: usize) -> Result<GeoSequence> {
    if vectors.len() > sequence_length {
        return Err(GeoVectorizeError::SequenceTooLong {
            num_points: vectors.len(),
            sequence_length,
        });
    }
    Ok(GeoSequence::padded(vectors, sequence_length))
}

/// Encode a single WKT geometry into a sequence of exactly `sequence_length` vectors.
///
/// An empty geometry encodes to an end marker followed by padding. Fails when the string is
/// not valid WKT, the geometry type has no encoding or the geometry has more coordinates than
/// `sequence_length`.
pub fn vectorize_wkt(wkt: &str, sequence_length: usize) -> Result<GeoSequence> {
    let parts = GeometryParts::from_wkt(wkt)?;
    pad(encode_parts(&parts), sequence_length)
}

/// Encode two WKT geometries into one sequence of exactly `sequence_length` vectors.
///
/// The last coordinate of `wkt_a` marks the boundary between the two geometries: it carries
/// STOP but not FULL_STOP. Only the last coordinate of `wkt_b` ends the sequence, unless
/// `wkt_b` is empty.
pub fn vectorize_two_wkts(wkt_a: &str, wkt_b: &str, sequence_length: usize) -> Result<GeoSequence> {
    let mut vectors = encode_parts(&GeometryParts::from_wkt(wkt_a)?);
    let tail = encode_parts(&GeometryParts::from_wkt(wkt_b)?);
    if !tail.is_empty() {
        if let Some(boundary) = vectors.last_mut() {
            *boundary = boundary.into_ring_end();
        }
    }
    vectors.extend(tail);
    pad(vectors, sequence_length)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::datatypes::{FULL_STOP_INDEX, GEO_VECTOR_LEN, STOP_INDEX};
    use crate::test::wkt::*;

    fn full_stops(seq: &GeoSequence) -> Vec<usize> {
        seq.iter()
            .enumerate()
            .filter(|(_, v)| v.is_full_stop())
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn point_with_padding() {
        let seq = vectorize_wkt("POINT(1 2)", 3).unwrap();
        let arr = seq.to_array2();
        assert_eq!(arr.row(0).to_vec(), vec![1.0, 2.0, 1.0, 1.0, 1.0]);
        assert_eq!(arr.row(1).to_vec(), vec![0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(arr.row(2).to_vec(), vec![0.0; GEO_VECTOR_LEN]);
    }

    #[test]
    fn exact_fit_has_no_padding() {
        let seq = vectorize_wkt(LINE_STRING, 3).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.as_slice()[2], GeoVector::SequenceEnd { x: 2.0, y: 0.0 });
        assert_eq!(full_stops(&seq), vec![2]);
    }

    #[test]
    fn one_rendered_full_stop() {
        for wkt in [POINT, LINE_STRING, POLYGON_WITH_HOLE, MULTI_POLYGON, GEOMETRY_COLLECTION] {
            let len = num_points(wkt).unwrap();
            for sequence_length in [len, len + 1, len + 7] {
                let seq = vectorize_wkt(wkt, sequence_length).unwrap();
                assert_eq!(seq.len(), sequence_length);
                assert_eq!(seq.num_points(), len);
                let rendered_full_stops = seq
                    .iter()
                    .filter(|v| v.is_render() && v.is_full_stop())
                    .count();
                assert_eq!(rendered_full_stops, 1, "{wkt} with length {sequence_length}");
                assert!(seq.as_slice()[len - 1].is_full_stop());
                if len < sequence_length {
                    assert_eq!(seq.as_slice()[len], GeoVector::EndMarker);
                    assert_eq!(full_stops(&seq), vec![len - 1, len]);
                }
            }
        }
    }

    #[test]
    fn ring_ends_are_stops() {
        let seq = vectorize_wkt(POLYGON_WITH_HOLE, 12).unwrap();
        let arr = seq.to_array2();
        let stops: Vec<usize> = (0..seq.len())
            .filter(|&i| arr[[i, STOP_INDEX]] == 1.0)
            .collect();
        assert_eq!(stops, vec![4, 9]);
        assert_eq!(arr[[9, FULL_STOP_INDEX]], 1.0);
        assert_eq!(arr[[4, FULL_STOP_INDEX]], 0.0);
        assert_eq!(seq.parts().len(), 2);
    }

    #[test]
    fn too_long() {
        let err = vectorize_wkt(POLYGON_WITH_HOLE, 4).unwrap_err();
        assert!(matches!(
            err,
            GeoVectorizeError::SequenceTooLong {
                num_points: 10,
                sequence_length: 4
            }
        ));
    }

    #[test]
    fn failures() {
        assert!(matches!(
            vectorize_wkt(MALFORMED, 10),
            Err(GeoVectorizeError::WktStrError(_))
        ));
        assert!(vectorize_two_wkts(POINT, MALFORMED, 10).is_err());
        assert!(vectorize_two_wkts(MALFORMED, POINT, 10).is_err());
    }

    #[test]
    fn empty_geometries() {
        assert_eq!(
            vectorize_wkt("POINT EMPTY", 3).unwrap(),
            GeoSequence::degenerate(3)
        );
        assert_eq!(
            vectorize_wkt(EMPTY_COLLECTION, 1).unwrap(),
            GeoSequence::degenerate(1)
        );

        let seq = vectorize_two_wkts("LINESTRING EMPTY", POINT, 3).unwrap();
        assert_eq!(seq.as_slice()[0], GeoVector::SequenceEnd { x: 1.0, y: 2.0 });
        assert_eq!(seq.as_slice()[1], GeoVector::EndMarker);

        let seq = vectorize_two_wkts(POINT, EMPTY_COLLECTION, 2).unwrap();
        assert_eq!(seq.as_slice()[0], GeoVector::SequenceEnd { x: 1.0, y: 2.0 });
        assert_eq!(seq.as_slice()[1], GeoVector::EndMarker);
    }

    #[test]
    fn pair_boundary() {
        let seq = vectorize_two_wkts(LINE_STRING, POINT, 6).unwrap();
        let v = seq.as_slice();
        assert_eq!(v[0], GeoVector::Coordinate { x: 0.0, y: 0.0 });
        assert_eq!(v[2], GeoVector::RingEnd { x: 2.0, y: 0.0 });
        assert_eq!(v[3], GeoVector::SequenceEnd { x: 1.0, y: 2.0 });
        assert_eq!(v[4], GeoVector::EndMarker);
        assert_eq!(v[5], GeoVector::Padding);
        assert_eq!(
            seq.iter()
                .filter(|v| v.is_render() && v.is_full_stop())
                .count(),
            1
        );
        assert_eq!(seq.parts(), vec![vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)], vec![(1.0, 2.0)]]);
    }

    #[test]
    fn pair_exact_fit() {
        let seq = vectorize_two_wkts(POINT, LINE_STRING, 4).unwrap();
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.as_slice()[0], GeoVector::RingEnd { x: 1.0, y: 2.0 });
        assert_eq!(full_stops(&seq), vec![3]);
        assert!(vectorize_two_wkts(POINT, LINE_STRING, 3).is_err());
    }

    #[test]
    fn idempotent() {
        let a = vectorize_two_wkts(MULTI_POLYGON, POLYGON_WITH_HOLE, 30).unwrap();
        let b = vectorize_two_wkts(MULTI_POLYGON, POLYGON_WITH_HOLE, 30).unwrap();
        assert_eq!(a.to_array2(), b.to_array2());
    }

    #[test]
    fn max_points_is_pairwise_sum() {
        let a = [POINT, POLYGON_WITH_HOLE, MALFORMED];
        let b = [LINE_STRING, POINT, MULTI_POLYGON];
        assert_eq!(max_points(&a, &b), 11);

        let a = [MALFORMED];
        let b = [MULTI_POLYGON];
        assert_eq!(max_points(&a, &b), 8);

        let empty: [&str; 0] = [];
        assert_eq!(max_points(&empty, &empty), 0);
    }

    #[test]
    fn max_points_fits_every_pair() {
        let a = [POINT, LINE_STRING, MULTI_POINT];
        let b = [GEOMETRY_COLLECTION, POLYGON_WITH_HOLE, POINT];
        let len = max_points(&a, &b);
        for (wkt_a, wkt_b) in a.iter().zip(&b) {
            assert!(len >= num_points(wkt_a).unwrap());
            assert!(len >= num_points(wkt_b).unwrap());
            assert_eq!(vectorize_two_wkts(wkt_a, wkt_b, len).unwrap().len(), len);
        }
    }
}

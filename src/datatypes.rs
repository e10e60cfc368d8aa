//! Per-point feature vectors and the fixed-length sequences built from them.

use ndarray::Array2;

/// Position of the x coordinate in a flattened feature vector.
pub const X_INDEX: usize = 0;
/// Position of the y coordinate in a flattened feature vector.
pub const Y_INDEX: usize = 1;
/// Set for coordinates that belong to the geometry, as opposed to padding.
pub const RENDER_INDEX: usize = 2;
/// Set on the last coordinate of a ring, part or input geometry.
pub const STOP_INDEX: usize = 3;
/// Set where the whole sequence ends.
pub const FULL_STOP_INDEX: usize = 4;
/// Width of a flattened feature vector.
pub const GEO_VECTOR_LEN: usize = 5;

/// One slot of an encoded sequence.
///
/// The flag layout only exists at the storage boundary, see [`GeoVector::to_array`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoVector {
    /// A drawn coordinate inside a ring or part.
    Coordinate { x: f64, y: f64 },

    /// The last coordinate of a ring, part or input geometry.
    RingEnd { x: f64, y: f64 },

    /// The last real coordinate of the sequence.
    SequenceEnd { x: f64, y: f64 },

    /// The first slot after the real data. Zero coordinates, FULL_STOP set.
    EndMarker,

    /// All-zero filler.
    Padding,
}

impl GeoVector {
    /// The (x, y) pair of a rendered slot.
    pub fn coord(&self) -> Option<(f64, f64)> {
        match *self {
            GeoVector::Coordinate { x, y }
            | GeoVector::RingEnd { x, y }
            | GeoVector::SequenceEnd { x, y } => Some((x, y)),
            GeoVector::EndMarker | GeoVector::Padding => None,
        }
    }

    pub fn is_render(&self) -> bool {
        self.coord().is_some()
    }

    pub fn is_stop(&self) -> bool {
        matches!(
            self,
            GeoVector::RingEnd { .. } | GeoVector::SequenceEnd { .. }
        )
    }

    pub fn is_full_stop(&self) -> bool {
        matches!(self, GeoVector::SequenceEnd { .. } | GeoVector::EndMarker)
    }

    /// Turn a sequence end into a plain ring end, leaving every other kind untouched.
    ///
    /// Used where two encoded pieces are joined and only the second may end the sequence.
    pub fn into_ring_end(self) -> Self {
        match self {
            GeoVector::SequenceEnd { x, y } => GeoVector::RingEnd { x, y },
            other => other,
        }
    }

    /// Flatten into the numeric layout described by the `*_INDEX` constants.
    pub fn to_array(&self) -> [f64; GEO_VECTOR_LEN] {
        let mut out = [0.0; GEO_VECTOR_LEN];
        if let Some((x, y)) = self.coord() {
            out[X_INDEX] = x;
            out[Y_INDEX] = y;
            out[RENDER_INDEX] = 1.0;
        }
        if self.is_stop() {
            out[STOP_INDEX] = 1.0;
        }
        if self.is_full_stop() {
            out[FULL_STOP_INDEX] = 1.0;
        }
        out
    }

    /// Read a flattened vector back. Flags are considered set when non-zero.
    ///
    /// Panics if `values` is shorter than [`GEO_VECTOR_LEN`].
    pub fn from_array(values: &[f64]) -> Self {
        let x = values[X_INDEX];
        let y = values[Y_INDEX];
        let render = values[RENDER_INDEX] != 0.0;
        let stop = values[STOP_INDEX] != 0.0;
        let full_stop = values[FULL_STOP_INDEX] != 0.0;
        match (render, stop, full_stop) {
            (true, _, true) => GeoVector::SequenceEnd { x, y },
            (true, true, false) => GeoVector::RingEnd { x, y },
            (true, false, false) => GeoVector::Coordinate { x, y },
            (false, _, true) => GeoVector::EndMarker,
            (false, _, false) => GeoVector::Padding,
        }
    }
}

/// A fixed-length sequence of [`GeoVector`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoSequence(Vec<GeoVector>);

impl GeoSequence {
    /// Pad encoded data up to `sequence_length`.
    ///
    /// The slot right after the data becomes an [`GeoVector::EndMarker`] when there is room
    /// for one.
    pub(crate) fn padded(mut vectors: Vec<GeoVector>, sequence_length: usize) -> Self {
        debug_assert!(vectors.len() <= sequence_length);
        if vectors.len() < sequence_length {
            vectors.push(GeoVector::EndMarker);
            vectors.resize(sequence_length, GeoVector::Padding);
        }
        Self(vectors)
    }

    /// Placeholder for a record that could not be encoded: an end marker followed by
    /// padding. A zero `sequence_length` still yields the end marker.
    pub fn degenerate(sequence_length: usize) -> Self {
        Self::padded(vec![], sequence_length.max(1))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeoVector> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[GeoVector] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<GeoVector> {
        self.0
    }

    /// Number of rendered slots.
    pub fn num_points(&self) -> usize {
        self.0.iter().filter(|v| v.is_render()).count()
    }

    /// Whether this is a placeholder without any real coordinate.
    pub fn is_degenerate(&self) -> bool {
        matches!(self.0.first(), Some(GeoVector::EndMarker))
    }

    /// Split the rendered coordinates back into parts at every STOP.
    pub fn parts(&self) -> Vec<Vec<(f64, f64)>> {
        let mut parts = vec![];
        let mut current = vec![];
        for vector in &self.0 {
            if let Some(coord) = vector.coord() {
                current.push(coord);
            }
            if vector.is_stop() {
                parts.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            parts.push(current);
        }
        parts
    }

    /// Flatten into an `L × GEO_VECTOR_LEN` array.
    pub fn to_array2(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.0.len(), GEO_VECTOR_LEN));
        for (mut row, vector) in out.rows_mut().into_iter().zip(&self.0) {
            for (cell, value) in row.iter_mut().zip(vector.to_array()) {
                *cell = value;
            }
        }
        out
    }

    /// Read an `L × GEO_VECTOR_LEN` array back.
    pub fn from_array2(array: &Array2<f64>) -> Self {
        Self(
            array
                .rows()
                .into_iter()
                .map(|row| GeoVector::from_array(&row.to_vec()))
                .collect(),
        )
    }
}

impl From<GeoSequence> for Vec<GeoVector> {
    fn from(value: GeoSequence) -> Self {
        value.0
    }
}

impl AsRef<[GeoVector]> for GeoSequence {
    fn as_ref(&self) -> &[GeoVector] {
        &self.0
    }
}

//! Input rows and their encoded form.

use crate::datatypes::GeoSequence;

/// One input row: a pair of geometries with their intersection, distances and centroids.
///
/// `brt_*` fields describe the first geometry and `osm_*` fields the second. Centroids come
/// as WKT points, once in geographic coordinates and once in RD coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyRecord {
    pub brt_wkt: String,
    pub osm_wkt: String,
    pub intersection_wkt: String,
    pub centroid_distance: f64,
    pub geom_distance: f64,
    pub brt_centroid: String,
    pub osm_centroid: String,
    pub brt_centroid_rd: String,
    pub osm_centroid_rd: String,
}

impl TopologyRecord {
    /// Length in characters of the pair joined as `brt_wkt;osm_wkt`.
    pub fn pair_text_len(&self) -> usize {
        self.brt_wkt.chars().count() + 1 + self.osm_wkt.chars().count()
    }
}

/// One encoded row of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Both input geometries, sequence length `L`.
    pub input_geoms: GeoSequence,

    /// Intersection geometry, sequence length `L`.
    pub intersection: GeoSequence,

    /// `[distance, reserved]`. The reserved slot is always zero.
    pub centroid_distance: [f64; 2],

    /// `[distance, reserved]`. The reserved slot is always zero.
    pub geom_distance: [f64; 2],

    /// Geographic centroid of the first geometry, sequence length 1.
    pub brt_centroid: GeoSequence,

    /// Geographic centroid of the second geometry, sequence length 1.
    pub osm_centroid: GeoSequence,

    /// Both geographic centroids, sequence length 2.
    pub centroids: GeoSequence,

    /// Both RD centroids, sequence length 2.
    pub centroids_rd: GeoSequence,
}

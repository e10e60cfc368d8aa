use std::str::FromStr;

use geo_traits::{
    CoordTrait, GeometryCollectionTrait, GeometryTrait, GeometryType, LineStringTrait,
    MultiLineStringTrait, MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait,
};
use wkt::Wkt;

use crate::error::{GeoVectorizeError, Result};

/// Parse a WKT string into a [`Wkt`] geometry.
pub fn parse_wkt(s: &str) -> Result<Wkt<f64>> {
    Wkt::from_str(s).map_err(GeoVectorizeError::WktStrError)
}

/// The coordinates of a geometry, grouped into the rings and parts it is drawn from.
///
/// A point is one part, a line string is one part and every polygon ring is one part.
/// Multi-geometries and collections contribute the parts of their members in the order they
/// appear. Members without coordinates contribute nothing. Only x and y are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryParts {
    parts: Vec<Vec<(f64, f64)>>,
}

impl GeometryParts {
    pub fn from_geometry(geometry: &impl GeometryTrait<T = f64>) -> Result<Self> {
        let mut out = Self::default();
        out.add_geometry(geometry)?;
        Ok(out)
    }

    pub fn from_wkt(s: &str) -> Result<Self> {
        Self::from_geometry(&parse_wkt(s)?)
    }

    pub fn parts(&self) -> &[Vec<(f64, f64)>] {
        &self.parts
    }

    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    /// Total number of coordinates over all parts.
    pub fn num_coords(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    fn push_part(&mut self, part: Vec<(f64, f64)>) {
        if !part.is_empty() {
            self.parts.push(part);
        }
    }

    fn add_point(&mut self, point: &impl PointTrait<T = f64>) {
        if let Some(coord) = point.coord() {
            self.push_part(vec![(coord.x(), coord.y())]);
        }
    }

    fn add_line_string(&mut self, line_string: &impl LineStringTrait<T = f64>) {
        self.push_part(
            line_string
                .coords()
                .map(|coord| (coord.x(), coord.y()))
                .collect(),
        );
    }

    fn add_polygon(&mut self, polygon: &impl PolygonTrait<T = f64>) {
        if let Some(exterior) = polygon.exterior() {
            self.add_line_string(&exterior);
        }
        for interior in polygon.interiors() {
            self.add_line_string(&interior);
        }
    }

    fn add_multi_point(&mut self, multi_point: &impl MultiPointTrait<T = f64>) {
        for point in multi_point.points() {
            self.add_point(&point);
        }
    }

    fn add_multi_line_string(&mut self, multi_line_string: &impl MultiLineStringTrait<T = f64>) {
        for line_string in multi_line_string.line_strings() {
            self.add_line_string(&line_string);
        }
    }

    fn add_multi_polygon(&mut self, multi_polygon: &impl MultiPolygonTrait<T = f64>) {
        for polygon in multi_polygon.polygons() {
            self.add_polygon(&polygon);
        }
    }

    fn add_geometry_collection(
        &mut self,
        geometry_collection: &impl GeometryCollectionTrait<T = f64>,
    ) -> Result<()> {
        for geometry in geometry_collection.geometries() {
            self.add_geometry(&geometry)?;
        }
        Ok(())
    }

    fn add_geometry(&mut self, geometry: &impl GeometryTrait<T = f64>) -> Result<()> {
        use GeometryType::*;

        match geometry.as_type() {
            Point(g) => self.add_point(g),
            LineString(g) => self.add_line_string(g),
            Polygon(g) => self.add_polygon(g),
            MultiPoint(g) => self.add_multi_point(g),
            MultiLineString(g) => self.add_multi_line_string(g),
            MultiPolygon(g) => self.add_multi_polygon(g),
            GeometryCollection(g) => self.add_geometry_collection(g)?,
            Rect(_) => return Err(GeoVectorizeError::UnsupportedGeometry("Rect")),
            Triangle(_) => return Err(GeoVectorizeError::UnsupportedGeometry("Triangle")),
            Line(_) => return Err(GeoVectorizeError::UnsupportedGeometry("Line")),
        }
        Ok(())
    }
}

/// Count the coordinates of a WKT geometry.
pub fn num_points(s: &str) -> Result<usize> {
    Ok(GeometryParts::from_wkt(s)?.num_coords())
}

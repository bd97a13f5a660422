//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec la feature `reproject`.

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use proj::Proj;

use crate::GeoLoadError;

/// Reprojection de géométries entre deux systèmes de coordonnées
pub struct Reprojector {
    proj: Proj,
    source: String,
    target: String,
}

impl Reprojector {
    /// Crée un reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, GeoLoadError> {
        Self::from_definitions(
            &format!("EPSG:{}", source_epsg),
            &format!("EPSG:{}", target_epsg),
        )
    }

    /// Crée un reprojector depuis des définitions quelconques (WKT, chaîne PROJ, EPSG:n)
    pub fn from_definitions(source: &str, target: &str) -> Result<Self, GeoLoadError> {
        let proj = Proj::new_known_crs(source, target, None).map_err(|e| {
            GeoLoadError::Reproject(format!(
                "Failed to create projection from {} to {}: {}",
                source, target, e
            ))
        })?;

        Ok(Self {
            proj,
            source: source.to_string(),
            target: target.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, GeoLoadError> {
        match geom {
            Geometry::Point(p) => {
                let (x, y) = self.transform_coord(p.0)?;
                Ok(Geometry::Point(Point::new(x, y)))
            }
            Geometry::LineString(ls) => Ok(Geometry::LineString(self.transform_linestring(ls)?)),
            Geometry::Polygon(p) => Ok(Geometry::Polygon(self.transform_polygon(p)?)),
            Geometry::MultiPoint(mp) => {
                let points: Result<Vec<Point>, GeoLoadError> =
                    mp.0.iter()
                        .map(|p| {
                            let (x, y) = self.transform_coord(p.0)?;
                            Ok(Point::new(x, y))
                        })
                        .collect();
                Ok(Geometry::MultiPoint(MultiPoint::new(points?)))
            }
            Geometry::MultiLineString(mls) => {
                let lines: Result<Vec<LineString>, GeoLoadError> = mls
                    .0
                    .iter()
                    .map(|ls| self.transform_linestring(ls))
                    .collect();
                Ok(Geometry::MultiLineString(MultiLineString::new(lines?)))
            }
            Geometry::MultiPolygon(mp) => {
                let polys: Result<Vec<Polygon>, GeoLoadError> =
                    mp.0.iter().map(|p| self.transform_polygon(p)).collect();
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polys?)))
            }
            Geometry::GeometryCollection(gc) => {
                let geoms: Result<Vec<Geometry>, GeoLoadError> =
                    gc.0.iter().map(|g| self.transform_geometry(g)).collect();
                Ok(Geometry::GeometryCollection(GeometryCollection::new_from(
                    geoms?,
                )))
            }
            // Line, Rect, Triangle : la reprojection ne conserve pas leur forme
            Geometry::Line(line) => {
                let ls = LineString::new(vec![line.start, line.end]);
                Ok(Geometry::LineString(self.transform_linestring(&ls)?))
            }
            Geometry::Rect(rect) => Ok(Geometry::Polygon(self.transform_polygon(&rect.to_polygon())?)),
            Geometry::Triangle(tri) => {
                Ok(Geometry::Polygon(self.transform_polygon(&tri.to_polygon())?))
            }
        }
    }

    fn transform_coord(&self, coord: Coord) -> Result<(f64, f64), GeoLoadError> {
        self.proj
            .convert((coord.x, coord.y))
            .map_err(|e| GeoLoadError::Reproject(format!("Coordinate transformation failed: {}", e)))
    }

    /// Transforme une LineString (conversion batch)
    fn transform_linestring(&self, ls: &LineString) -> Result<LineString, GeoLoadError> {
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

        self.proj.convert_array(&mut coords).map_err(|e| {
            GeoLoadError::Reproject(format!("Batch coordinate transformation failed: {}", e))
        })?;

        Ok(LineString::new(
            coords.into_iter().map(|(x, y)| Coord { x, y }).collect(),
        ))
    }

    fn transform_polygon(&self, p: &Polygon) -> Result<Polygon, GeoLoadError> {
        let exterior = self.transform_linestring(p.exterior())?;
        let interiors: Result<Vec<LineString>, GeoLoadError> = p
            .interiors()
            .iter()
            .map(|ls| self.transform_linestring(ls))
            .collect();
        Ok(Polygon::new(exterior, interiors?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_british_grid_to_wgs84() {
        // Londres (Trafalgar Square) en British National Grid
        let reprojector = Reprojector::new(27700, 4326).unwrap();
        let point = Geometry::Point(Point::new(530034.0, 180381.0));

        let Geometry::Point(p) = reprojector.transform_geometry(&point).unwrap() else {
            panic!("Expected Point geometry");
        };
        assert!((p.x() - (-0.128)).abs() < 0.01, "lon={}", p.x());
        assert!((p.y() - 51.508).abs() < 0.01, "lat={}", p.y());
    }

    #[test]
    fn test_invalid_epsg() {
        assert!(Reprojector::new(99999, 4326).is_err());
    }
}

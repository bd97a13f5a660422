//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Projections supportées, en source comme en cible :
//! - WGS84 géographique (EPSG:4326)
//! - Web Mercator (EPSG:3857)
//! - Lambert 93 (EPSG:2154)
//! - UTM WGS84, toutes zones (EPSG:32601-32660, 32701-32760)
//!
//! Les autres systèmes passent par PROJ avec la feature `reproject`.

mod ellipsoid;
mod lambert;
mod mercator;
#[cfg(feature = "reproject")]
mod proj;
mod smart;
mod utm;

#[cfg(feature = "reproject")]
pub use self::proj::Reprojector;
pub use smart::SmartReprojector;
pub use utm::UtmZone;

use geo::{Coord, Geometry, GeometryCollection, LineString, MapCoords};

use crate::GeoLoadError;

/// Code EPSG du WGS84 géographique
pub const WGS84_EPSG: u32 = 4326;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Projection connue du moteur léger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LiteProjection {
    Geographic,
    WebMercator,
    Lambert93,
    Utm(UtmZone),
}

impl LiteProjection {
    fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            4326 => Some(Self::Geographic),
            3857 => Some(Self::WebMercator),
            2154 => Some(Self::Lambert93),
            _ => UtmZone::from_epsg(epsg).map(Self::Utm),
        }
    }

    fn unproject(self, x: f64, y: f64) -> Geographic {
        match self {
            Self::Geographic => Geographic::from_degrees(x, y),
            Self::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Self::Lambert93 => lambert::lambert93_to_geographic(x, y),
            Self::Utm(zone) => utm::utm_to_geographic(x, y, zone),
        }
    }

    fn project(self, geo: Geographic) -> (f64, f64) {
        match self {
            Self::Geographic => geo.to_degrees(),
            Self::WebMercator => mercator::geographic_to_web_mercator(geo),
            Self::Lambert93 => lambert::geographic_to_lambert93(geo),
            Self::Utm(zone) => utm::geographic_to_utm(geo, zone),
        }
    }
}

/// Reprojection légère via un pivot géographique WGS84
#[derive(Debug)]
pub struct ReprojectorLite {
    source: LiteProjection,
    target: LiteProjection,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, GeoLoadError> {
        let source = LiteProjection::from_epsg(source_epsg).ok_or_else(|| {
            GeoLoadError::Reproject(format!(
                "EPSG:{} not supported by the built-in projections",
                source_epsg
            ))
        })?;
        let target = LiteProjection::from_epsg(target_epsg).ok_or_else(|| {
            GeoLoadError::Reproject(format!(
                "EPSG:{} not supported by the built-in projections",
                target_epsg
            ))
        })?;

        Ok(Self { source, target })
    }

    /// Vérifie si un EPSG est pris en charge
    pub fn is_supported_epsg(epsg: u32) -> bool {
        LiteProjection::from_epsg(epsg).is_some()
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: u32, target: u32) -> bool {
        Self::is_supported_epsg(source) && Self::is_supported_epsg(target)
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64), GeoLoadError> {
        let geo = self.source.unproject(x, y);
        let (tx, ty) = self.target.project(geo);

        if tx.is_finite() && ty.is_finite() {
            Ok((tx, ty))
        } else {
            Err(GeoLoadError::Reproject(format!(
                "({}, {}) is outside the projection domain",
                x, y
            )))
        }
    }

    /// Transforme une géométrie (tous types, collections comprises)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, GeoLoadError> {
        expand_fixed_shapes(geom).try_map_coords(|c| {
            let (x, y) = self.transform_point(c.x, c.y)?;
            Ok::<_, GeoLoadError>(Coord { x, y })
        })
    }
}

/// Line, Rect et Triangle ne conservent pas leur forme une fois reprojetés
fn expand_fixed_shapes(geom: &Geometry) -> Geometry {
    match geom {
        Geometry::Line(line) => Geometry::LineString(LineString::new(vec![line.start, line.end])),
        Geometry::Rect(rect) => Geometry::Polygon(rect.to_polygon()),
        Geometry::Triangle(tri) => Geometry::Polygon(tri.to_polygon()),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
            gc.0.iter().map(expand_fixed_shapes).collect(),
        )),
        other => other.clone(),
    }
}

//! Projection UTM (Universal Transverse Mercator) sur WGS84
//!
//! Zones 1 à 60, hémisphères nord (EPSG:326xx) et sud (EPSG:327xx).
//! Séries de Snyder, précision sub-métrique dans la zone.

use super::ellipsoid::WGS84;
use super::Geographic;

const K0: f64 = 0.9996;
const FALSE_EASTING: f64 = 500000.0;
const FALSE_NORTHING_SOUTH: f64 = 10000000.0;

/// Zone UTM identifiée par son code EPSG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub zone: u32,
    pub south: bool,
}

impl UtmZone {
    /// Zone depuis un code EPSG WGS84 / UTM (32601-32660, 32701-32760)
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            32601..=32660 => Some(Self {
                zone: epsg - 32600,
                south: false,
            }),
            32701..=32760 => Some(Self {
                zone: epsg - 32700,
                south: true,
            }),
            _ => None,
        }
    }

    fn central_meridian(self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    fn false_northing(self) -> f64 {
        if self.south {
            FALSE_NORTHING_SOUTH
        } else {
            0.0
        }
    }
}

/// Longueur d'arc du méridien depuis l'équateur
fn meridian_arc(lat: f64) -> f64 {
    let e2 = WGS84.e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    WGS84.a
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// Géographique → UTM
pub fn geographic_to_utm(geo: Geographic, zone: UtmZone) -> (f64, f64) {
    let ep2 = WGS84.ep2();

    let (sin_lat, cos_lat) = geo.lat.sin_cos();
    let tan_lat = geo.lat.tan();

    let n = WGS84.normal_radius(geo.lat);
    let t = tan_lat.powi(2);
    let c = ep2 * cos_lat.powi(2);
    let a = (geo.lon - zone.central_meridian()) * cos_lat;
    let m = meridian_arc(geo.lat);

    let x = K0
        * n
        * (a + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
        + FALSE_EASTING;

    let y = K0
        * (m + n
            * tan_lat
            * (a.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0))
        + zone.false_northing();

    (x, y)
}

/// UTM → géographique
pub fn utm_to_geographic(x: f64, y: f64, zone: UtmZone) -> Geographic {
    let a = WGS84.a;
    let e2 = WGS84.e2();
    let ep2 = WGS84.ep2();

    let x = x - FALSE_EASTING;
    let y = y - zone.false_northing();

    // Latitude d'empreinte
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = zone.central_meridian()
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Geographic::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_from_epsg() {
        assert_eq!(
            UtmZone::from_epsg(32631),
            Some(UtmZone {
                zone: 31,
                south: false
            })
        );
        assert_eq!(
            UtmZone::from_epsg(32740),
            Some(UtmZone {
                zone: 40,
                south: true
            })
        );
        assert_eq!(UtmZone::from_epsg(32661), None);
        assert_eq!(UtmZone::from_epsg(4326), None);
    }

    #[test]
    fn test_martinique() {
        // Fort-de-France: -61.07°E, 14.60°N
        let zone = UtmZone::from_epsg(32620).unwrap();
        let (lon, lat) = utm_to_geographic(708000.0, 1615000.0, zone).to_degrees();
        assert!((lon - (-61.07)).abs() < 0.2, "lon={}", lon);
        assert!((lat - 14.60).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_reunion() {
        // Saint-Denis: 55.45°E, -20.88°S
        let zone = UtmZone::from_epsg(32740).unwrap();
        let (lon, lat) = utm_to_geographic(338000.0, 7691000.0, zone).to_degrees();
        assert!((lon - 55.45).abs() < 0.2, "lon={}", lon);
        assert!((lat - (-20.88)).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_central_meridian_on_false_easting() {
        let zone = UtmZone::from_epsg(32631).unwrap();
        let (x, y) = geographic_to_utm(Geographic::from_degrees(3.0, 0.0), zone);
        assert!((x - 500000.0).abs() < 1e-6, "x={}", x);
        assert!(y.abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_roundtrip() {
        let zone = UtmZone::from_epsg(32633).unwrap();
        let (x, y) = geographic_to_utm(Geographic::from_degrees(16.37, 48.21), zone);
        let (lon, lat) = utm_to_geographic(x, y, zone).to_degrees();
        assert!((lon - 16.37).abs() < 1e-6, "lon={}", lon);
        assert!((lat - 48.21).abs() < 1e-6, "lat={}", lat);
    }
}

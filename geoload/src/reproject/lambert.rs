//! Projection Lambert 93 (EPSG:2154)
//!
//! Conique conforme de Lambert à deux parallèles standards sur GRS80.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::ellipsoid::GRS80;
use super::Geographic;

/// Paramètres Lambert 93
struct Lambert93 {
    lon0: f64,
    lat0: f64,
    lat1: f64,
    lat2: f64,
    x0: f64,
    y0: f64,
}

const LAMBERT93: Lambert93 = Lambert93 {
    lon0: 3.0 * std::f64::consts::PI / 180.0,
    lat0: 46.5 * std::f64::consts::PI / 180.0,
    lat1: 44.0 * std::f64::consts::PI / 180.0,
    lat2: 49.0 * std::f64::consts::PI / 180.0,
    x0: 700000.0,
    y0: 6600000.0,
};

/// Constantes dérivées de la projection : exposant n, constante C, rayon à l'origine
struct Cone {
    n: f64,
    c: f64,
    r0: f64,
}

impl Lambert93 {
    fn cone(&self) -> Cone {
        let e = GRS80.e();
        let n1 = GRS80.normal_radius(self.lat1);
        let n2 = GRS80.normal_radius(self.lat2);

        let iso_lat1 = isometric_latitude(self.lat1, e);
        let iso_lat2 = isometric_latitude(self.lat2, e);
        let iso_lat0 = isometric_latitude(self.lat0, e);

        let n = ((n1 * self.lat1.cos()).ln() - (n2 * self.lat2.cos()).ln()) / (iso_lat2 - iso_lat1);
        let c = (n1 * self.lat1.cos() / n) * (n * iso_lat1).exp();
        let r0 = c * (-n * iso_lat0).exp();

        Cone { n, c, r0 }
    }
}

fn isometric_latitude(lat: f64, e: f64) -> f64 {
    let sin_lat = lat.sin();
    let term = ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0);
    ((FRAC_PI_4 + lat / 2.0).tan() * term).ln()
}

/// Latitude depuis la latitude isométrique (itératif)
fn latitude_from_isometric(iso_lat: f64, e: f64) -> f64 {
    let mut lat = 2.0 * iso_lat.exp().atan() - FRAC_PI_2;

    for _ in 0..10 {
        let sin_lat = lat.sin();
        let term = ((1.0 + e * sin_lat) / (1.0 - e * sin_lat)).powf(e / 2.0);
        let new_lat = 2.0 * (iso_lat.exp() * term).atan() - FRAC_PI_2;

        if (new_lat - lat).abs() < 1e-12 {
            return new_lat;
        }
        lat = new_lat;
    }
    lat
}

/// Lambert 93 → géographique
pub fn lambert93_to_geographic(x: f64, y: f64) -> Geographic {
    let p = &LAMBERT93;
    let Cone { n, c, r0 } = p.cone();

    let dx = x - p.x0;
    let dy = y - p.y0;

    let r = (dx.powi(2) + (r0 - dy).powi(2)).sqrt();
    let gamma = (dx / (r0 - dy)).atan();

    let iso_lat = -(r / c).ln() / n;
    let lat = latitude_from_isometric(iso_lat, GRS80.e());
    let lon = p.lon0 + gamma / n;

    Geographic::new(lon, lat)
}

/// Géographique → Lambert 93
pub fn geographic_to_lambert93(geo: Geographic) -> (f64, f64) {
    let p = &LAMBERT93;
    let Cone { n, c, r0 } = p.cone();

    let r = c * (-n * isometric_latitude(geo.lat, GRS80.e())).exp();
    let gamma = n * (geo.lon - p.lon0);

    (p.x0 + r * gamma.sin(), p.y0 + r0 - r * gamma.cos())
}

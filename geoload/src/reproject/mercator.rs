//! Projection Web Mercator (EPSG:3857)
//!
//! Modèle sphérique au rayon équatorial WGS84.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use super::ellipsoid::WGS84;
use super::Geographic;

/// Latitude limite de la projection
const MAX_LAT_DEG: f64 = 85.06;

/// Géographique → Web Mercator
pub fn geographic_to_web_mercator(geo: Geographic) -> (f64, f64) {
    let r = WGS84.a;
    let limit = MAX_LAT_DEG.to_radians();
    let lat = geo.lat.clamp(-limit, limit);

    let x = r * geo.lon;
    let y = r * (FRAC_PI_4 + lat / 2.0).tan().ln();

    (x, y)
}

/// Web Mercator → géographique
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Geographic {
    let r = WGS84.a;
    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - FRAC_PI_2;

    Geographic::new(lon, lat)
}

//! Reprojection intelligente : projections légères en priorité, PROJ en repli

use geo::Geometry;

use super::ReprojectorLite;
use crate::types::Crs;
use crate::GeoLoadError;

/// Reprojection intelligente
///
/// Essaie d'abord le moteur léger (pur Rust), puis PROJ si la feature
/// `reproject` est activée.
pub enum SmartReprojector {
    /// Pas de reprojection (source == cible)
    Identity,
    /// Reprojection légère (pur Rust)
    Lite(ReprojectorLite),
    /// Reprojection via PROJ
    #[cfg(feature = "reproject")]
    Proj(super::Reprojector),
}

impl SmartReprojector {
    /// Crée un reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, GeoLoadError> {
        if source_epsg == target_epsg {
            return Ok(Self::Identity);
        }

        if ReprojectorLite::is_supported(source_epsg, target_epsg) {
            return Ok(Self::Lite(ReprojectorLite::new(source_epsg, target_epsg)?));
        }

        Self::proj_fallback(&format!("EPSG:{}", source_epsg), target_epsg)
    }

    #[cfg(feature = "reproject")]
    fn proj_fallback(source: &str, target_epsg: u32) -> Result<Self, GeoLoadError> {
        let target = format!("EPSG:{}", target_epsg);
        Ok(Self::Proj(super::Reprojector::from_definitions(
            source, &target,
        )?))
    }

    #[cfg(not(feature = "reproject"))]
    fn proj_fallback(source: &str, target_epsg: u32) -> Result<Self, GeoLoadError> {
        Err(GeoLoadError::Reproject(format!(
            "{} -> EPSG:{} is not supported by the built-in projections \
             (4326, 3857, 2154, UTM 326xx/327xx). Build with --features reproject for PROJ.",
            source, target_epsg
        )))
    }

    /// Crée un reprojector depuis un CRS source.
    ///
    /// Un CRS non EPSG n'est utilisable qu'avec PROJ, via sa définition.
    pub fn from_crs(source: &Crs, target_epsg: u32) -> Result<Self, GeoLoadError> {
        match source.to_epsg() {
            Ok(Some(epsg)) => return Self::new(epsg, target_epsg),
            Ok(None) => {}
            Err(e) => tracing::debug!(crs = %source, error = %e, "CRS not identifiable as EPSG"),
        }

        match source.definition.as_deref() {
            Some(definition) => Self::proj_fallback(definition, target_epsg),
            None => Err(GeoLoadError::Reproject(format!(
                "No usable definition to reproject {} to EPSG:{}",
                source, target_epsg
            ))),
        }
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, GeoLoadError> {
        match self {
            Self::Identity => Ok(geom.clone()),
            Self::Lite(lite) => lite.transform_geometry(geom),
            #[cfg(feature = "reproject")]
            Self::Proj(proj) => proj.transform_geometry(geom),
        }
    }

    /// Description du moteur utilisé
    pub fn description(&self) -> &'static str {
        match self {
            Self::Identity => "identity (no reprojection)",
            Self::Lite(_) => "built-in projections (pure Rust)",
            #[cfg(feature = "reproject")]
            Self::Proj(_) => "PROJ library",
        }
    }
}

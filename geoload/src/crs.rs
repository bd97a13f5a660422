//! Normalisation du système de référence vers WGS84 (EPSG:4326)

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::reproject::{SmartReprojector, WGS84_EPSG};
use crate::types::{Crs, GeoFrame, Record};
use crate::GeoLoadError;

/// Ramène un frame en EPSG:4326.
///
/// - sans CRS : étiquetage 4326, coordonnées inchangées
/// - déjà en 4326 : retourné tel quel
/// - sinon (y compris CRS non identifiable) : reprojection
pub fn to_wgs84(frame: GeoFrame) -> Result<GeoFrame, GeoLoadError> {
    let Some(crs) = &frame.crs else {
        return Ok(frame.set_crs(Crs::epsg(WGS84_EPSG)));
    };

    match crs.to_epsg() {
        Ok(Some(WGS84_EPSG)) => return Ok(frame),
        Ok(_) => {}
        Err(e) => debug!(crs = %crs, error = %e, "CRS identification failed, reprojecting anyway"),
    }

    reproject_frame(frame, WGS84_EPSG)
}

/// Reprojette toutes les géométries d'un frame vers un EPSG cible.
///
/// Un frame sans CRS ne peut pas être reprojeté.
pub fn reproject_frame(frame: GeoFrame, target_epsg: u32) -> Result<GeoFrame, GeoLoadError> {
    let source = frame
        .crs
        .as_ref()
        .ok_or_else(|| GeoLoadError::Reproject("frame has no CRS to reproject from".into()))?;

    let reprojector = SmartReprojector::from_crs(source, target_epsg)?;
    debug!(
        from = %source,
        to = target_epsg,
        engine = reprojector.description(),
        rows = frame.len(),
        "Reprojecting"
    );

    let records = frame
        .records
        .into_iter()
        .map(|record| {
            let geometry = record
                .geometry
                .map(|g| reprojector.transform_geometry(&g))
                .transpose()?;
            Ok(Record::new(record.attributes, geometry))
        })
        .collect::<Result<Vec<_>, GeoLoadError>>()?;

    Ok(GeoFrame {
        records,
        crs: Some(Crs::epsg(target_epsg)),
        ..frame
    })
}

/// Extrait le code EPSG de premier niveau d'une définition WKT.
///
/// En WKT1 comme en WKT2, l'identifiant du CRS lui-même est le dernier
/// `AUTHORITY[...]` / `ID[...]` du texte.
pub fn epsg_from_definition(definition: &str) -> Option<u32> {
    static AUTHORITY: OnceLock<Regex> = OnceLock::new();
    let re = AUTHORITY.get_or_init(|| {
        Regex::new(r#"(?i)(?:AUTHORITY|ID)\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#)
            .expect("static regex is valid")
    });

    re.captures_iter(definition)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse un nom de CRS (membre `crs` GeoJSON, chaîne utilisateur).
///
/// Formes reconnues : `EPSG:n`, `urn:ogc:def:crs:EPSG::n`,
/// `urn:ogc:def:crs:EPSG:version:n`, `urn:ogc:def:crs:OGC:1.3:CRS84`,
/// `http://www.opengis.net/def/crs/EPSG/0/n`.
pub fn parse_crs_name(name: &str) -> Option<Crs> {
    static NAME: OnceLock<Regex> = OnceLock::new();
    let re = NAME.get_or_init(|| {
        Regex::new(r"(?i)^(?:urn:ogc:def:crs:EPSG:[\d.]*:|EPSG:+|https?://www\.opengis\.net/def/crs/EPSG/[\d.]+/)(\d+)$")
            .expect("static regex is valid")
    });

    let name = name.trim();
    if name.to_ascii_uppercase().ends_with("CRS84") {
        return Some(Crs::epsg(WGS84_EPSG));
    }

    re.captures(name)
        .and_then(|caps| caps[1].parse().ok())
        .map(Crs::epsg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};

    use crate::types::Value;

    fn point_frame(x: f64, y: f64, crs: Option<Crs>) -> GeoFrame {
        GeoFrame::new(
            vec!["name".into()],
            vec![Record::new(
                vec![Value::Text("p".into())],
                Some(Geometry::Point(Point::new(x, y))),
            )],
            crs,
        )
    }

    fn first_point(frame: &GeoFrame) -> Point {
        match frame.records[0].geometry {
            Some(Geometry::Point(p)) => p,
            ref other => panic!("Expected Point, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_crs_is_labelled_only() {
        let frame = point_frame(652381.0, 6862047.0, None);
        let result = to_wgs84(frame).unwrap();
        assert_eq!(result.crs, Some(Crs::epsg(4326)));
        assert_eq!(first_point(&result), Point::new(652381.0, 6862047.0));
    }

    #[test]
    fn test_already_wgs84_untouched() {
        let frame = point_frame(2.123456789012345, 48.98765432109876, Some(Crs::epsg(4326)));
        let result = to_wgs84(frame.clone()).unwrap();
        assert_eq!(result, frame);
        assert_eq!(first_point(&result).x().to_bits(), 2.123456789012345f64.to_bits());
    }

    #[test]
    fn test_lambert_reprojected() {
        let frame = point_frame(652381.0, 6862047.0, Some(Crs::epsg(2154)));
        let result = to_wgs84(frame).unwrap();
        let p = first_point(&result);
        assert_eq!(result.crs, Some(Crs::epsg(4326)));
        assert!((p.x() - 2.35).abs() < 0.1, "lon={}", p.x());
        assert!((p.y() - 48.85).abs() < 0.1, "lat={}", p.y());
    }

    #[test]
    fn test_roundtrip_through_web_mercator() {
        let original = point_frame(1113194.9, 6800125.4, Some(Crs::epsg(3857)));
        let wgs84 = to_wgs84(original.clone()).unwrap();
        let back = reproject_frame(wgs84, 3857).unwrap();

        let (a, b) = (first_point(&original), first_point(&back));
        assert!((a.x() - b.x()).abs() < 1e-6);
        assert!((a.y() - b.y()).abs() < 1e-6);
    }

    #[test]
    fn test_idempotent() {
        let frame = point_frame(500000.0, 4649776.2, Some(Crs::epsg(32631)));
        let once = to_wgs84(frame).unwrap();
        let twice = to_wgs84(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_malformed_crs_still_reprojects() {
        let crs = Crs {
            authority: "EPSG".into(),
            code: -4326,
            definition: None,
        };
        // Identification en erreur, puis reprojection impossible sans définition
        let err = to_wgs84(point_frame(0.0, 0.0, Some(crs))).unwrap_err();
        assert!(matches!(err, GeoLoadError::Reproject(_)));
    }

    #[test]
    fn test_definition_identified_as_wgs84() {
        let crs = Crs {
            authority: "NONE".into(),
            code: 99,
            definition: Some(
                r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],AUTHORITY["EPSG","4326"]]"#
                    .into(),
            ),
        };
        let frame = point_frame(1.0, 2.0, Some(crs));
        let result = to_wgs84(frame.clone()).unwrap();
        assert_eq!(result, frame);
    }

    #[test]
    fn test_epsg_from_definition() {
        assert_eq!(
            epsg_from_definition(r#"PROJCRS["RGF93 v1 / Lambert-93",ID["EPSG",2154]]"#),
            Some(2154)
        );
        assert_eq!(epsg_from_definition("LOCAL_CS[\"x\"]"), None);
    }

    #[test]
    fn test_parse_crs_name() {
        assert_eq!(parse_crs_name("urn:ogc:def:crs:EPSG::2154"), Some(Crs::epsg(2154)));
        assert_eq!(parse_crs_name("urn:ogc:def:crs:EPSG:6.6:32631"), Some(Crs::epsg(32631)));
        assert_eq!(parse_crs_name("EPSG:3857"), Some(Crs::epsg(3857)));
        assert_eq!(parse_crs_name("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(Crs::epsg(4326)));
        assert_eq!(
            parse_crs_name("http://www.opengis.net/def/crs/EPSG/0/4258"),
            Some(Crs::epsg(4258))
        );
        assert_eq!(parse_crs_name("WGS84-ish"), None);
    }
}

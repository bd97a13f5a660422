//! Lecture de fichiers GeoJSON et de dossiers de fichiers GeoJSON

use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::crs::{parse_crs_name, reproject_frame};
use crate::reproject::WGS84_EPSG;
use crate::types::{Crs, GeoFrame, Record, Value};
use crate::GeoLoadError;

/// Lit un fichier GeoJSON (FeatureCollection, Feature ou Geometry)
pub fn read_geojson_file(path: &Path) -> Result<GeoFrame, GeoLoadError> {
    let content = std::fs::read_to_string(path)?;
    parse_geojson(&content)
}

/// Parse un document GeoJSON en frame.
///
/// Les colonnes sont l'union des clés de propriétés dans l'ordre de première
/// apparition. Sans membre `crs`, le CRS est EPSG:4326 (RFC 7946).
pub fn parse_geojson(content: &str) -> Result<GeoFrame, GeoLoadError> {
    let (features, foreign_members) = match content.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(feature) => {
            let foreign = feature.foreign_members.clone();
            (vec![feature], foreign)
        }
        GeoJson::Geometry(geometry) => (
            vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            None,
        ),
    };

    let crs = foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .map(crs_from_member)
        .unwrap_or_else(|| Crs::epsg(WGS84_EPSG));

    let mut columns: Vec<String> = Vec::new();
    for feature in &features {
        for key in feature.properties.iter().flat_map(|p| p.keys()) {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let records = features
        .into_iter()
        .map(|feature| to_record(feature, &columns))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(GeoFrame::new(columns, records, Some(crs)))
}

fn to_record(feature: Feature, columns: &[String]) -> Result<Record, GeoLoadError> {
    let geometry = feature
        .geometry
        .map(geo::Geometry::<f64>::try_from)
        .transpose()?;

    let properties = feature.properties.unwrap_or_default();
    let attributes = columns
        .iter()
        .map(|c| properties.get(c).map(json_to_value).unwrap_or(Value::Null))
        .collect();

    Ok(Record::new(attributes, geometry))
}

fn json_to_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
        },
        JsonValue::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// CRS du membre historique `crs` (`{"type":"name","properties":{"name":...}}`)
fn crs_from_member(member: &JsonValue) -> Crs {
    let name = member
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str);

    match name.and_then(parse_crs_name) {
        Some(crs) => crs,
        None => {
            warn!(crs = %member, "Unrecognized GeoJSON crs member, assuming EPSG:4326");
            Crs::epsg(WGS84_EPSG)
        }
    }
}

/// Fichiers `*.geojson` d'un dossier (non récursif, ordre du glob)
fn list_geojson_files(folder: &Path) -> Result<Vec<PathBuf>, GeoLoadError> {
    let escaped = glob::Pattern::escape(&folder.to_string_lossy());
    let pattern = Path::new(&escaped).join("*.geojson");

    let paths = glob::glob(&pattern.to_string_lossy())
        .map_err(|e| GeoLoadError::Config(format!("Invalid folder pattern: {}", e)))?;

    Ok(paths
        .filter_map(|entry| match entry {
            Ok(path) if path.is_file() => Some(path),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Unreadable glob entry");
                None
            }
        })
        .collect())
}

/// Aligne le CRS d'un frame sur celui du premier frame lu
fn align_crs(frame: GeoFrame, reference: Option<&Crs>) -> Result<GeoFrame, GeoLoadError> {
    let Some(reference) = reference else {
        return Ok(frame);
    };
    if frame.crs.as_ref() == Some(reference) {
        return Ok(frame);
    }

    match reference.to_epsg()? {
        Some(epsg) => reproject_frame(frame, epsg),
        None => Err(GeoLoadError::Crs(format!(
            "cannot align {:?} on non-EPSG {}",
            frame.crs, reference
        ))),
    }
}

/// Lit et concatène tous les fichiers `*.geojson` d'un dossier.
///
/// Un fichier illisible est ignoré. Les numéros de ligne sont contigus dans
/// le résultat.
///
/// # Errors
///
/// - [`GeoLoadError::NotFound`] si le dossier ne contient aucun `.geojson`
/// - [`GeoLoadError::NoneReadable`] si aucun fichier n'a pu être lu
pub fn read_geojson_folder(folder: &Path) -> Result<GeoFrame, GeoLoadError> {
    let files = list_geojson_files(folder)?;
    if files.is_empty() {
        return Err(GeoLoadError::NotFound(format!(
            "No .geojson files found in folder {}",
            folder.display()
        )));
    }

    let mut frames: Vec<GeoFrame> = Vec::with_capacity(files.len());
    for path in &files {
        let reference = frames.first().and_then(|f| f.crs.clone());
        match read_geojson_file(path).and_then(|frame| align_crs(frame, reference.as_ref())) {
            Ok(frame) => {
                debug!(path = %path.display(), rows = frame.len(), "GeoJSON file read");
                frames.push(frame);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable GeoJSON file"),
        }
    }

    if frames.is_empty() {
        return Err(GeoLoadError::NoneReadable(format!(
            "Could not read any of the {} GeoJSON files in {}",
            files.len(),
            folder.display()
        )));
    }

    let merged = GeoFrame::concat(frames);
    info!(
        folder = %folder.display(),
        files = files.len(),
        rows = merged.len(),
        columns = merged.columns.len(),
        "GeoJSON folder loaded"
    );
    Ok(merged)
}

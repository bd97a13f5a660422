//! Tests de bout en bout du résumé CLI

use std::path::{Path, PathBuf};

use geoload_cli::{load_summary, Config, Source};
use rusqlite::{params, Connection};

/// GeoPackage minimal : une couche de points en Web Mercator
fn write_gpkg(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE gpkg_spatial_ref_sys (
            srs_name TEXT NOT NULL, srs_id INTEGER PRIMARY KEY, organization TEXT NOT NULL,
            organization_coordsys_id INTEGER NOT NULL, definition TEXT NOT NULL, description TEXT);
         INSERT INTO gpkg_spatial_ref_sys VALUES
            ('WGS 84 / Pseudo-Mercator', 3857, 'EPSG', 3857, 'undefined', NULL);
         CREATE TABLE gpkg_contents (
            table_name TEXT NOT NULL PRIMARY KEY, data_type TEXT NOT NULL, identifier TEXT,
            description TEXT DEFAULT '', last_change DATETIME,
            min_x DOUBLE, min_y DOUBLE, max_x DOUBLE, max_y DOUBLE, srs_id INTEGER);
         CREATE TABLE gpkg_geometry_columns (
            table_name TEXT NOT NULL, column_name TEXT NOT NULL, geometry_type_name TEXT NOT NULL,
            srs_id INTEGER NOT NULL, z TINYINT NOT NULL, m TINYINT NOT NULL,
            PRIMARY KEY (table_name, column_name));
         CREATE TABLE sites (fid INTEGER PRIMARY KEY, geom BLOB, pays TEXT, broad_sector_name TEXT);
         INSERT INTO gpkg_contents (table_name, data_type, srs_id) VALUES ('sites', 'features', 3857);
         INSERT INTO gpkg_geometry_columns VALUES ('sites', 'geom', 'POINT', 3857, 0, 0);",
    )
    .unwrap();

    let mut blob = vec![b'G', b'P', 0x00, 0x01];
    blob.extend_from_slice(&3857i32.to_le_bytes());
    blob.push(0x01);
    blob.extend_from_slice(&1u32.to_le_bytes());
    blob.extend_from_slice(&0.0f64.to_le_bytes());
    blob.extend_from_slice(&0.0f64.to_le_bytes());

    conn.execute(
        "INSERT INTO sites (geom, pays, broad_sector_name) VALUES (?1, ?2, ?3)",
        params![blob, "CIV", "Health"],
    )
    .unwrap();
}

fn gpkg_source(dir: &Path) -> Source {
    let path = dir.join("sites.gpkg");
    write_gpkg(&path);
    Source::Gpkg { path, layer: None }
}

#[test]
fn test_gpkg_summary_normalized() {
    let dir = tempfile::tempdir().unwrap();
    let summary = load_summary(&gpkg_source(dir.path()), &Config::default()).unwrap();

    assert_eq!(summary.rows, 1);
    assert_eq!(summary.crs.as_deref(), Some("EPSG:4326"));
    assert_eq!(summary.columns, vec!["pays", "broad_sector_name"]);
    assert_eq!(summary.geometry_types.get("Point"), Some(&1));
    assert_eq!(summary.detected.sector.as_deref(), Some("broad_sector_name"));
    assert_eq!(summary.detected.country, None);

    let [min_x, min_y, _, _] = summary.bounds.unwrap();
    assert!(min_x.abs() < 1e-9 && min_y.abs() < 1e-9);
}

#[test]
fn test_gpkg_summary_without_reprojection() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(None, Some(0.5), false).unwrap();
    let summary = load_summary(&gpkg_source(dir.path()), &config).unwrap();
    assert_eq!(summary.crs.as_deref(), Some("EPSG:3857"));
}

#[test]
fn test_alias_override_detects_custom_column() {
    let dir = tempfile::tempdir().unwrap();
    let aliases = dir.path().join("aliases.json");
    std::fs::write(&aliases, r#"{"country": ["pays"]}"#).unwrap();

    let config = Config::new(Some(&aliases), None, true).unwrap();
    let summary = load_summary(&gpkg_source(dir.path()), &config).unwrap();
    assert_eq!(summary.detected.country.as_deref(), Some("pays"));
    assert_eq!(summary.detected.sector.as_deref(), Some("broad_sector_name"));
}

#[test]
fn test_geojson_folder_summary() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("one.geojson"),
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"country": "GHA"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}}
        ]}"#,
    )
    .unwrap();

    let source = Source::GeojsonFolder {
        dir: dir.path().to_path_buf(),
    };
    let summary = load_summary(&source, &Config::default()).unwrap();
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.geometry_types.get("Polygon"), Some(&1));
    assert_eq!(summary.detected.country.as_deref(), Some("country"));
}

#[test]
fn test_empty_folder_fails() {
    let dir = tempfile::tempdir().unwrap();
    let source = Source::GeojsonFolder {
        dir: PathBuf::from(dir.path()),
    };
    let err = load_summary(&source, &Config::default()).unwrap_err();
    assert!(err.to_string().contains("Failed to load GeoJSON folder"));
    assert!(format!("{:#}", err).contains("No .geojson files"));
}

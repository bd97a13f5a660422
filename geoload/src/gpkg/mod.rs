//! Lecture de conteneurs GeoPackage avec cascade de backends
//!
//! Ordre de priorité :
//! 1. [`ContentsReader`] : lecture conforme via `gpkg_contents`
//! 2. [`RegistryReader`] : lecture tolérante via `gpkg_geometry_columns`
//! 3. [`crate::reader::read_file`] : lecture générique sans couche
//!
//! Les échecs récupérables d'un backend sont journalisés puis ignorés ; seule
//! la cause de l'échec du dernier recours est remontée.

pub mod blob;
mod contents;
mod registry;
pub mod sqlite;

pub use contents::ContentsReader;
pub use registry::RegistryReader;

use std::path::Path;

use tracing::{debug, info};

use crate::reader;
use crate::types::GeoFrame;
use crate::GeoLoadError;

/// Source de couches d'un conteneur multi-couches
pub trait LayerSource {
    /// Nom du backend (journalisation)
    fn name(&self) -> &'static str;

    /// Couches dans l'ordre du conteneur
    fn list_layers(&self) -> Result<Vec<String>, GeoLoadError>;

    /// Lit une couche entière
    fn read_layer(&self, layer: &str) -> Result<GeoFrame, GeoLoadError>;

    /// Nombre de lignes d'une couche (par défaut : lecture complète)
    fn count_rows(&self, layer: &str) -> Result<usize, GeoLoadError> {
        Ok(self.read_layer(layer)?.len())
    }
}

type Opener = fn(&Path) -> Result<Box<dyn LayerSource>, GeoLoadError>;

fn open_contents(path: &Path) -> Result<Box<dyn LayerSource>, GeoLoadError> {
    Ok(Box::new(ContentsReader::open(path)?))
}

fn open_registry(path: &Path) -> Result<Box<dyn LayerSource>, GeoLoadError> {
    Ok(Box::new(RegistryReader::open(path)?))
}

/// Backends par ordre de priorité
const BACKENDS: [(&str, Opener); 2] = [
    ("gpkg_contents", open_contents),
    ("gpkg_geometry_columns", open_registry),
];

/// Lit une couche d'une source.
///
/// Sans couche explicite : première couche non vide dans l'ordre du
/// conteneur, ou la première couche si toutes sont vides.
///
/// Les couches vides sont écartées même si elles sont attendues ; passer
/// `layer` explicitement pour les lire.
pub fn read_from_source(
    source: &dyn LayerSource,
    path: &Path,
    layer: Option<&str>,
) -> Result<GeoFrame, GeoLoadError> {
    if let Some(layer) = layer {
        return source.read_layer(layer);
    }

    let layers = source.list_layers()?;
    let Some(first) = layers.first() else {
        return Err(GeoLoadError::NoLayers(path.to_path_buf()));
    };

    for layer in &layers {
        let rows = source.count_rows(layer)?;
        if rows > 0 {
            debug!(backend = source.name(), layer = %layer, rows, "Selected first non-empty layer");
            return source.read_layer(layer);
        }
        debug!(backend = source.name(), layer = %layer, "Skipping empty layer");
    }

    source.read_layer(first)
}

/// Liste les couches d'un conteneur avec le premier backend qui y parvient
pub fn list_layers(path: &Path) -> Result<Vec<String>, GeoLoadError> {
    let mut last_error = None;
    for (name, open) in BACKENDS {
        match open(path).and_then(|source| source.list_layers()) {
            Ok(layers) => return Ok(layers),
            Err(e) => {
                debug!(backend = name, error = %e, "Layer listing failed");
                last_error = Some(e);
            }
        }
    }
    Err(GeoLoadError::read(
        path,
        last_error.unwrap_or_else(|| GeoLoadError::NoLayers(path.to_path_buf())),
    ))
}

/// Lit un GeoPackage en un seul frame.
///
/// # Errors
///
/// - [`GeoLoadError::Config`] si aucun chemin n'est fourni ou s'il n'existe pas
///   (aucune lecture tentée)
/// - [`GeoLoadError::Read`] si aucun backend ne parvient à lire le fichier,
///   avec la cause de l'échec du dernier recours
pub fn read_geopackage(path: Option<&Path>, layer: Option<&str>) -> Result<GeoFrame, GeoLoadError> {
    let path = path.ok_or_else(|| GeoLoadError::Config("No GeoPackage path provided.".into()))?;
    if !path.exists() {
        return Err(GeoLoadError::Config(format!(
            "GeoPackage path does not exist: {}",
            path.display()
        )));
    }

    for (name, open) in BACKENDS {
        let attempt = open(path).and_then(|source| read_from_source(source.as_ref(), path, layer));
        match attempt {
            Ok(frame) => {
                info!(
                    path = %path.display(),
                    backend = name,
                    rows = frame.len(),
                    columns = frame.columns.len(),
                    "GeoPackage loaded"
                );
                return Ok(frame);
            }
            Err(e) if e.is_recoverable() => {
                debug!(path = %path.display(), backend = name, error = %e, "Backend failed, trying next");
            }
            Err(e) => return Err(e),
        }
    }

    let frame = reader::read_file(path).map_err(|e| GeoLoadError::read(path, e))?;
    info!(path = %path.display(), backend = "generic", rows = frame.len(), "GeoPackage loaded");
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::sqlite::test_support::*;
    use super::*;
    use crate::types::Value;
    use geo::Point;
    use std::cell::Cell;

    /// Source en mémoire pour tester la sélection de couche
    struct FakeSource {
        layers: Vec<(&'static str, usize)>,
        reads: Cell<usize>,
    }

    impl LayerSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn list_layers(&self) -> Result<Vec<String>, GeoLoadError> {
            Ok(self.layers.iter().map(|(n, _)| n.to_string()).collect())
        }

        fn read_layer(&self, layer: &str) -> Result<GeoFrame, GeoLoadError> {
            self.reads.set(self.reads.get() + 1);
            let rows = self
                .layers
                .iter()
                .find(|(n, _)| *n == layer)
                .map(|(_, rows)| *rows)
                .ok_or_else(|| GeoLoadError::UnknownLayer {
                    path: "fake".into(),
                    layer: layer.into(),
                })?;
            let records = (0..rows)
                .map(|_| crate::types::Record::new(vec![Value::Text(layer.into())], None))
                .collect();
            Ok(GeoFrame::new(vec!["layer".into()], records, None))
        }
    }

    fn fake(layers: Vec<(&'static str, usize)>) -> FakeSource {
        FakeSource {
            layers,
            reads: Cell::new(0),
        }
    }

    #[test]
    fn test_first_non_empty_layer() {
        let source = fake(vec![("empty", 0), ("full", 3), ("other", 5)]);
        let frame = read_from_source(&source, Path::new("x"), None).unwrap();
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.value(0, "layer"), Some(&Value::Text("full".into())));
    }

    #[test]
    fn test_all_empty_returns_first() {
        let source = fake(vec![("a", 0), ("b", 0)]);
        let frame = read_from_source(&source, Path::new("x"), None).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_no_layers() {
        let source = fake(vec![]);
        let err = read_from_source(&source, Path::new("x"), None).unwrap_err();
        assert!(matches!(err, GeoLoadError::NoLayers(_)));
    }

    #[test]
    fn test_explicit_layer_read_directly() {
        let source = fake(vec![("a", 2), ("b", 0)]);
        let frame = read_from_source(&source, Path::new("x"), Some("b")).unwrap();
        assert!(frame.is_empty());
        assert_eq!(source.reads.get(), 1);
    }

    #[test]
    fn test_missing_path_is_config_error() {
        assert!(matches!(
            read_geopackage(None, None),
            Err(GeoLoadError::Config(_))
        ));
        assert!(matches!(
            read_geopackage(Some(Path::new("/nonexistent/data.gpkg")), None),
            Err(GeoLoadError::Config(_))
        ));
    }

    #[test]
    fn test_read_geopackage_skips_empty_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.gpkg");
        let conn = create_gpkg(&path);
        add_point_layer(&conn, "empty_layer", 4326, &[]);
        add_point_layer(
            &conn,
            "projects",
            4326,
            &[
                ("a", 2019, Point::new(1.0, 1.0)),
                ("b", 2020, Point::new(2.0, 2.0)),
            ],
        );
        drop(conn);

        let frame = read_geopackage(Some(&path), None).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.value(1, "name"), Some(&Value::Text("b".into())));
        assert_eq!(list_layers(&path).unwrap(), vec!["empty_layer", "projects"]);
    }

    #[test]
    fn test_missing_contents_table_uses_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_contents.gpkg");
        let conn = create_gpkg(&path);
        add_point_layer(&conn, "empty_layer", 2154, &[]);
        add_point_layer(&conn, "sites", 2154, &[("a", 2021, Point::new(652_381.0, 6_862_047.0))]);
        conn.execute_batch("DROP TABLE gpkg_contents;").unwrap();
        drop(conn);

        assert!(ContentsReader::open(&path)
            .and_then(|source| source.list_layers())
            .is_err());

        let frame = read_geopackage(Some(&path), None).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.crs.as_ref().map(ToString::to_string).as_deref(), Some("EPSG:2154"));
        assert_eq!(frame.value(0, "name"), Some(&Value::Text("a".into())));
        assert_eq!(list_layers(&path).unwrap(), vec!["empty_layer", "sites"]);
    }

    #[test]
    fn test_unknown_explicit_layer_falls_back_to_generic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.gpkg");
        let conn = create_gpkg(&path);
        add_point_layer(&conn, "projects", 4326, &[]);
        drop(conn);

        // Les deux backends échouent, le recours générique lit la première couche
        let frame = read_geopackage(Some(&path), Some("nope")).unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_not_a_geopackage_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.gpkg");
        std::fs::write(&path, b"definitely not sqlite nor json").unwrap();

        let err = read_geopackage(Some(&path), None).unwrap_err();
        assert!(matches!(err, GeoLoadError::Read { .. }), "got {:?}", err);
        assert!(err.to_string().contains("Cause:"));
    }
}

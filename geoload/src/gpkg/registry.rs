//! Lecteur de compatibilité : couches lues depuis `gpkg_geometry_columns` seul
//!
//! Tolère les conteneurs dont `gpkg_contents` est absent ou incomplet, et
//! lit l'en-tête des blobs à la main.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};

use super::blob;
use super::sqlite::{self, LayerInfo};
use super::LayerSource;
use crate::types::GeoFrame;
use crate::GeoLoadError;

pub struct RegistryReader {
    path: PathBuf,
    conn: Connection,
}

impl RegistryReader {
    pub fn open(path: &Path) -> Result<Self, GeoLoadError> {
        Ok(Self {
            path: path.to_path_buf(),
            conn: sqlite::open(path)?,
        })
    }

    fn layer_info(&self, layer: &str) -> Result<LayerInfo, GeoLoadError> {
        let info = self
            .conn
            .query_row(
                "SELECT table_name, column_name, srs_id FROM gpkg_geometry_columns \
                 WHERE table_name = ?1 ORDER BY rowid LIMIT 1",
                [layer],
                |row| {
                    Ok(LayerInfo {
                        table: row.get(0)?,
                        geometry_column: row.get(1)?,
                        srs_id: row.get(2)?,
                    })
                },
            )
            .optional()?;

        match info {
            Some(info) if sqlite::table_exists(&self.conn, &info.table)? => Ok(info),
            _ => Err(GeoLoadError::UnknownLayer {
                path: self.path.clone(),
                layer: layer.to_string(),
            }),
        }
    }
}

impl LayerSource for RegistryReader {
    fn name(&self) -> &'static str {
        "gpkg_geometry_columns"
    }

    fn list_layers(&self) -> Result<Vec<String>, GeoLoadError> {
        let mut stmt = self
            .conn
            .prepare("SELECT table_name FROM gpkg_geometry_columns ORDER BY rowid")?;
        let mut layers = Vec::new();
        for table in stmt.query_map([], |row| row.get::<_, String>(0))? {
            let table = table?;
            // Entrées orphelines ignorées
            if !layers.contains(&table) && sqlite::table_exists(&self.conn, &table)? {
                layers.push(table);
            }
        }
        Ok(layers)
    }

    fn count_rows(&self, layer: &str) -> Result<usize, GeoLoadError> {
        let info = self.layer_info(layer)?;
        sqlite::count_rows(&self.conn, &info.table)
    }

    fn read_layer(&self, layer: &str) -> Result<GeoFrame, GeoLoadError> {
        let info = self.layer_info(layer)?;
        let crs = sqlite::resolve_srs(&self.conn, info.srs_id)?;
        sqlite::read_features(&self.conn, &info, crs, blob::decode_manual)
    }
}

//! Lecture générique d'un fichier vectoriel, sans notion de couche

pub mod geojson;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::gpkg::blob;
use crate::gpkg::sqlite::{self, LayerInfo};
use crate::types::GeoFrame;
use crate::GeoLoadError;

const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Noms de colonnes géométriques reconnus hors registre GeoPackage
const GEOMETRY_COLUMN_NAMES: [&str; 5] = ["geom", "geometry", "the_geom", "wkb_geometry", "shape"];

/// Lit un fichier en détectant son format par son contenu.
///
/// Base SQLite : première table de features trouvée. Sinon : GeoJSON.
pub fn read_file(path: &Path) -> Result<GeoFrame, GeoLoadError> {
    let mut header = [0u8; 16];
    let is_sqlite = {
        let mut file = File::open(path)?;
        let n = file.read(&mut header)?;
        n == header.len() && &header == SQLITE_MAGIC
    };

    if is_sqlite {
        debug!(path = %path.display(), "Generic read: SQLite container");
        read_first_sqlite_layer(path)
    } else {
        debug!(path = %path.display(), "Generic read: GeoJSON");
        geojson::read_geojson_file(path)
    }
}

/// Première table portant une colonne géométrique
fn read_first_sqlite_layer(path: &Path) -> Result<GeoFrame, GeoLoadError> {
    let conn = sqlite::open(path)?;
    let has_registry = sqlite::table_exists(&conn, "gpkg_geometry_columns")?;

    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'gpkg_%' AND name NOT LIKE 'rtree_%' AND name NOT LIKE 'sqlite_%' \
         ORDER BY rowid",
    )?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for table in tables {
        let registered = if has_registry {
            conn.query_row(
                "SELECT column_name, srs_id FROM gpkg_geometry_columns WHERE table_name = ?1",
                [&table],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?)),
            )
            .ok()
        } else {
            None
        };

        let (geometry_column, srs_id) = match registered {
            Some(found) => found,
            None => {
                let columns = sqlite::table_columns(&conn, &table)?;
                let Some((name, _, _)) = columns.into_iter().find(|(name, _, _)| {
                    GEOMETRY_COLUMN_NAMES
                        .iter()
                        .any(|g| g.eq_ignore_ascii_case(name))
                }) else {
                    continue;
                };
                (name, None)
            }
        };

        let layer = LayerInfo {
            table,
            geometry_column,
            srs_id,
        };
        let crs = sqlite::resolve_srs(&conn, layer.srs_id)?;
        return sqlite::read_features(&conn, &layer, crs, blob::decode_any);
    }

    Err(GeoLoadError::NoLayers(path.to_path_buf()))
}

//! Lecteur principal : couches déclarées dans `gpkg_contents`

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};

use super::blob;
use super::sqlite::{self, LayerInfo};
use super::LayerSource;
use crate::types::GeoFrame;
use crate::GeoLoadError;

/// Lecteur conforme à la norme : `gpkg_contents` + `gpkg_geometry_columns`,
/// géométries décodées par geozero
pub struct ContentsReader {
    path: PathBuf,
    conn: Connection,
}

impl ContentsReader {
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
                "SELECT c.table_name, g.column_name, COALESCE(g.srs_id, c.srs_id) \
                 FROM gpkg_contents c \
                 JOIN gpkg_geometry_columns g ON g.table_name = c.table_name \
                 WHERE c.data_type = 'features' AND c.table_name = ?1",
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

        info.ok_or_else(|| GeoLoadError::UnknownLayer {
            path: self.path.clone(),
            layer: layer.to_string(),
        })
    }
}

impl LayerSource for ContentsReader {
    fn name(&self) -> &'static str {
        "gpkg_contents"
    }

    fn list_layers(&self) -> Result<Vec<String>, GeoLoadError> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM gpkg_contents WHERE data_type = 'features' ORDER BY rowid",
        )?;
        let layers = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(layers)
    }

    fn count_rows(&self, layer: &str) -> Result<usize, GeoLoadError> {
        let info = self.layer_info(layer)?;
        sqlite::count_rows(&self.conn, &info.table)
    }

    fn read_layer(&self, layer: &str) -> Result<GeoFrame, GeoLoadError> {
        let info = self.layer_info(layer)?;
        let crs = sqlite::resolve_srs(&self.conn, info.srs_id)?;
        sqlite::read_features(&self.conn, &info, crs, blob::decode_with_geozero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpkg::sqlite::test_support::*;
    use geo::Point;

    #[test]
    fn test_lists_feature_tables_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layers.gpkg");
        let conn = create_gpkg(&path);
        add_point_layer(&conn, "zeta", 4326, &[]);
        add_point_layer(&conn, "alpha", 4326, &[("a", 2021, Point::new(0.0, 0.0))]);
        conn.execute_batch(
            "CREATE TABLE lookup (code TEXT);
             INSERT INTO gpkg_contents (table_name, data_type) VALUES ('lookup', 'attributes');",
        )
        .unwrap();
        drop(conn);

        let reader = ContentsReader::open(&path).unwrap();
        assert_eq!(reader.list_layers().unwrap(), vec!["zeta", "alpha"]);
        assert_eq!(reader.count_rows("zeta").unwrap(), 0);
        assert_eq!(reader.count_rows("alpha").unwrap(), 1);
        assert!(matches!(
            reader.read_layer("lookup"),
            Err(GeoLoadError::UnknownLayer { .. })
        ));
    }

    #[test]
    fn test_missing_contents_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.gpkg");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (geom BLOB);")
            .unwrap();

        let reader = ContentsReader::open(&path).unwrap();
        assert!(matches!(reader.list_layers(), Err(GeoLoadError::Sqlite(_))));
    }
}

//! Accès SQLite commun aux lecteurs GeoPackage

use std::path::Path;

use geo::Geometry;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, OptionalExtension};

use crate::types::{Crs, GeoFrame, Record, Value};
use crate::GeoLoadError;

/// Couche de features résolue dans le conteneur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerInfo {
    pub table: String,
    pub geometry_column: String,
    pub srs_id: Option<i64>,
}

/// Ouvre un conteneur en lecture seule
pub fn open(path: &Path) -> Result<Connection, GeoLoadError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}

/// Échappe un identifiant SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Vérifie l'existence d'une table
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, GeoLoadError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Nombre de lignes d'une table
pub fn count_rows(conn: &Connection, table: &str) -> Result<usize, GeoLoadError> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or(0))
}

/// Colonnes d'une table : (nom, type déclaré, clé primaire)
pub fn table_columns(
    conn: &Connection,
    table: &str,
) -> Result<Vec<(String, String, bool)>, GeoLoadError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                row.get::<_, i64>(5)? > 0,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Résout un srs_id GeoPackage en CRS.
///
/// Les identifiants 0 et -1 sont les systèmes "non définis" de la norme.
/// Sans table `gpkg_spatial_ref_sys`, le srs_id est pris comme code EPSG.
pub fn resolve_srs(conn: &Connection, srs_id: Option<i64>) -> Result<Option<Crs>, GeoLoadError> {
    let Some(srs_id) = srs_id.filter(|&id| id > 0) else {
        return Ok(None);
    };

    if !table_exists(conn, "gpkg_spatial_ref_sys")? {
        return Ok(Some(Crs {
            authority: "EPSG".to_string(),
            code: srs_id,
            definition: None,
        }));
    }

    let crs = conn
        .query_row(
            "SELECT organization, organization_coordsys_id, definition \
             FROM gpkg_spatial_ref_sys WHERE srs_id = ?1",
            [srs_id],
            |row| {
                Ok(Crs {
                    authority: row.get::<_, String>(0)?,
                    code: row.get(1)?,
                    definition: row
                        .get::<_, Option<String>>(2)?
                        .filter(|d| !d.is_empty() && d != "undefined"),
                })
            },
        )
        .optional()?;

    Ok(crs)
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Lit toutes les lignes d'une couche.
///
/// La clé primaire entière (fid) n'est pas exposée comme colonne.
pub fn read_features<F>(
    conn: &Connection,
    layer: &LayerInfo,
    crs: Option<Crs>,
    decode: F,
) -> Result<GeoFrame, GeoLoadError>
where
    F: Fn(&[u8]) -> Result<Option<Geometry>, GeoLoadError>,
{
    let table_columns = table_columns(conn, &layer.table)?;
    if !table_columns
        .iter()
        .any(|(name, _, _)| name.eq_ignore_ascii_case(&layer.geometry_column))
    {
        return Err(GeoLoadError::geometry(format!(
            "geometry column '{}' not found in table '{}'",
            layer.geometry_column, layer.table
        )));
    }

    let attribute_columns: Vec<String> = table_columns
        .iter()
        .filter(|(name, decl_type, pk)| {
            !name.eq_ignore_ascii_case(&layer.geometry_column)
                && !(*pk && decl_type.eq_ignore_ascii_case("INTEGER"))
        })
        .map(|(name, _, _)| name.clone())
        .collect();

    let select_list: Vec<String> = std::iter::once(quote_ident(&layer.geometry_column))
        .chain(attribute_columns.iter().map(|c| quote_ident(c)))
        .collect();
    let sql = format!(
        "SELECT {} FROM {}",
        select_list.join(", "),
        quote_ident(&layer.table)
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        let geometry = match row.get_ref(0)? {
            ValueRef::Null => None,
            ValueRef::Blob(blob) => decode(blob)?,
            other => {
                return Err(GeoLoadError::geometry(format!(
                    "unexpected {:?} value in geometry column '{}'",
                    other.data_type(),
                    layer.geometry_column
                )))
            }
        };

        let attributes = (0..attribute_columns.len())
            .map(|i| row.get_ref(i + 1).map(to_value))
            .collect::<Result<Vec<_>, _>>()?;

        records.push(Record::new(attributes, geometry));
    }

    Ok(GeoFrame {
        columns: attribute_columns,
        geometry_column: layer.geometry_column.clone(),
        records,
        crs,
    })
}

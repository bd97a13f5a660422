//! Résumé d'un jeu de données chargé
//!
//! Ce module collecte les informations affichées par la CLI : volumétrie,
//! colonnes, CRS, types de géométries et colonnes sémantiques détectées.

use std::collections::BTreeMap;

use anyhow::Result;
use geo::{BoundingRect, Geometry, Rect};
use geoload::{DetectedColumns, GeoFrame};
use serde::Serialize;

/// Résumé d'un frame
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Fichier ou dossier source
    pub source: String,
    /// Nombre de lignes
    pub rows: usize,
    /// Colonnes attributaires
    pub columns: Vec<String>,
    /// CRS final ("AUTH:code"), absent si inconnu
    pub crs: Option<String>,
    /// Nombre de géométries par type
    pub geometry_types: BTreeMap<&'static str, usize>,
    /// Lignes sans géométrie
    pub null_geometries: usize,
    /// Emprise [min_x, min_y, max_x, max_y]
    pub bounds: Option<[f64; 4]>,
    /// Colonnes sémantiques détectées
    pub detected: DetectedColumns,
}

/// Nom OGC du type d'une géométrie
pub fn geometry_type(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

impl Summary {
    pub fn from_frame(source: &str, frame: &GeoFrame, detected: DetectedColumns) -> Self {
        let mut geometry_types = BTreeMap::new();
        let mut null_geometries = 0;
        let mut bounds: Option<Rect> = None;

        for geometry in frame.geometries() {
            let Some(geometry) = geometry else {
                null_geometries += 1;
                continue;
            };
            *geometry_types.entry(geometry_type(geometry)).or_insert(0) += 1;

            if let Some(rect) = geometry.bounding_rect() {
                bounds = Some(match bounds {
                    None => rect,
                    Some(acc) => Rect::new(
                        (acc.min().x.min(rect.min().x), acc.min().y.min(rect.min().y)),
                        (acc.max().x.max(rect.max().x), acc.max().y.max(rect.max().y)),
                    ),
                });
            }
        }

        Self {
            source: source.to_string(),
            rows: frame.len(),
            columns: frame.columns.clone(),
            crs: frame.crs.as_ref().map(ToString::to_string),
            geometry_types,
            null_geometries,
            bounds: bounds.map(|r| [r.min().x, r.min().y, r.max().x, r.max().y]),
            detected,
        }
    }

    /// Rendu texte
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        out.push_str(&format!("{}\nDATASET SUMMARY - {}\n{}\n", rule, self.source, rule));
        out.push_str(&format!("\nRows: {}\n", self.rows));
        out.push_str(&format!(
            "CRS: {}\n",
            self.crs.as_deref().unwrap_or("unknown")
        ));
        if let Some([min_x, min_y, max_x, max_y]) = self.bounds {
            out.push_str(&format!(
                "Bounds: [{:.6}, {:.6}, {:.6}, {:.6}]\n",
                min_x, min_y, max_x, max_y
            ));
        }

        out.push_str(&format!("\n--- COLUMNS ({}) ---\n", self.columns.len()));
        for column in &self.columns {
            out.push_str(&format!("  {}\n", column));
        }

        out.push_str("\n--- GEOMETRIES ---\n");
        for (kind, count) in &self.geometry_types {
            out.push_str(&format!("  {}: {}\n", kind, count));
        }
        if self.null_geometries > 0 {
            out.push_str(&format!("  (null): {}\n", self.null_geometries));
        }

        out.push_str("\n--- DETECTED COLUMNS ---\n");
        for (field, column) in self.detected.iter() {
            out.push_str(&format!("  {}: {}\n", field.name(), column.unwrap_or("-")));
        }

        out.push_str(&rule);
        out.push('\n');
        out
    }

    /// Rendu JSON indenté
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Affichage compact sur une ligne
    pub fn one_line(&self) -> String {
        format!(
            "{}: {} rows, {} columns, CRS {}",
            self.source,
            self.rows,
            self.columns.len(),
            self.crs.as_deref().unwrap_or("unknown")
        )
    }
}

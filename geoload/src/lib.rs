//! # geoload
//!
//! Chargement de jeux de données géospatiaux vectoriels en un frame tabulaire
//! unique (attributs + géométries `geo` + CRS).
//!
//! ## Features
//!
//! - Lecture GeoPackage avec cascade de backends (`gpkg_contents`,
//!   `gpkg_geometry_columns`, lecture générique)
//! - Lecture et concaténation d'un dossier de fichiers GeoJSON
//! - Normalisation en WGS84 (EPSG:4326), reprojection pure Rust pour
//!   Lambert-93, Web Mercator et UTM, PROJ en option (feature `reproject`)
//! - Simplification Douglas-Peucker avec garde topologique
//! - Détection heuristique des colonnes pays / secteur / année / valeur
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoload::{detect_columns, read_geopackage, simplify_geometries, to_wgs84};
//! use std::path::Path;
//!
//! let frame = read_geopackage(Some(Path::new("projects.gpkg")), None)?;
//! let frame = simplify_geometries(to_wgs84(frame)?, geoload::simplify::DEFAULT_TOLERANCE);
//!
//! let detected = detect_columns(&frame);
//! println!("{} lignes, pays: {:?}", frame.len(), detected.country);
//! ```

pub mod columns;
pub mod crs;
pub mod error;
pub mod gpkg;
pub mod reader;
pub mod reproject;
pub mod simplify;
pub mod types;

pub use columns::{detect_columns, detect_columns_with, AliasTable, DetectedColumns, SemanticField};
pub use crs::{reproject_frame, to_wgs84};
pub use error::GeoLoadError;
pub use gpkg::{list_layers, read_geopackage};
pub use reader::geojson::{read_geojson_file, read_geojson_folder};
pub use reader::read_file;
pub use simplify::simplify_geometries;
pub use types::{Crs, GeoFrame, Record, Value};

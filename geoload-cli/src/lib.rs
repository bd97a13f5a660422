//! # geoload-cli
//!
//! Inspection de jeux de données vectoriels : chargement, normalisation en
//! WGS84, simplification et détection des colonnes sémantiques.
//!
//! ## Usage CLI
//!
//! ```bash
//! # GeoPackage, première couche non vide
//! geoload gpkg --path ./projects.gpkg
//! geoload gpkg --path ./projects.gpkg --layer sites --simplify 0.001
//!
//! # Dossier de fichiers GeoJSON, résumé JSON
//! geoload geojson --dir ./data/ --format json
//!
//! # Couches d'un GeoPackage
//! geoload layers --path ./projects.gpkg
//! ```

pub mod cli;
pub mod config;
pub mod report;

pub use cli::{load_summary, prepare, Commands, LoadOptions, OutputFormat, Source};
pub use config::Config;
pub use report::Summary;

//! Types d'erreurs pour le crate geoload

use std::path::PathBuf;

use thiserror::Error;

/// Erreurs pouvant survenir lors du chargement d'un jeu de données
#[derive(Debug, Error)]
pub enum GeoLoadError {
    /// Entrée requise absente ou invalide (aucune lecture tentée)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Aucun fichier candidat à lire
    #[error("Not found: {0}")]
    NotFound(String),

    /// Des fichiers candidats existent mais aucun n'a pu être lu
    #[error("Could not read any file: {0}")]
    NoneReadable(String),

    /// Conteneur sans aucune couche
    #[error("No layers found in {}", .0.display())]
    NoLayers(PathBuf),

    /// Couche demandée absente du conteneur
    #[error("Unknown layer '{layer}' in {}", .path.display())]
    UnknownLayer { path: PathBuf, layer: String },

    /// Tous les backends ont échoué pour un fichier
    #[error("Unable to read {}. Cause: {cause}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        cause: Box<GeoLoadError>,
    },

    /// Erreur d'I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Erreur SQLite (conteneur GeoPackage)
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON invalide
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// GeoJSON invalide
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Géométrie illisible (blob WKB, en-tête GeoPackage...)
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    /// Système de référence non identifiable ou mal formé
    #[error("Invalid CRS: {0}")]
    Crs(String),

    /// Échec de reprojection
    #[error("Reprojection failed: {0}")]
    Reproject(String),

    /// Échec de simplification
    #[error("Simplification failed: {0}")]
    Simplify(String),
}

impl GeoLoadError {
    /// Crée une erreur de lecture finale avec sa cause
    pub fn read(path: impl Into<PathBuf>, cause: GeoLoadError) -> Self {
        Self::Read {
            path: path.into(),
            cause: Box::new(cause),
        }
    }

    /// Crée une erreur de géométrie
    pub fn geometry(reason: impl Into<String>) -> Self {
        Self::Geometry(reason.into())
    }

    /// Indique si un backend peut céder la place au suivant après cette erreur.
    ///
    /// Les erreurs de configuration ne sont jamais rattrapées.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl From<geozero::error::GeozeroError> for GeoLoadError {
    fn from(err: geozero::error::GeozeroError) -> Self {
        Self::Geometry(err.to_string())
    }
}

//! Configuration d'un chargement

use std::path::Path;

use anyhow::{Context, Result};
use geoload::AliasTable;

/// Variable d'environnement donnant le fichier d'alias par défaut
pub const ALIASES_ENV: &str = "GEOLOAD_ALIASES";

/// Options de traitement appliquées après lecture
#[derive(Debug, Clone)]
pub struct Config {
    /// Table d'alias pour la détection des colonnes
    pub aliases: AliasTable,

    /// Tolérance de simplification (aucune simplification si absente)
    pub tolerance: Option<f64>,

    /// Normaliser en EPSG:4326
    pub to_wgs84: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aliases: AliasTable::default(),
            tolerance: None,
            to_wgs84: true,
        }
    }
}

impl Config {
    /// Charge la table d'alias (fichier de surcharge ou preset embarqué)
    pub fn load_aliases(path: Option<&Path>) -> Result<AliasTable> {
        match path {
            Some(path) => AliasTable::load(path)
                .with_context(|| format!("Failed to load alias file: {}", path.display())),
            None => Ok(AliasTable::default()),
        }
    }

    pub fn new(aliases: Option<&Path>, tolerance: Option<f64>, to_wgs84: bool) -> Result<Self> {
        Ok(Self {
            aliases: Self::load_aliases(aliases)?,
            tolerance,
            to_wgs84,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aliases() {
        let config = Config::new(None, None, true).unwrap();
        assert_eq!(config.aliases, AliasTable::default());
        assert!(config.to_wgs84);
    }

    #[test]
    fn test_alias_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aliases.json");
        std::fs::write(&path, r#"{"country": ["pays"]}"#).unwrap();

        let config = Config::new(Some(&path), Some(0.01), false).unwrap();
        assert_eq!(config.aliases.country, vec!["pays"]);
        assert_eq!(config.aliases.year, AliasTable::default().year);
        assert_eq!(config.tolerance, Some(0.01));
    }

    #[test]
    fn test_missing_alias_file() {
        let err = Config::new(Some(Path::new("/nonexistent/aliases.json")), None, true).unwrap_err();
        assert!(err.to_string().contains("alias file"));
    }
}

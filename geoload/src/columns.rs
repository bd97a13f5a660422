//! Détection des colonnes sémantiques par alias connus

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::GeoFrame;
use crate::GeoLoadError;

/// Champ sémantique recherché dans un frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticField {
    Precision,
    Country,
    Sector,
    Year,
    Value,
}

impl SemanticField {
    /// Tous les champs, dans l'ordre de déclaration
    pub const ALL: [SemanticField; 5] = [
        SemanticField::Precision,
        SemanticField::Country,
        SemanticField::Sector,
        SemanticField::Year,
        SemanticField::Value,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SemanticField::Precision => "precision",
            SemanticField::Country => "country",
            SemanticField::Sector => "sector",
            SemanticField::Year => "year",
            SemanticField::Value => "value",
        }
    }
}

/// Table d'alias : pour chaque champ, la liste ordonnée des noms acceptés
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AliasTable {
    pub precision: Vec<String>,
    pub country: Vec<String>,
    pub sector: Vec<String>,
    pub year: Vec<String>,
    pub value: Vec<String>,
}

/// Surcharge partielle lue depuis un fichier (champs absents = défaut)
#[derive(Debug, Default, Deserialize)]
struct AliasOverrides {
    precision: Option<Vec<String>>,
    country: Option<Vec<String>>,
    sector: Option<Vec<String>>,
    year: Option<Vec<String>>,
    value: Option<Vec<String>>,
}

const DEFAULT_ALIASES: &str = include_str!("presets/aliases.json");

impl Default for AliasTable {
    fn default() -> Self {
        // Preset embarqué, validé par test
        serde_json::from_str(DEFAULT_ALIASES).unwrap_or_else(|e| {
            warn!(error = %e, "Embedded alias preset is invalid, no column will be detected");
            Self::empty()
        })
    }
}

impl AliasTable {
    fn empty() -> Self {
        Self {
            precision: Vec::new(),
            country: Vec::new(),
            sector: Vec::new(),
            year: Vec::new(),
            value: Vec::new(),
        }
    }

    /// Charge une table depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self, GeoLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GeoLoadError::Config(format!(
                "Failed to read alias file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parse une table JSON ; les champs absents reprennent les alias par défaut
    pub fn from_json(json: &str) -> Result<Self, GeoLoadError> {
        let overrides: AliasOverrides = serde_json::from_str(json)
            .map_err(|e| GeoLoadError::Config(format!("Failed to parse alias JSON: {}", e)))?;

        let defaults = Self::default();
        Ok(Self {
            precision: overrides.precision.unwrap_or(defaults.precision),
            country: overrides.country.unwrap_or(defaults.country),
            sector: overrides.sector.unwrap_or(defaults.sector),
            year: overrides.year.unwrap_or(defaults.year),
            value: overrides.value.unwrap_or(defaults.value),
        })
    }

    /// Alias d'un champ
    pub fn aliases(&self, field: SemanticField) -> &[String] {
        match field {
            SemanticField::Precision => &self.precision,
            SemanticField::Country => &self.country,
            SemanticField::Sector => &self.sector,
            SemanticField::Year => &self.year,
            SemanticField::Value => &self.value,
        }
    }
}

/// Résultat de la détection : nom réel de la colonne trouvée pour chaque champ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectedColumns {
    pub precision: Option<String>,
    pub country: Option<String>,
    pub sector: Option<String>,
    pub year: Option<String>,
    pub value: Option<String>,
}

impl DetectedColumns {
    pub fn get(&self, field: SemanticField) -> Option<&str> {
        match field {
            SemanticField::Precision => self.precision.as_deref(),
            SemanticField::Country => self.country.as_deref(),
            SemanticField::Sector => self.sector.as_deref(),
            SemanticField::Year => self.year.as_deref(),
            SemanticField::Value => self.value.as_deref(),
        }
    }

    fn slot(&mut self, field: SemanticField) -> &mut Option<String> {
        match field {
            SemanticField::Precision => &mut self.precision,
            SemanticField::Country => &mut self.country,
            SemanticField::Sector => &mut self.sector,
            SemanticField::Year => &mut self.year,
            SemanticField::Value => &mut self.value,
        }
    }

    /// Itère sur (champ, colonne trouvée)
    pub fn iter(&self) -> impl Iterator<Item = (SemanticField, Option<&str>)> + '_ {
        SemanticField::ALL.into_iter().map(move |f| (f, self.get(f)))
    }
}

/// Détecte les colonnes sémantiques avec la table d'alias par défaut
pub fn detect_columns(frame: &GeoFrame) -> DetectedColumns {
    detect_columns_with(frame, &AliasTable::default())
}

/// Détecte les colonnes sémantiques avec une table d'alias donnée.
///
/// Pour chaque champ, le premier alias (dans l'ordre de la table) égal à une
/// colonne du frame sans tenir compte de la casse l'emporte. Le nom retourné
/// est celui du frame, avec sa casse d'origine.
pub fn detect_columns_with(frame: &GeoFrame, table: &AliasTable) -> DetectedColumns {
    let lowered: Vec<String> = frame.columns.iter().map(|c| c.to_lowercase()).collect();

    let mut detected = DetectedColumns::default();
    for field in SemanticField::ALL {
        *detected.slot(field) = table.aliases(field).iter().find_map(|alias| {
            let alias = alias.to_lowercase();
            lowered
                .iter()
                .position(|c| *c == alias)
                .map(|idx| frame.columns[idx].clone())
        });
    }
    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(columns: &[&str]) -> GeoFrame {
        GeoFrame::new(columns.iter().map(|c| c.to_string()).collect(), Vec::new(), None)
    }

    #[test]
    fn test_embedded_preset_parses() {
        let table: AliasTable = serde_json::from_str(DEFAULT_ALIASES).unwrap();
        assert_eq!(table.precision[0], "geo_precision");
        assert_eq!(table.value.len(), 4);
        assert_eq!(AliasTable::default(), table);
    }

    #[test]
    fn test_first_alias_wins() {
        // "iso3" est le 3e alias, "country" le 1er : "country" l'emporte
        let frame = frame_with(&["iso3", "country"]);
        let detected = detect_columns(&frame);
        assert_eq!(detected.country.as_deref(), Some("country"));
    }

    #[test]
    fn test_later_alias_used_when_first_absent() {
        let frame = frame_with(&["recipient_country", "commitment_year"]);
        let detected = detect_columns(&frame);
        assert_eq!(detected.country.as_deref(), Some("recipient_country"));
        assert_eq!(detected.year.as_deref(), Some("commitment_year"));
    }

    #[test]
    fn test_case_insensitive_keeps_original_name() {
        let frame = frame_with(&["COUNTRY", "Sector_Name", "Geo_Precision"]);
        let detected = detect_columns(&frame);
        assert_eq!(detected.country.as_deref(), Some("COUNTRY"));
        assert_eq!(detected.sector.as_deref(), Some("Sector_Name"));
        assert_eq!(detected.precision.as_deref(), Some("Geo_Precision"));
    }

    #[test]
    fn test_no_match_is_none() {
        let frame = frame_with(&["name", "countryish", "value"]);
        let detected = detect_columns(&frame);
        assert_eq!(detected, DetectedColumns::default());
        assert!(detected.iter().all(|(_, col)| col.is_none()));
    }

    #[test]
    fn test_partial_override() {
        let table = AliasTable::from_json(r#"{"country": ["pays"]}"#).unwrap();
        assert_eq!(table.country, vec!["pays"]);
        assert_eq!(table.year, AliasTable::default().year);

        let frame = frame_with(&["PAYS", "country"]);
        let detected = detect_columns_with(&frame, &table);
        assert_eq!(detected.country.as_deref(), Some("PAYS"));
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let err = AliasTable::from_json("{not json").unwrap_err();
        assert!(matches!(err, GeoLoadError::Config(_)));
    }
}

//! Types de données pour le crate geoload

use std::fmt;

use geo::Geometry;
use serde::Serialize;

use crate::crs;
use crate::GeoLoadError;

/// Valeur d'attribut d'une ligne
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Retourne la valeur texte si c'en est une
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// Une ligne : attributs alignés sur les colonnes du frame + géométrie
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Valeurs dans l'ordre de `GeoFrame::columns`
    pub attributes: Vec<Value>,

    /// Géométrie (absente si NULL dans la source)
    pub geometry: Option<Geometry>,
}

impl Record {
    pub fn new(attributes: Vec<Value>, geometry: Option<Geometry>) -> Self {
        Self {
            attributes,
            geometry,
        }
    }
}

/// Système de coordonnées de référence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crs {
    /// Autorité (ex: "EPSG")
    pub authority: String,

    /// Code dans l'autorité
    pub code: i64,

    /// Définition complète (WKT ou chaîne PROJ) si connue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl Crs {
    /// CRS EPSG sans définition
    pub fn epsg(code: u32) -> Self {
        Self {
            authority: "EPSG".to_string(),
            code: i64::from(code),
            definition: None,
        }
    }

    /// Identifie le code EPSG du système.
    ///
    /// `Ok(None)` si le système n'est pas EPSG et que sa définition ne porte pas
    /// d'identifiant EPSG, `Err` si le code EPSG est mal formé.
    pub fn to_epsg(&self) -> Result<Option<u32>, GeoLoadError> {
        if self.authority.eq_ignore_ascii_case("EPSG") {
            return u32::try_from(self.code)
                .ok()
                .filter(|&code| code > 0)
                .map(Some)
                .ok_or_else(|| GeoLoadError::Crs(format!("invalid EPSG code {}", self.code)));
        }

        Ok(self
            .definition
            .as_deref()
            .and_then(crs::epsg_from_definition))
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

/// Collection tabulaire de géométries
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFrame {
    /// Colonnes attributaires (ordre et casse de la source)
    pub columns: Vec<String>,

    /// Nom de la colonne géométrie dans la source
    pub geometry_column: String,

    /// Lignes
    pub records: Vec<Record>,

    /// Système de référence (absent si inconnu)
    pub crs: Option<Crs>,
}

impl Default for GeoFrame {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            geometry_column: "geometry".to_string(),
            records: Vec::new(),
            crs: None,
        }
    }
}

impl GeoFrame {
    pub fn new(columns: Vec<String>, records: Vec<Record>, crs: Option<Crs>) -> Self {
        Self {
            columns,
            records,
            crs,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index d'une colonne (comparaison exacte)
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Valeur d'une cellule
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.records.get(row)?.attributes.get(idx)
    }

    /// Itère sur les géométries (None pour les géométries nulles)
    pub fn geometries(&self) -> impl Iterator<Item = Option<&Geometry>> {
        self.records.iter().map(|r| r.geometry.as_ref())
    }

    /// Étiquette le frame avec un CRS sans transformer les coordonnées
    pub fn set_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Concatène plusieurs frames.
    ///
    /// Les colonnes sont l'union dans l'ordre de première apparition, les
    /// valeurs manquantes valent `Null`. Le CRS et la colonne géométrie sont
    /// ceux du premier frame.
    pub fn concat(frames: Vec<GeoFrame>) -> GeoFrame {
        let mut columns: Vec<String> = Vec::new();
        for frame in &frames {
            for col in &frame.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut result = match frames.first() {
            Some(first) => GeoFrame {
                columns: columns.clone(),
                geometry_column: first.geometry_column.clone(),
                records: Vec::with_capacity(frames.iter().map(GeoFrame::len).sum()),
                crs: first.crs.clone(),
            },
            None => return GeoFrame::default(),
        };

        for frame in frames {
            // Position de chaque colonne du frame dans le résultat
            let mapping: Vec<usize> = frame
                .columns
                .iter()
                .filter_map(|c| columns.iter().position(|rc| rc == c))
                .collect();

            for record in frame.records {
                let mut attributes = vec![Value::Null; columns.len()];
                for (value, &target) in record.attributes.into_iter().zip(&mapping) {
                    attributes[target] = value;
                }
                result.records.push(Record::new(attributes, record.geometry));
            }
        }

        result
    }
}

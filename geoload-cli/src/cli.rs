//! Définition et implémentation des commandes CLI
//!
//! - `gpkg`: charge un GeoPackage (couche explicite ou première non vide)
//! - `geojson`: charge et concatène les `.geojson` d'un dossier
//! - `layers`: liste les couches d'un GeoPackage

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use geoload::{detect_columns_with, simplify_geometries, to_wgs84, GeoFrame};
use tracing::{debug, info};

use crate::config::{Config, ALIASES_ENV};
use crate::report::Summary;

#[derive(Subcommand)]
pub enum Commands {
    /// Load a GeoPackage and print a summary
    Gpkg {
        /// Path to the GeoPackage file
        #[arg(short, long)]
        path: PathBuf,

        /// Layer to read (default: first non-empty layer)
        #[arg(short, long)]
        layer: Option<String>,

        #[command(flatten)]
        options: LoadOptions,
    },

    /// Load every .geojson file of a folder and print a summary
    Geojson {
        /// Folder containing .geojson files
        #[arg(short, long)]
        dir: PathBuf,

        #[command(flatten)]
        options: LoadOptions,
    },

    /// List the layers of a GeoPackage
    Layers {
        /// Path to the GeoPackage file
        #[arg(short, long)]
        path: PathBuf,
    },
}

/// Format de sortie du résumé
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Options communes de chargement
#[derive(Args, Debug, Clone)]
pub struct LoadOptions {
    /// Simplify geometries with this tolerance (CRS units)
    #[arg(long)]
    pub simplify: Option<f64>,

    /// Keep the source CRS instead of normalizing to EPSG:4326
    #[arg(long)]
    pub no_reproject: bool,

    /// JSON file overriding the column alias table
    #[arg(long, env = ALIASES_ENV)]
    pub aliases: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl LoadOptions {
    pub fn to_config(&self) -> Result<Config> {
        Config::new(self.aliases.as_deref(), self.simplify, !self.no_reproject)
    }
}

/// Jeu de données à charger
#[derive(Debug, Clone)]
pub enum Source {
    Gpkg { path: PathBuf, layer: Option<String> },
    GeojsonFolder { dir: PathBuf },
}

impl Source {
    fn label(&self) -> String {
        match self {
            Source::Gpkg { path, layer: Some(layer) } => format!("{}:{}", path.display(), layer),
            Source::Gpkg { path, layer: None } => path.display().to_string(),
            Source::GeojsonFolder { dir } => dir.display().to_string(),
        }
    }

    fn read(&self) -> Result<GeoFrame> {
        match self {
            Source::Gpkg { path, layer } => geoload::read_geopackage(Some(path.as_path()), layer.as_deref())
                .with_context(|| format!("Failed to load GeoPackage {}", path.display())),
            Source::GeojsonFolder { dir } => geoload::read_geojson_folder(dir)
                .with_context(|| format!("Failed to load GeoJSON folder {}", dir.display())),
        }
    }
}

/// Applique la normalisation CRS puis la simplification
pub fn prepare(frame: GeoFrame, config: &Config) -> Result<GeoFrame> {
    let frame = if config.to_wgs84 {
        to_wgs84(frame).context("Failed to normalize CRS to EPSG:4326")?
    } else {
        frame
    };

    Ok(match config.tolerance {
        Some(tolerance) => simplify_geometries(frame, tolerance),
        None => frame,
    })
}

/// Charge une source et construit son résumé
pub fn load_summary(source: &Source, config: &Config) -> Result<Summary> {
    let start = Instant::now();

    let frame = prepare(source.read()?, config)?;
    let detected = detect_columns_with(&frame, &config.aliases);
    let summary = Summary::from_frame(&source.label(), &frame, detected);

    debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Dataset processed");
    Ok(summary)
}

fn print_summary(summary: &Summary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", summary.render_text()),
        OutputFormat::Json => println!("{}", summary.to_json()?),
    }
    Ok(())
}

pub fn cmd_load(source: Source, options: &LoadOptions) -> Result<()> {
    let config = options.to_config()?;
    info!(
        source = %source.label(),
        simplify = ?config.tolerance,
        to_wgs84 = config.to_wgs84,
        "Loading dataset"
    );

    let summary = load_summary(&source, &config)?;
    info!("{}", summary.one_line());
    print_summary(&summary, options.format)
}

pub fn cmd_layers(path: &Path) -> Result<()> {
    let layers = geoload::list_layers(path)
        .with_context(|| format!("Failed to list layers of {}", path.display()))?;

    if layers.is_empty() {
        println!("No layers in {}", path.display());
    }
    for layer in layers {
        println!("{}", layer);
    }
    Ok(())
}

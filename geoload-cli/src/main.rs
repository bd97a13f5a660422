//! Point d'entrée CLI pour geoload

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use geoload_cli::cli::{self, Commands, Source};

/// Charge `.env` : répertoire courant et parents, sinon à côté du binaire
fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(".env")));
    if let Some(path) = beside_exe {
        let _ = dotenvy::from_path(path);
    }
}

/// Charger des données GeoPackage / GeoJSON et en afficher le résumé
#[derive(Parser)]
#[command(name = "geoload")]
#[command(author, version)]
#[command(about = "Load GeoPackage or GeoJSON data, normalize to WGS84 and detect semantic columns")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout (GEOLOAD_ALIASES, RUST_LOG)
    load_env();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Gpkg {
            path,
            layer,
            options,
        } => cli::cmd_load(Source::Gpkg { path, layer }, &options),
        Commands::Geojson { dir, options } => cli::cmd_load(Source::GeojsonFolder { dir }, &options),
        Commands::Layers { path } => cli::cmd_layers(&path),
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs sur stderr : stdout reste réservé au résumé
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

//! TileForge CLI - Command-line interface
//!
//! Fetches tiles through the cache, inspects index records, and purges
//! tiles. Settings come from `~/.tileforge/config.ini` unless `--config`
//! names another file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tileforge::app::TileForgeApp;
use tileforge::config::ConfigFile;
use tileforge::key::TileKind;
use tileforge::logging::init_logging;
use tracing::info;

use commands::common::{load_config, KindArg};
use commands::config::ConfigAction;
use error::CliError;

#[derive(Parser)]
#[command(name = "tileforge")]
#[command(about = "Fetch-through cache for terrain, elevation and imagery tiles", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.tileforge/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a tile, generating it on a cache miss
    Get {
        #[arg(value_enum)]
        kind: KindArg,
        /// Raw coordinates, e.g. `64/0/-3`, `N37W122` or `12/655/1583`
        coords: String,
        /// Write tile bytes here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show the index record for a tile
    Status {
        #[arg(value_enum)]
        kind: KindArg,
        coords: String,
    },
    /// Remove a tile from the object store and the index
    Purge {
        #[arg(value_enum)]
        kind: KindArg,
        coords: String,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    let (kind, action) = match cli.command {
        Commands::Config { action } => return commands::config::run(action, config_path),
        Commands::Get {
            kind,
            coords,
            output,
        } => (kind, TileAction::Get { coords, output }),
        Commands::Status { kind, coords } => (kind, TileAction::Status { coords }),
        Commands::Purge { kind, coords } => (kind, TileAction::Purge { coords }),
    };

    let config = load_config(config_path)?;
    let _logging = init_logging(&config.logging.directory, &config.logging.level)
        .map_err(CliError::LoggingInit)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(run_tile_action(&config, kind.into(), action))
}

enum TileAction {
    Get {
        coords: String,
        output: Option<PathBuf>,
    },
    Status {
        coords: String,
    },
    Purge {
        coords: String,
    },
}

async fn run_tile_action(
    config: &ConfigFile,
    kind: TileKind,
    action: TileAction,
) -> Result<(), CliError> {
    let app = TileForgeApp::start(config).await?;
    let service = app.service(kind);
    info!(kind = %kind, "TileForge ready");

    match action {
        TileAction::Get { coords, output } => commands::tile::get(service, &coords, output).await,
        TileAction::Status { coords } => commands::tile::status(service, &coords).await,
        TileAction::Purge { coords } => commands::tile::purge(service, &coords).await,
    }
}

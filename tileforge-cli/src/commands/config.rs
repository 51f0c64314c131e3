//! Configuration CLI commands.

use std::path::Path;

use clap::Subcommand;
use tileforge::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config action subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the default configuration file location
    Path,
    /// Print the effective settings after defaults are applied
    Show,
}

/// Run a config subcommand.
pub fn run(action: ConfigAction, config_path: Option<&Path>) -> Result<(), CliError> {
    match action {
        ConfigAction::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = super::common::load_config(config_path)?;
            print_config(&config);
            Ok(())
        }
    }
}

fn print_config(config: &ConfigFile) {
    println!("[store]");
    println!("backend = {:?}", config.store.backend);
    println!("directory = {}", config.store.directory.display());
    println!();
    println!("[index]");
    println!("backend = {:?}", config.index.backend);
    println!("path = {}", config.index.path.display());
    println!();
    println!("[limits]");
    println!("terrain = {}", config.limits.terrain);
    println!("elevation = {}", config.limits.elevation);
    println!("imagery = {}", config.limits.imagery);
    println!("wait_timeout_secs = {}", config.limits.wait_timeout_secs);
    println!("negative_ttl_secs = {}", config.limits.negative_ttl_secs);
    println!();
    println!("[terrain]");
    println!("version = {}", config.terrain.version);
    println!("max_resolution = {}", config.terrain.max_resolution);
    println!("seed = {}", config.terrain.seed);
    println!();
    println!("[elevation]");
    println!("base_url = {}", config.elevation.base_url);
    println!("index = {:?}", config.elevation.index);
    println!();
    println!("[imagery]");
    println!("provider = {}", config.imagery.provider);
    println!("url_template = {}", config.imagery.url_template);
    println!(
        "api_key = {}",
        if config.imagery.api_key.is_some() { "(set)" } else { "(unset)" }
    );
    println!("auth = {:?}", config.imagery.auth);
    println!("max_zoom = {}", config.imagery.max_zoom);
    println!();
    println!("[delivery]");
    println!("mode = {:?}", config.delivery.mode);
    if let Some(cdn_base) = &config.delivery.cdn_base {
        println!("cdn_base = {}", cdn_base);
    }
    println!();
    println!("[logging]");
    println!("directory = {}", config.logging.directory.display());
    println!("level = {}", config.logging.level);
}

//! Hillview CLI - Command-line interface
//!
//! This binary drives the hillview photo placement core: it serves the JSON
//! message protocol over stdin/stdout, runs one-off culls against a photo
//! catalog, and manages `~/.hillview/config.ini`.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::cull::CullArgs;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "hillview")]
#[command(version = hillview::VERSION)]
#[command(about = "Pick which photos a map view shows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON messages: requests on stdin, updates on stdout
    Run {
        /// JSON photo catalog (defaults to loader.catalog from the config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Log at debug level
        #[arg(long)]
        debug: bool,
    },

    /// Cull a catalog once for a viewport and print the result
    Cull {
        /// JSON photo catalog (defaults to loader.catalog from the config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Northern edge latitude
        #[arg(long, allow_hyphen_values = true)]
        north: f64,

        /// Western edge longitude
        #[arg(long, allow_hyphen_values = true)]
        west: f64,

        /// Southern edge latitude
        #[arg(long, allow_hyphen_values = true)]
        south: f64,

        /// Eastern edge longitude
        #[arg(long, allow_hyphen_values = true)]
        east: f64,

        /// Range around the focal point in meters
        #[arg(long, default_value = "1000")]
        range: f64,

        /// Area cap (0 uses culling.max_area_photos)
        #[arg(long, default_value = "0")]
        max_photos: usize,

        /// Range cap (defaults to culling.max_range_photos)
        #[arg(long)]
        max_range_photos: Option<usize>,

        /// Focal point latitude (defaults to the viewport centre)
        #[arg(long, allow_hyphen_values = true)]
        center_lat: Option<f64>,

        /// Focal point longitude (defaults to the viewport centre)
        #[arg(long, allow_hyphen_values = true)]
        center_lng: Option<f64>,

        /// Log at debug level
        #[arg(long)]
        debug: bool,
    },

    /// Manage configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { catalog, debug } => commands::run::run(RunArgs { catalog, debug }),
        Commands::Cull {
            catalog,
            north,
            west,
            south,
            east,
            range,
            max_photos,
            max_range_photos,
            center_lat,
            center_lng,
            debug,
        } => commands::cull::run(CullArgs {
            catalog,
            north,
            west,
            south,
            east,
            range,
            max_photos,
            max_range_photos,
            center_lat,
            center_lng,
            debug,
        }),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

//! Grid and summary file inspector.
//!
//! Prints grid topology and cell geometry, lists summary keys and prints
//! summary vectors, and exports the `.ESMRY` summary cache.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use config::InspectConfig;

#[derive(Parser, Debug)]
#[command(name = "ecl-inspect")]
#[command(about = "Inspect reservoir simulation grid and summary files")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "ECL_INSPECT_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, overrides the configuration file
    #[arg(long, env = "ECL_INSPECT_LOG")]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "ECL_INSPECT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grid dimensions, active cells, LGRs and connections
    Grid {
        /// Grid file (.EGRID / .FEGRID)
        file: PathBuf,

        /// Local grid to inspect instead of the global grid
        #[arg(long)]
        lgr: Option<String>,

        /// Print the corners of a cell, one-based I,J,K
        #[arg(long, value_parser = commands::parse_cell)]
        cell: Option<[usize; 3]>,
    },

    /// Summary keys with units
    Keys {
        /// Summary specification file (.SMSPEC / .FSMSPEC)
        file: PathBuf,

        /// Shell-style key pattern, e.g. 'WOPR:*'
        #[arg(short, long)]
        pattern: Option<String>,

        /// Include the runs this one was restarted from
        #[arg(long)]
        restarts: bool,
    },

    /// Dates and values of summary vectors
    Vector {
        /// Summary specification file (.SMSPEC / .FSMSPEC)
        file: PathBuf,

        /// Keys to print
        #[arg(required = true)]
        keys: Vec<String>,

        /// Only the last timestep of every report step
        #[arg(long)]
        report_steps: bool,

        /// Include the runs this one was restarted from
        #[arg(long)]
        restarts: bool,
    },

    /// Export the .ESMRY cache next to the specification file
    Cache {
        /// Summary specification file (.SMSPEC / .FSMSPEC)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => InspectConfig::load(path)?,
        None => InspectConfig::default(),
    };

    init_tracing(&args, &config)?;
    debug!(config = ?config, "Loaded configuration");

    let mut out = std::io::stdout().lock();
    match args.command {
        Command::Grid { file, lgr, cell } => {
            commands::grid(&mut out, &file, lgr.as_deref(), cell)
                .with_context(|| format!("Failed to inspect grid {:?}", file))
        }
        Command::Keys {
            file,
            pattern,
            restarts,
        } => {
            let options = commands::summary_options(&config, restarts);
            commands::keys(&mut out, &file, pattern.as_deref(), options)
                .with_context(|| format!("Failed to list keys of {:?}", file))
        }
        Command::Vector {
            file,
            keys,
            report_steps,
            restarts,
        } => {
            let options = commands::summary_options(&config, restarts);
            commands::vector(&mut out, &file, &keys, report_steps, options)
                .with_context(|| format!("Failed to read vectors from {:?}", file))
        }
        Command::Cache { file } => {
            let options = commands::summary_options(&config, false);
            commands::cache(&mut out, &file, options)
                .with_context(|| format!("Failed to export cache for {:?}", file))
        }
    }
}

/// Logs go to stderr so command output stays machine readable.
fn init_tracing(args: &Args, config: &InspectConfig) -> Result<()> {
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.log_json || config.logging.is_json() {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
    }
}

//! LoEco multi-source fetcher
//!
//! Runs every enabled source from the stations file and merges the results
//! into the Avro store.
//!
//! # Usage
//!
//! ```bash
//! # All enabled sources, default paths
//! loeco-fetch
//!
//! # One source, custom locations, debug logging
//! loeco-fetch --config /etc/loeco/stations.json --data-dir /var/lib/loeco --only campus -v
//! ```
//!
//! Exits with status 1 if the config cannot be loaded or any source fails.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use loeco_connectors::config::{StationsConfig, DEFAULT_CONFIG_PATH};
use loeco_connectors::Runner;
use loeco_core::SystemClock;

/// Fetch station data and merge it into the LoEco store
#[derive(Parser, Debug)]
#[command(name = "loeco-fetch", version, about, long_about = None)]
struct Args {
    /// Stations configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Root directory of the Avro store
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Run only the source with this name
    #[arg(long, value_name = "NAME")]
    only: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match StationsConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    let runner = Runner::from_config(&config, &args.data_dir, args.only.as_deref(), Arc::new(SystemClock));
    if runner.is_empty() {
        match &args.only {
            Some(name) => {
                log::error!("no enabled provider named '{}'", name);
                process::exit(1);
            }
            None => log::info!("No enabled providers found in config."),
        }
        return;
    }

    log::info!("Found {} enabled provider(s)", runner.len());
    let report = runner.run_all();
    println!("Summary: {}", report.summary());

    if !report.is_success() {
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

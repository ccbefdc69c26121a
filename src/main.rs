//! mc-bench: a memcached text protocol round-trip benchmark
//!
//! Opens one connection to a memcached-compatible server and times a fixed
//! number of add/get/delete cycles against a single key.
//!
//! Features:
//! - Configurable payload size and repetition count
//! - Optional dump of every server response
//! - Configuration via CLI arguments or TOML file

mod bench;
mod config;
mod connection;
mod protocol;

use config::{Config, ConfigError};
use std::io;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        // Usage errors, --help and --version print and exit the clap way
        Err(ConfigError::Args(e)) => e.exit(),
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging; stdout is reserved for benchmark output
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        requests = config.requests,
        memory_size = config.memory_size,
        verbose = config.verbose,
        "Starting mc-bench"
    );

    let stdout = io::stdout();
    match bench::execute(&config, &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Benchmark aborted");
            ExitCode::FAILURE
        }
    }
}

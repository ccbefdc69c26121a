//! Configuration module for mc-bench.
//!
//! Supports both command-line arguments and an optional TOML configuration
//! file. CLI arguments take precedence over config file values.

use crate::protocol::MIN_PAYLOAD_SIZE;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the benchmark
#[derive(Parser, Debug)]
#[command(name = "mc-bench")]
#[command(author = "mc-bench authors")]
#[command(version = "0.1.0")]
#[command(about = "Memcached add/get/delete round-trip benchmark", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server address (default 127.0.0.1)
    #[arg(short = 's', long)]
    pub server: Option<String>,

    /// Server port (default 11211)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Number of add/get/delete repetitions (default 1000)
    #[arg(short = 'r', long)]
    pub requests: Option<u64>,

    /// Payload size in bytes for add, raised to 5 if smaller (default 1024)
    #[arg(short = 'm', long, allow_negative_numbers = true)]
    pub memory_size: Option<i64>,

    /// Print every response received from the server
    #[arg(short = 'v', long, overrides_with = "no_verbose")]
    pub verbose: bool,

    /// Do not print responses, even if the config file enables it
    #[arg(long, overrides_with = "verbose")]
    pub no_verbose: bool,

    /// Log level (trace, debug, info, warn, error; default info)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bench: BenchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Target server configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Benchmark loop configuration
#[derive(Debug, Deserialize)]
pub struct BenchConfig {
    /// Number of add/get/delete cycles
    #[serde(default = "default_requests")]
    pub requests: u64,
    /// Payload size for add
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,
    #[serde(default)]
    pub verbose: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            memory_size: default_memory_size(),
            verbose: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    11211
}

fn default_requests() -> u64 {
    1000
}

fn default_memory_size() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub requests: u64,
    /// Effective payload size, never below `MIN_PAYLOAD_SIZE`
    pub memory_size: usize,
    pub verbose: bool,
    pub log_level: String,
}

impl Config {
    /// Load configuration from the process arguments and optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::try_from_args(std::env::args_os())
    }

    /// Load configuration from an explicit argument list.
    ///
    /// Malformed arguments, `--help` and `--version` come back as
    /// `ConfigError::Args` rather than exiting.
    pub fn try_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = CliArgs::try_parse_from(args).map_err(ConfigError::Args)?;
        Self::from_cli(cli)
    }

    fn from_cli(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Ok(Self::merge(cli, toml_config))
    }

    /// Merge CLI args over TOML values
    fn merge(cli: CliArgs, toml_config: TomlConfig) -> Self {
        let memory_size = match cli.memory_size {
            Some(m) => usize::try_from(m).unwrap_or(0),
            None => toml_config.bench.memory_size,
        }
        .max(MIN_PAYLOAD_SIZE);

        Config {
            host: cli.server.unwrap_or(toml_config.server.host),
            port: cli.port.unwrap_or(toml_config.server.port),
            requests: cli.requests.unwrap_or(toml_config.bench.requests),
            memory_size,
            verbose: match (cli.verbose, cli.no_verbose) {
                (true, _) => true,
                (_, true) => false,
                _ => toml_config.bench.verbose,
            },
            log_level: cli.log_level.unwrap_or(toml_config.logging.level),
        }
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    Args(clap::Error),
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Args(e) => write!(f, "Invalid arguments: {}", e),
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::try_from_args(["mc-bench"]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 11211);
        assert_eq!(config.requests, 1000);
        assert_eq!(config.memory_size, 1024);
        assert!(!config.verbose);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_short_flags() {
        let config = Config::try_from_args([
            "mc-bench", "-s", "10.0.0.1", "-p", "22122", "-r", "7", "-m", "64", "-v",
        ])
        .unwrap();
        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 22122);
        assert_eq!(config.requests, 7);
        assert_eq!(config.memory_size, 64);
        assert!(config.verbose);
    }

    #[test]
    fn test_memory_size_clamped() {
        for m in ["-3", "0", "1", "4"] {
            let config = Config::try_from_args(["mc-bench", "-m", m]).unwrap();
            assert_eq!(config.memory_size, MIN_PAYLOAD_SIZE);
        }

        let config = Config::try_from_args(["mc-bench", "-m", "5"]).unwrap();
        assert_eq!(config.memory_size, 5);
    }

    #[test]
    fn test_zero_requests_allowed() {
        let config = Config::try_from_args(["mc-bench", "-r", "0"]).unwrap();
        assert_eq!(config.requests, 0);
    }

    #[test]
    fn test_malformed_integer_rejected() {
        let result = Config::try_from_args(["mc-bench", "-r", "many"]);
        assert!(matches!(result, Err(ConfigError::Args(_))));

        let result = Config::try_from_args(["mc-bench", "-p", "eleven"]);
        assert!(matches!(result, Err(ConfigError::Args(_))));
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [server]
            host = "192.168.1.10"
            port = 11311

            [bench]
            requests = 50
            memory_size = 4096
            verbose = true

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "192.168.1.10");
        assert_eq!(config.server.port, 11311);
        assert_eq!(config.bench.requests, 50);
        assert_eq!(config.bench.memory_size, 4096);
        assert!(config.bench.verbose);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
            [server]
            port = 11311

            [bench]
            requests = 50
            memory_size = 2

            [logging]
            level = "debug"
        "#,
        )
        .unwrap();

        let cli = CliArgs::try_parse_from(["mc-bench", "-r", "3"]).unwrap();
        let config = Config::merge(cli, toml_config);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 11311);
        assert_eq!(config.requests, 3);
        assert_eq!(config.memory_size, MIN_PAYLOAD_SIZE);
        assert_eq!(config.log_level, "debug");
    }

    fn verbose_debug_toml() -> TomlConfig {
        toml::from_str(
            r#"
            [bench]
            verbose = true

            [logging]
            level = "debug"
        "#,
        )
        .unwrap()
    }

    #[test]
    fn test_cli_log_level_info_overrides_toml() {
        let cli = CliArgs::try_parse_from(["mc-bench", "--log-level", "info"]).unwrap();
        let config = Config::merge(cli, verbose_debug_toml());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_cli_no_verbose_overrides_toml() {
        let cli = CliArgs::try_parse_from(["mc-bench"]).unwrap();
        assert!(Config::merge(cli, verbose_debug_toml()).verbose);

        let cli = CliArgs::try_parse_from(["mc-bench", "--no-verbose"]).unwrap();
        assert!(!Config::merge(cli, verbose_debug_toml()).verbose);

        // Last flag wins
        let cli = CliArgs::try_parse_from(["mc-bench", "--no-verbose", "-v"]).unwrap();
        assert!(Config::merge(cli, verbose_debug_toml()).verbose);
    }

    #[test]
    fn test_help_is_args_error() {
        let result = Config::try_from_args(["mc-bench", "--help"]);
        match result {
            Err(ConfigError::Args(e)) => {
                assert_eq!(e.kind(), clap::error::ErrorKind::DisplayHelp)
            }
            other => panic!("Expected help error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::try_from_args(["mc-bench", "-c", "/nonexistent/mc-bench.toml"]);
        assert!(matches!(result, Err(ConfigError::FileRead(_, _))));
    }
}

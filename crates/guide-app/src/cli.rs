//! CLI argument definitions for the museum guide.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Config file used when neither `--config` nor `MUSEUM_GUIDE_CONFIG` is set.
pub const DEFAULT_CONFIG_FILE: &str = "museum-guide.toml";

/// Museum guide: artifact analysis, chat, voice questions and fun facts,
/// served as a local web page.
#[derive(Parser, Debug)]
#[command(name = "museum-guide", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Interface to bind the HTTP server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Path to the secrets file holding GOOGLE_API_KEY.
    #[arg(short = 's', long = "secrets")]
    pub secrets: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MUSEUM_GUIDE_CONFIG env var > ./museum-guide.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MUSEUM_GUIDE_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Resolve the HTTP server port.
    ///
    /// Priority: --port flag > MUSEUM_GUIDE_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("MUSEUM_GUIDE_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    pub fn resolve_host(&self, config_host: &str) -> String {
        self.host
            .clone()
            .unwrap_or_else(|| config_host.to_string())
    }

    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    pub fn resolve_secrets_path(&self, config_path: &str) -> PathBuf {
        self.secrets
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }
}

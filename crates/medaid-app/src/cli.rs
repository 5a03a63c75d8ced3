//! CLI argument definitions for the MedAid application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// MedAid - first-aid guide retrieval and chat titles.
#[derive(Parser, Debug)]
#[command(name = "medaid", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the first-aid guides closest to a message.
    Query {
        text: String,

        /// Maximum number of guides (capped by retrieval.max_limit).
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,

        /// Metadata equality filter, repeatable: --filter type=burn
        #[arg(short = 'f', long = "filter", value_parser = parse_key_value)]
        filters: Vec<(String, Value)>,

        /// Print the assembled prompt context instead of the raw hits.
        #[arg(long = "context")]
        context: bool,
    },

    /// Summarize a chat message into a sidebar title.
    Title { text: String },

    /// List collections and their document counts.
    Collections,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MEDAID_CONFIG env var > ~/.medaid/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MEDAID_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".medaid").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".medaid").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// Parse `key=value`. Values that read as JSON keep their type, anything
/// else is a string.
fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {:?}", s));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

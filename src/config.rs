//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::rules::JsonRuleStore;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "tab-refresher")]
#[command(about = "A companion daemon that periodically reloads browser tabs matching URL rules")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Seconds between reconciliation ticks
    #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub tick_seconds: u64,

    /// Rules file (defaults to the user data directory)
    #[arg(short, long)]
    pub rules_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_seconds)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.rules_file.clone().unwrap_or_else(JsonRuleStore::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["tab-refresher"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.tick_interval(), Duration::from_secs(2));
        assert_eq!(config.log_level(), "info");
        assert!(config.rules_path().ends_with("tab-refresher/rules.json"));
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "tab-refresher", "-p", "9000", "--tick-seconds", "5", "--rules-file", "/tmp/r.json", "-v",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.tick_seconds, 5);
        assert_eq!(config.rules_path(), PathBuf::from("/tmp/r.json"));
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn zero_tick_is_rejected() {
        assert!(Config::try_parse_from(["tab-refresher", "--tick-seconds", "0"]).is_err());
    }
}

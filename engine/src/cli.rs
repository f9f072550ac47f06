//! CLI interface for Waypoint
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Waypoint travel mission orchestrator
///
/// Turns a travel goal into a plan, then researches it, budgets it and drafts
/// an itinerary concurrently, printing each result as soon as it is ready.
#[derive(Parser, Debug)]
#[command(name = "waypoint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a mission for a travel goal
    Run {
        /// The goal, e.g. "Plan a 5-day trip to Korea within $1,000"
        goal: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the configuration file location
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["waypoint", "run", "Plan a 5-day trip to Korea"]);
        if let Command::Run { goal } = cli.command {
            assert_eq!(goal, "Plan a 5-day trip to Korea");
        } else {
            panic!("Expected Run command");
        }
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "waypoint",
            "run",
            "Lisbon weekend",
            "--json",
            "--log",
            "debug",
            "--config",
            "/tmp/waypoint.toml",
        ]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/waypoint.toml")));
    }

    #[test]
    fn test_config_actions() {
        let cli = Cli::parse_from(["waypoint", "config", "show"]);
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));

        let cli = Cli::parse_from(["waypoint", "config", "path"]);
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Path
            }
        ));
    }

    #[test]
    fn test_run_requires_goal() {
        assert!(Cli::try_parse_from(["waypoint", "run"]).is_err());
    }
}

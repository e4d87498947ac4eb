//! Command-line arguments

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Quill - inline AI autocomplete for notes
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(bin_name = "quill")]
#[command(about = "Inline AI autocomplete for notes")]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: <config dir>/quill/config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log filter, overrides the configured level (RUST_LOG wins over both)
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,
}

/// Top-level subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Fetch one suggestion for a paragraph and print it
    Suggest {
        /// Text of the current paragraph up to the caret
        #[arg(value_name = "TEXT")]
        text: String,

        /// Note title
        #[arg(short, long, default_value = "")]
        title: String,

        /// Paragraph before the current one
        #[arg(long)]
        previous: Option<String>,

        /// Paragraph after the current one
        #[arg(long)]
        next: Option<String>,
    },

    /// Interactive line-driven editing session with live suggestions
    Session {
        /// Note title
        #[arg(short, long, default_value = "")]
        title: String,

        /// Override the debounce delay in milliseconds
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,

        /// Initial paragraphs of the note
        #[arg(value_name = "PARAGRAPH")]
        paragraphs: Vec<String>,
    },

    /// Show or write configuration
    Config {
        /// What to do with the configuration
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for `quill config`
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_session_arguments() {
        let cli = Cli::parse_from([
            "quill", "session", "--title", "Ideas", "--debounce-ms", "500", "First", "Second",
        ]);
        match cli.command {
            Commands::Session {
                title,
                debounce_ms,
                paragraphs,
            } => {
                assert_eq!(title, "Ideas");
                assert_eq!(debounce_ms, Some(500));
                assert_eq!(paragraphs, vec!["First", "Second"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["quill", "config", "show", "--config", "/tmp/q.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/q.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }
}

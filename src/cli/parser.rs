//! CLI argument parsing with clap
//!
//! Defines the operator commands, their arguments and their documentation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::config::Environment;

/// Operator tooling for the bazaar marketplace store
#[derive(Parser, Debug)]
#[command(name = "bazaar-rs")]
#[command(about = "Operator tooling for the bazaar marketplace store")]
#[command(long_about = "
bazaar-rs manages the marketplace document store: users, articles with their
likes and comments, direct messages and friend requests.

EXAMPLES:
    # Validate configuration and print a summary
    bazaar-rs check

    # Preview pending migrations
    bazaar-rs migrate --dry-run

    # Apply migrations and initialise indexes
    bazaar-rs --env production migrate

    # Print the article feed as seen by a user
    bazaar-rs feed --user 9b2f0c4e-5d1a-4f7e-8a8e-2b7c1f0d3e21

    # Only articles posted by that user's friends
    bazaar-rs feed --user 9b2f0c4e-5d1a-4f7e-8a8e-2b7c1f0d3e21 --friends

    # Print a user's conversation list
    bazaar-rs conversations --user 9b2f0c4e-5d1a-4f7e-8a8e-2b7c1f0d3e21
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Use a single TOML file instead of the layered `config/` directory.
    /// The file must exist and be readable.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the `{env}.toml` layer. Overrides BAZAAR_APP_ENV.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Load and validate the configuration, then print a summary
    Check,

    /// Apply embedded migrations and initialise indexes
    ///
    /// Examples:
    ///   bazaar-rs migrate             # Apply pending migrations
    ///   bazaar-rs migrate --dry-run   # List pending migrations only
    Migrate {
        /// Show pending migrations without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the article feed as JSON
    Feed {
        /// Viewer id, used for the `hasLiked` flag
        #[arg(short, long, value_name = "UUID", value_parser = super::validation::validate_user_id)]
        user: Uuid,

        /// Only articles posted by the viewer's friends
        #[arg(long)]
        friends: bool,
    },

    /// Print a user's conversation summaries as JSON
    Conversations {
        #[arg(short, long, value_name = "UUID", value_parser = super::validation::validate_user_id)]
        user: Uuid,
    },
}

impl Cli {
    /// Log level forced by `--verbose` or `--quiet`, if any
    pub fn level_override(&self) -> Option<&'static str> {
        match (self.verbose, self.quiet) {
            (true, _) => Some("debug"),
            (_, true) => Some("error"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_flag() {
        let err = Cli::try_parse_from(["bazaar-rs", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["bazaar-rs", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["bazaar-rs"]).is_err());
    }

    #[test]
    fn test_migrate_command() {
        let cli = Cli::try_parse_from(["bazaar-rs", "migrate", "--dry-run"]).unwrap();
        assert_eq!(cli.command, Commands::Migrate { dry_run: true });
    }

    #[test]
    fn test_feed_command() {
        let id = Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from(["bazaar-rs", "feed", "--user", &id, "--friends"]).unwrap();
        match cli.command {
            Commands::Feed { user, friends } => {
                assert_eq!(user.to_string(), id);
                assert!(friends);
            }
            other => panic!("Expected Feed command, got {other:?}"),
        }

        assert!(Cli::try_parse_from(["bazaar-rs", "feed", "--user", "bob"]).is_err());
    }

    #[test]
    fn test_environment_alias() {
        let cli = Cli::try_parse_from(["bazaar-rs", "--env", "prod", "check"]).unwrap();
        assert_eq!(cli.env, Some(Environment::Production));
    }

    #[test]
    fn test_level_override() {
        let cli = Cli::try_parse_from(["bazaar-rs", "--verbose", "check"]).unwrap();
        assert_eq!(cli.level_override(), Some("debug"));

        let cli = Cli::try_parse_from(["bazaar-rs", "-q", "check"]).unwrap();
        assert_eq!(cli.level_override(), Some("error"));

        let cli = Cli::try_parse_from(["bazaar-rs", "check"]).unwrap();
        assert_eq!(cli.level_override(), None);
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["bazaar-rs", "--verbose", "--quiet", "check"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}

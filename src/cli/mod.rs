//! CLI module for bazaar-rs
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing with clap
//! - Configuration loading with CLI overrides
//! - Command dispatch to the handlers

pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use executor::execute_command;
pub use parser::{Cli, Commands};

use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, Settings};
use crate::logger::init_logger;

/// Load settings, applying `--config`, `--env` and the verbosity flags.
///
/// # Returns
/// The validated settings and the environment they were loaded for
pub fn load_settings(cli: &Cli) -> Result<(Settings, Environment), ConfigError> {
    let mut loader = ConfigLoader::new()?;
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path);
    }
    if let Some(environment) = cli.env {
        loader = loader.with_environment(environment);
    }

    let mut settings = loader.load()?;
    if let Some(level) = cli.level_override() {
        settings.logger.level = level.to_string();
    }
    Ok((settings, loader.environment()))
}

/// Initialize the global logger from settings
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings.logger.clone().into_logger_config()?;
    init_logger(logger_config)?;
    Ok(())
}

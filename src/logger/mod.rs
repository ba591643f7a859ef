//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output with color control (ANSI only on a terminal)
//! - File output in Full, Compact or JSON format
//! - Falling back to stderr when the log file stops accepting writes

pub mod config;
pub mod error;
mod writer;

pub use config::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};
pub use error::LoggerError;
pub use writer::LogFileWriter;

use std::io::IsTerminal;

use tracing_subscriber::{Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global subscriber with the given configuration.
///
/// Fails if the configuration is invalid or a global subscriber is already set.
pub fn init_logger(config: LoggerConfig) -> Result<(), LoggerError> {
    config.validate()?;
    let filter = config.filter()?;

    // The file layer goes first so console ANSI settings never leak into it.
    // See: https://github.com/tokio-rs/tracing/issues/1817
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggerError::subscriber(e.to_string()))
}

fn console_layer(config: &ConsoleConfig) -> BoxedLayer {
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = LogFileWriter::new(config)?;

    Ok(match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    })
}

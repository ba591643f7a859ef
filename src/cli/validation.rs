//! CLI argument validation functions
//!
//! Checks that go beyond what clap validates on its own.

use std::fs;
use std::path::PathBuf;

use uuid::Uuid;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{path_str}'"));
    }
    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{path_str}'"));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{path_str}': {e}")),
    }
}

/// Validate a user identifier given on the command line
pub fn validate_user_id(id_str: &str) -> Result<Uuid, String> {
    let id = id_str.trim();
    if id.is_empty() {
        return Err("User id cannot be empty".to_string());
    }
    Uuid::parse_str(id).map_err(|e| format!("User id must be a UUID, got '{id}': {e}"))
}

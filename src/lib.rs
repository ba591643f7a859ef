//! Bazaar-RS Library
//!
//! Data-access core of a social marketplace: users, article listings with
//! likes and comments, direct messages and friend requests, over PostgreSQL
//! or an in-memory store.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod models;
pub mod repositories;
pub mod schema;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}

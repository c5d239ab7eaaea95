//! Configuration management
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. Configuration file (TOML by default; INI, YAML and JSON by extension)
//! 3. Environment variables, including a `.env` file
//! 4. Command-line overrides
//!
//! # Environment Variables
//!
//! Any setting can be overridden with `GOLDTBOT__<section>__<key>`:
//! - `GOLDTBOT__REDDIT__CLIENT_ID=abc`
//! - `GOLDTBOT__ENGINE__FAULT_SLEEP=10m`
//! - `GOLDTBOT__ARCHIVE__ENDPOINT=https://archive.ph`
//!
//! The Reddit secrets are also read from `REDDIT_CLIENT_SECRET` and
//! `REDDIT_PASSWORD`.
//!
//! # Configuration File
//!
//! Given with `--config`, else `$GOLDTBOT_CONFIG`, else
//! `config/goldtbot.toml`. An INI file with a `[MaxGoldtBot]` section is
//! read as the `[reddit]` section.

mod models;
mod sources;
mod validation;

pub use models::{
    ArchiveConfig, Config, EngineSettings, Overrides, RedditConfig, RetentionConfig,
};
pub use validation::ValidationError;

use crate::item::ItemKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources and apply `overrides`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file is malformed
    /// - Validation fails (missing credentials, bad retention marks, etc.)
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = sources::load(config_file)?;
        config.apply_overrides(overrides);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, skipping `.env` and the
    /// secret variables
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: PathBuf, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        config.apply_overrides(overrides);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Ledger files of the comment and submission engines for `stream`
    pub fn engine_ledgers(&self, stream: &str) -> Result<(PathBuf, PathBuf), ConfigError> {
        let comments = self.ledger_path(ItemKind::Comment, stream);
        let submissions = self.ledger_path(ItemKind::Submission, stream);
        validation::validate_ledger_paths(&comments, &submissions)?;
        Ok((comments, submissions))
    }
}

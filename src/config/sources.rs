use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "GOLDTBOT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/goldtbot.toml";
const ENV_PREFIX: &str = "GOLDTBOT";
const ENV_SEPARATOR: &str = "__";

const CLIENT_SECRET_VAR: &str = "REDDIT_CLIENT_SECRET";
const PASSWORD_VAR: &str = "REDDIT_PASSWORD";

/// Config file to read: the explicit path, else `$GOLDTBOT_CONFIG`, else
/// `config/goldtbot.toml`
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
    }
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. Config file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let mut config = load_from_sources(config_path(explicit))?;
    load_secrets(&mut config);
    Ok(config)
}

/// Secrets may come from plain environment variables instead of the file
fn load_secrets(config: &mut Config) {
    if let Ok(secret) = env::var(CLIENT_SECRET_VAR) {
        config.reddit.client_secret = Some(secret);
    }
    if let Ok(password) = env::var(PASSWORD_VAR) {
        config.reddit.password = Some(password);
    }
}

/// Load configuration from a specific path and environment.
/// The file format follows its extension (TOML, INI, YAML, JSON).
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // GOLDTBOT__REDDIT__CLIENT_ID -> reddit.client_id
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let mut config: Config = builder.build()?.try_deserialize()?;
    if let Some(legacy) = config.legacy_reddit.take() {
        config.reddit.merge_missing(legacy);
    }
    Ok(config)
}

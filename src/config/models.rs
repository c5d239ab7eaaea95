use crate::archive::ArchiveClientConfig;
use crate::humanize::HumanDuration;
use crate::item::ItemKind;
use crate::ledger::{LEDGER_HIGH_WATER, LEDGER_LOW_WATER, RetentionPolicy, default_ledger_path};
use crate::platform::RedditCredentials;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub reddit: RedditConfig,
    /// `[MaxGoldtBot]` section of INI config files, folded into `reddit`
    #[serde(default, rename = "maxgoldtbot", alias = "MaxGoldtBot", skip_serializing)]
    pub legacy_reddit: Option<RedditConfig>,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Reddit script-app credentials
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct RedditConfig {
    pub client_id: Option<String>,
    /// Also read from `REDDIT_CLIENT_SECRET`
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub user_agent: Option<String>,
    pub username: Option<String>,
    /// Also read from `REDDIT_PASSWORD`
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl std::fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("RedditConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("user_agent", &self.user_agent)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

impl RedditConfig {
    /// Fill fields missing here from `other`
    pub(crate) fn merge_missing(&mut self, other: RedditConfig) {
        self.client_id = self.client_id.take().or(other.client_id);
        self.client_secret = self.client_secret.take().or(other.client_secret);
        self.user_agent = self.user_agent.take().or(other.user_agent);
        self.username = self.username.take().or(other.username);
        self.password = self.password.take().or(other.password);
    }
}

/// archive.today client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_archive_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_archive_timeout")]
    pub timeout: HumanDuration,
    #[serde(default = "default_archive_user_agent")]
    pub user_agent: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            endpoint: default_archive_endpoint(),
            timeout: default_archive_timeout(),
            user_agent: default_archive_user_agent(),
        }
    }
}

fn default_archive_endpoint() -> String {
    ArchiveClientConfig::default().endpoint
}

fn default_archive_timeout() -> HumanDuration {
    HumanDuration::from_secs(120)
}

fn default_archive_user_agent() -> String {
    ArchiveClientConfig::default().user_agent
}

/// Stream engine settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Pause after a platform fault before the stream is reopened
    #[serde(default = "default_fault_sleep")]
    pub fault_sleep: HumanDuration,
    /// Directory holding ledgers with default names
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: PathBuf,
    pub comment_ledger: Option<PathBuf>,
    pub submission_ledger: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fault_sleep: default_fault_sleep(),
            ledger_dir: default_ledger_dir(),
            comment_ledger: None,
            submission_ledger: None,
        }
    }
}

fn default_fault_sleep() -> HumanDuration {
    HumanDuration::from_secs(900)
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Ledger pruning marks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_high_water")]
    pub high_water: usize,
    #[serde(default = "default_low_water")]
    pub low_water: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            high_water: default_high_water(),
            low_water: default_low_water(),
        }
    }
}

fn default_high_water() -> usize {
    LEDGER_HIGH_WATER
}

fn default_low_water() -> usize {
    LEDGER_LOW_WATER
}

/// Command-line values that take precedence over every other source
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub comment_ledger: Option<PathBuf>,
    pub submission_ledger: Option<PathBuf>,
    pub fault_sleep: Option<HumanDuration>,
}

impl Config {
    pub(crate) fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(path) = &overrides.comment_ledger {
            self.engine.comment_ledger = Some(path.clone());
        }
        if let Some(path) = &overrides.submission_ledger {
            self.engine.submission_ledger = Some(path.clone());
        }
        if let Some(sleep) = overrides.fault_sleep {
            self.engine.fault_sleep = sleep;
        }
    }

    /// Ledger file for the engine of `kind` consuming `stream`
    pub fn ledger_path(&self, kind: ItemKind, stream: &str) -> PathBuf {
        let explicit = match kind {
            ItemKind::Comment => &self.engine.comment_ledger,
            ItemKind::Submission => &self.engine.submission_ledger,
        };
        explicit
            .clone()
            .unwrap_or_else(|| default_ledger_path(&self.engine.ledger_dir, kind, stream))
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            high_water: self.retention.high_water,
            low_water: self.retention.low_water,
        }
    }

    /// Credentials for the Reddit client; `None` if any field is missing
    pub fn reddit_credentials(&self) -> Option<RedditCredentials> {
        let reddit = &self.reddit;
        Some(RedditCredentials {
            client_id: reddit.client_id.clone()?,
            client_secret: reddit.client_secret.clone()?,
            username: reddit.username.clone()?,
            password: reddit.password.clone()?,
            user_agent: reddit.user_agent.clone()?,
        })
    }

    pub fn archive_client_config(&self) -> ArchiveClientConfig {
        ArchiveClientConfig {
            endpoint: self.archive.endpoint.clone(),
            timeout: self.archive.timeout.as_duration(),
            user_agent: self.archive.user_agent.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.fault_sleep.as_duration().as_secs(), 900);
        assert_eq!(config.archive.endpoint, "https://archive.today");
        assert_eq!(config.retention_policy(), RetentionPolicy::default());
        assert!(config.reddit_credentials().is_none());
    }

    #[test]
    fn test_ledger_path_default_and_explicit() {
        let mut config = Config::default();
        assert_eq!(
            config.ledger_path(ItemKind::Comment, "de"),
            Path::new(".").join("processed_comments_de.txt")
        );

        config.apply_overrides(&Overrides {
            submission_ledger: Some(PathBuf::from("/var/lib/bot/subs.txt")),
            ..Default::default()
        });
        assert_eq!(
            config.ledger_path(ItemKind::Submission, "de"),
            PathBuf::from("/var/lib/bot/subs.txt")
        );
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut reddit = RedditConfig {
            client_id: Some("primary".into()),
            ..Default::default()
        };
        reddit.merge_missing(RedditConfig {
            client_id: Some("legacy".into()),
            username: Some("MaxGoldtBot".into()),
            ..Default::default()
        });
        assert_eq!(reddit.client_id.as_deref(), Some("primary"));
        assert_eq!(reddit.username.as_deref(), Some("MaxGoldtBot"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let reddit = RedditConfig {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        assert!(!format!("{reddit:?}").contains("hunter2"));
    }
}

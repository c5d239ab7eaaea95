use super::models::Config;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing Reddit setting '{field}' (set it in [reddit] or via {hint})")]
    MissingRedditField { field: &'static str, hint: String },

    #[error("Fault sleep must be positive")]
    ZeroFaultSleep,

    #[error("Invalid archive endpoint '{endpoint}', expected http:// or https://")]
    InvalidArchiveEndpoint { endpoint: String },

    #[error("Retention low_water must be positive")]
    ZeroLowWater,

    #[error("Retention low_water ({low_water}) must be below high_water ({high_water})")]
    RetentionMarks { low_water: usize, high_water: usize },

    #[error("Comment and submission engines share the ledger {path}")]
    SharedLedger { path: PathBuf },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_reddit(config)?;
    validate_engine(config)?;
    validate_archive(config)?;
    validate_retention(config)?;
    Ok(())
}

fn validate_reddit(config: &Config) -> Result<(), ValidationError> {
    let reddit = &config.reddit;
    let fields: [(&'static str, &Option<String>, Option<&str>); 5] = [
        ("client_id", &reddit.client_id, None),
        ("client_secret", &reddit.client_secret, Some("REDDIT_CLIENT_SECRET")),
        ("user_agent", &reddit.user_agent, None),
        ("username", &reddit.username, None),
        ("password", &reddit.password, Some("REDDIT_PASSWORD")),
    ];

    for (field, value, secret_var) in fields {
        let present = value.as_deref().is_some_and(|v| !v.trim().is_empty());
        if !present {
            let hint = match secret_var {
                Some(var) => var.to_string(),
                None => format!("GOLDTBOT__REDDIT__{}", field.to_ascii_uppercase()),
            };
            return Err(ValidationError::MissingRedditField { field, hint });
        }
    }
    Ok(())
}

fn validate_engine(config: &Config) -> Result<(), ValidationError> {
    if config.engine.fault_sleep.is_zero() {
        return Err(ValidationError::ZeroFaultSleep);
    }
    Ok(())
}

fn validate_archive(config: &Config) -> Result<(), ValidationError> {
    let endpoint = &config.archive.endpoint;
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(ValidationError::InvalidArchiveEndpoint {
            endpoint: endpoint.clone(),
        });
    }
    Ok(())
}

fn validate_retention(config: &Config) -> Result<(), ValidationError> {
    let retention = &config.retention;
    if retention.low_water == 0 {
        return Err(ValidationError::ZeroLowWater);
    }
    if retention.low_water >= retention.high_water {
        return Err(ValidationError::RetentionMarks {
            low_water: retention.low_water,
            high_water: retention.high_water,
        });
    }
    Ok(())
}

/// Each engine must own its ledger exclusively
pub fn validate_ledger_paths(comments: &Path, submissions: &Path) -> Result<(), ValidationError> {
    if comments == submissions {
        return Err(ValidationError::SharedLedger {
            path: comments.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.reddit.client_id = Some("id".into());
        config.reddit.client_secret = Some("secret".into());
        config.reddit.user_agent = Some("goldtbot test".into());
        config.reddit.username = Some("MaxGoldtBot".into());
        config.reddit.password = Some("pw".into());
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&create_test_config()).is_ok());
    }

    #[test]
    fn test_missing_secret_names_env_var() {
        let mut config = create_test_config();
        config.reddit.password = None;

        match validate(&config) {
            Err(ValidationError::MissingRedditField { field, hint }) => {
                assert_eq!(field, "password");
                assert_eq!(hint, "REDDIT_PASSWORD");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_blank_field_is_missing() {
        let mut config = create_test_config();
        config.reddit.username = Some("  ".into());

        assert!(matches!(
            validate(&config),
            Err(ValidationError::MissingRedditField { field: "username", .. })
        ));
    }

    #[test]
    fn test_zero_fault_sleep() {
        let mut config = create_test_config();
        config.engine.fault_sleep = HumanDuration::from_secs(0);
        assert!(matches!(validate(&config), Err(ValidationError::ZeroFaultSleep)));
    }

    #[test]
    fn test_invalid_archive_endpoint() {
        let mut config = create_test_config();
        config.archive.endpoint = "archive.today".into();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidArchiveEndpoint { .. })
        ));
    }

    #[test]
    fn test_retention_marks() {
        let mut config = create_test_config();
        config.retention.low_water = 600;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::RetentionMarks { .. })
        ));

        config.retention.low_water = 0;
        assert!(matches!(validate(&config), Err(ValidationError::ZeroLowWater)));
    }

    #[test]
    fn test_shared_ledger() {
        let path = PathBuf::from("processed.txt");
        assert!(matches!(
            validate_ledger_paths(&path, &path),
            Err(ValidationError::SharedLedger { .. })
        ));
        assert!(validate_ledger_paths(&path, &PathBuf::from("other.txt")).is_ok());
    }
}

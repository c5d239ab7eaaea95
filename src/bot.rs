//! Process runtime: wires one engine per item kind and runs them until
//! interrupted

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::archive::{ArchiveError, ArchiveGateway, ArchiveTodayClient, SnapshotService};
use crate::config::{Config, ConfigError};
use crate::engine::{EngineConfig, ItemProcessor, StreamEngine};
use crate::item::ItemKind;
use crate::observability::Metrics;
use crate::platform::{Platform, PlatformError, RedditClient};

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Reddit credentials are incomplete")]
    MissingCredentials,

    #[error("Reddit client setup failed: {0}")]
    Platform(#[from] PlatformError),

    #[error("Archive client setup failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("All {0} engines terminated with errors")]
    AllEnginesFailed(usize),
}

/// Engine settings for each item kind consuming `stream`
pub fn engine_configs(config: &Config, stream: &str) -> Result<Vec<EngineConfig>, BotError> {
    let (comment_ledger, submission_ledger) = config.engine_ledgers(stream)?;

    Ok(ItemKind::ALL
        .into_iter()
        .map(|kind| EngineConfig {
            kind,
            stream: stream.to_string(),
            ledger_path: match kind {
                ItemKind::Comment => comment_ledger.clone(),
                ItemKind::Submission => submission_ledger.clone(),
            },
            fault_sleep: config.engine.fault_sleep.as_duration(),
            retention: config.retention_policy(),
        })
        .collect())
}

/// Assemble an engine with its own processor and counters
pub fn build_engine(
    config: EngineConfig,
    platform: Arc<dyn Platform>,
    snapshots: Arc<dyn SnapshotService>,
) -> StreamEngine {
    let metrics = Arc::new(Metrics::new());
    let processor = ItemProcessor::new(
        platform.clone(),
        ArchiveGateway::new(snapshots),
        metrics.clone(),
    );
    StreamEngine::new(config, platform, Arc::new(processor), metrics)
}

/// Run both engines against Reddit until interrupted
pub async fn run(config: Config, stream: String) -> Result<(), BotError> {
    let mut engines = Vec::new();
    for engine_config in engine_configs(&config, &stream)? {
        // Sessions are never shared between engines
        let credentials = config
            .reddit_credentials()
            .ok_or(BotError::MissingCredentials)?;
        let platform: Arc<dyn Platform> = Arc::new(RedditClient::new(credentials)?);
        let snapshots: Arc<dyn SnapshotService> =
            Arc::new(ArchiveTodayClient::new(config.archive_client_config())?);
        engines.push(build_engine(engine_config, platform, snapshots));
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_interrupts(shutdown.clone()));

    info!(stream = %stream, engines = engines.len(), "Bot started");
    run_engines(engines, shutdown).await
}

/// Run engines to completion.
///
/// Fails only when every engine ended with an error; an engine stopped by
/// `shutdown` counts as a clean exit.
pub async fn run_engines(
    engines: Vec<StreamEngine>,
    shutdown: CancellationToken,
) -> Result<(), BotError> {
    let mut tasks = JoinSet::new();
    for engine in engines {
        tasks.spawn(engine.run(shutdown.clone()));
    }

    let total = tasks.len();
    let mut failed = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failed += 1;
                error!(error = %e, remaining = tasks.len(), "Engine terminated");
            }
            Err(e) => {
                failed += 1;
                error!(error = %e, remaining = tasks.len(), "Engine task panicked");
            }
        }
    }

    if total > 0 && failed == total {
        return Err(BotError::AllEnginesFailed(total));
    }
    Ok(())
}

/// First interrupt cancels `shutdown` and lets in-flight items finish; a
/// second one exits at once
async fn watch_interrupts(shutdown: CancellationToken) {
    shutdown_signal().await;
    error!("Manual interrupt, stopping engines");
    shutdown.cancel();

    shutdown_signal().await;
    error!("Second interrupt, exiting now");
    std::process::exit(0);
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::HumanDuration;
    use std::path::PathBuf;

    #[test]
    fn test_engine_configs_cover_both_kinds() {
        let mut config = Config::default();
        config.engine.ledger_dir = PathBuf::from("data");
        config.engine.fault_sleep = HumanDuration::from_secs(60);

        let configs = engine_configs(&config, "de").unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].kind, ItemKind::Comment);
        assert_eq!(configs[0].ledger_path, PathBuf::from("data/processed_comments_de.txt"));
        assert_eq!(configs[1].kind, ItemKind::Submission);
        assert_eq!(
            configs[1].ledger_path,
            PathBuf::from("data/processed_submissions_de.txt")
        );
        assert!(configs.iter().all(|c| c.fault_sleep.as_secs() == 60));
    }

    #[test]
    fn test_engine_configs_reject_shared_ledger() {
        let mut config = Config::default();
        let shared = PathBuf::from("processed.txt");
        config.engine.comment_ledger = Some(shared.clone());
        config.engine.submission_ledger = Some(shared);

        assert!(matches!(
            engine_configs(&config, "de"),
            Err(BotError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_no_engines_is_ok() {
        assert!(run_engines(Vec::new(), CancellationToken::new()).await.is_ok());
    }
}

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::processor::{ItemHandler, Outcome};
use crate::humanize::HumanDuration;
use crate::item::{Item, ItemKind};
use crate::ledger::{Ledger, RetentionPolicy};
use crate::observability::Metrics;
use crate::platform::{Platform, PlatformError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unrecoverable platform error: {0}")]
    Fatal(#[from] PlatformError),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub kind: ItemKind,
    /// Stream source name, e.g. a subreddit
    pub stream: String,
    pub ledger_path: PathBuf,
    pub fault_sleep: Duration,
    pub retention: RetentionPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Sleeping,
    Terminated,
}

/// What the engine did with one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Already in the ledger
    Skipped,
    Processed(Outcome),
}

/// Long-running consumer of one item stream.
///
/// Owns its ledger. Items are handled one at a time in stream order and
/// recorded once handling returns, whatever the outcome. Platform faults put
/// the engine to sleep for `fault_sleep` before the stream is reopened at
/// the live tip.
pub struct StreamEngine {
    config: EngineConfig,
    platform: Arc<dyn Platform>,
    handler: Arc<dyn ItemHandler>,
    ledger: Ledger,
    metrics: Arc<Metrics>,
    state: watch::Sender<EngineState>,
}

impl StreamEngine {
    pub fn new(
        config: EngineConfig,
        platform: Arc<dyn Platform>,
        handler: Arc<dyn ItemHandler>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let ledger = Ledger::load_with_policy(&config.ledger_path, config.retention);
        Self {
            config,
            platform,
            handler,
            ledger,
            metrics,
            state: watch::channel(EngineState::Running).0,
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Follow state transitions while the engine runs
    pub fn subscribe_state(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    fn set_state(&self, next: EngineState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = ?previous, to = ?next, "Engine state changed");
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Handle one item unless the ledger already has it.
    ///
    /// On `Ok` the item is recorded and the ledger pruned if it grew past
    /// the high-water mark. On `Err` nothing is recorded.
    pub async fn handle_item(&mut self, item: &Item) -> Result<Disposition, PlatformError> {
        self.metrics.item_seen();

        if self.ledger.contains(&item.id) {
            debug!(id = %item.id, "Already processed, skipping");
            self.metrics.item_skipped();
            return Ok(Disposition::Skipped);
        }

        debug!(
            id = %item.id,
            author = item.author_name(),
            age_secs = item.age_at(Utc::now()).map(|age| age.num_seconds()),
            "Handling item"
        );
        let outcome = self.handler.handle(item).await?;
        self.metrics.item_processed();

        self.ledger.record(&item.id);
        if let Some(stats) = self.ledger.prune_if_needed() {
            debug!(
                before = stats.before,
                kept = stats.kept,
                persisted = stats.persisted,
                "Ledger pruned"
            );
        }

        Ok(Disposition::Processed(outcome))
    }

    /// Pull items until cancelled or the stream faults. Cancellation is
    /// only observed between items.
    async fn consume(&mut self, shutdown: &CancellationToken) -> Result<(), PlatformError> {
        let mut stream = self
            .platform
            .open_stream(self.config.kind, &self.config.stream);

        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(()),
                next = stream.next_item() => next?,
            };
            self.handle_item(&item).await?;
        }
    }

    /// Run until `shutdown` fires or an unexpected error occurs
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), EngineError> {
        let span = info_span!(
            "engine",
            kind = %self.config.kind,
            stream = %self.config.stream
        );

        async move {
            info!(
                ledger = %self.config.ledger_path.display(),
                loaded = self.ledger.len(),
                "Engine started"
            );

            let result = self.run_loop(&shutdown).await;
            self.set_state(EngineState::Terminated);

            let snapshot = self.metrics.snapshot();
            match &result {
                Ok(()) => info!(?snapshot, "Engine stopped"),
                Err(e) => error!(error = %e, ?snapshot, "Engine terminated"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_loop(&mut self, shutdown: &CancellationToken) -> Result<(), EngineError> {
        loop {
            self.set_state(EngineState::Running);

            let fault = match self.consume(shutdown).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_fault() => e,
                Err(e) => return Err(EngineError::Fatal(e)),
            };

            self.metrics.stream_fault();
            warn!(
                error = %fault,
                sleep = %HumanDuration(self.config.fault_sleep).to_human_readable(),
                "Stream fault, sleeping"
            );

            self.set_state(EngineState::Sleeping);
            self.metrics.fault_sleep();
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.config.fault_sleep) => {}
            }
            debug!("Resuming stream");
        }
    }
}

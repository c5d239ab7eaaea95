//! Per-item processing: extract, archive, reply

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::archive::ArchiveGateway;
use crate::extract::extract_references;
use crate::item::{Item, ItemKind};
use crate::observability::Metrics;
use crate::platform::{Platform, PlatformError};
use crate::reply::compose_reply;

/// What processing an item amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No target-domain links in the item
    NoReferences,
    /// Links found, none could be archived
    NoReply { found: usize },
    /// Reply posted with `links` archived URLs out of `found` references
    Replied { found: usize, links: usize },
    /// The platform will never accept a reply to this item
    Rejected { found: usize, links: usize },
}

/// Handles one item taken off a stream.
///
/// A returned error is a platform fault (a failed reply) and is handled by
/// the engine like a stream fault. A permanently rejected reply is an
/// outcome, not an error, so the item still gets recorded.
#[async_trait]
pub trait ItemHandler: Send + Sync {
    async fn handle(&self, item: &Item) -> Result<Outcome, PlatformError>;
}

/// Text scanned for references. Submissions fall back to their own URL
/// when the self-text is empty.
pub fn reference_text(item: &Item) -> &str {
    match item.kind {
        ItemKind::Comment => &item.body,
        ItemKind::Submission if !item.body.is_empty() => &item.body,
        ItemKind::Submission => item.url.as_deref().unwrap_or(""),
    }
}

pub struct ItemProcessor {
    platform: Arc<dyn Platform>,
    gateway: ArchiveGateway,
    metrics: Arc<Metrics>,
}

impl ItemProcessor {
    pub fn new(platform: Arc<dyn Platform>, gateway: ArchiveGateway, metrics: Arc<Metrics>) -> Self {
        Self {
            platform,
            gateway,
            metrics,
        }
    }
}

#[async_trait]
impl ItemHandler for ItemProcessor {
    async fn handle(&self, item: &Item) -> Result<Outcome, PlatformError> {
        let references = extract_references(reference_text(item));
        if references.is_empty() {
            debug!(id = %item.id, "No links found");
            return Ok(Outcome::NoReferences);
        }
        info!(
            id = %item.id,
            author = item.author_name(),
            found = references.len(),
            "Found links"
        );

        // One capture at a time, in order of appearance
        let mut archived = Vec::with_capacity(references.len());
        for url in &references {
            let result = self.gateway.archive(url).await;
            self.metrics.capture(result.is_some());
            archived.extend(result);
        }

        if archived.len() != references.len() {
            warn!(
                id = %item.id,
                found = references.len(),
                archived = archived.len(),
                "Could not archive all links"
            );
        }

        if archived.is_empty() {
            warn!(id = %item.id, "No links archived, not replying");
            return Ok(Outcome::NoReply {
                found: references.len(),
            });
        }

        let body = compose_reply(&archived);
        match self.platform.reply(item, &body).await {
            Ok(()) => {}
            Err(PlatformError::Rejected(reason)) => {
                warn!(id = %item.id, %reason, "Reply permanently rejected, giving up on item");
                return Ok(Outcome::Rejected {
                    found: references.len(),
                    links: archived.len(),
                });
            }
            Err(e) => return Err(e),
        }
        self.metrics.reply_sent();
        info!(id = %item.id, links = archived.len(), "Replied");

        Ok(Outcome::Replied {
            found: references.len(),
            links: archived.len(),
        })
    }
}

//! Archival gateway
//!
//! Wraps a [`SnapshotService`] so a single capture attempt per URL either
//! yields an archive URL or `None`. Errors never leave the gateway.

mod client;
mod mock;

pub use client::{ArchiveClientConfig, ArchiveTodayClient};
pub use mock::MockSnapshotService;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Capture timed out")]
    Timeout,

    #[error("Archive service returned HTTP {0}")]
    Status(u16),

    #[error("Invalid archive endpoint: {0}")]
    InvalidEndpoint(String),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// External snapshot service. `Ok(None)` means the service gave no archive URL.
#[async_trait]
pub trait SnapshotService: Send + Sync {
    async fn capture(&self, url: &str) -> Result<Option<String>>;
}

/// Single-attempt, failure-isolating front of a snapshot service
#[derive(Clone)]
pub struct ArchiveGateway {
    service: Arc<dyn SnapshotService>,
}

impl ArchiveGateway {
    pub fn new(service: Arc<dyn SnapshotService>) -> Self {
        Self { service }
    }

    /// Capture `url` once. Empty results and errors become `None`.
    pub async fn archive(&self, url: &str) -> Option<String> {
        info!(url, "Capturing");
        match self.service.capture(url).await {
            Ok(Some(archived)) if !archived.trim().is_empty() => {
                info!(url, archived = %archived, "Captured");
                Some(archived)
            }
            Ok(_) => {
                warn!(url, "Got an empty archive URL back");
                None
            }
            Err(e) => {
                warn!(url, error = %e, "Capture failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_passes_through() {
        let service = Arc::new(MockSnapshotService::new());
        let gateway = ArchiveGateway::new(service.clone());

        let archived = gateway.archive("https://www.bild.de/a.html").await;
        assert_eq!(archived.as_deref(), Some("https://archive.ph/mock1"));
        assert_eq!(service.calls(), vec!["https://www.bild.de/a.html"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_none() {
        let service = Arc::new(MockSnapshotService::new());
        service.respond_empty("https://www.bild.de/a.html");
        let gateway = ArchiveGateway::new(service);

        assert!(gateway.archive("https://www.bild.de/a.html").await.is_none());
    }

    #[tokio::test]
    async fn test_error_is_none_and_not_retried() {
        let service = Arc::new(MockSnapshotService::new());
        service.respond_error("https://www.bild.de/a.html");
        let gateway = ArchiveGateway::new(service.clone());

        assert!(gateway.archive("https://www.bild.de/a.html").await.is_none());
        assert_eq!(service.calls().len(), 1);
    }
}

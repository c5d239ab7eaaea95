//! Social platform client seam
//!
//! The stream engine talks to the platform through two traits:
//!
//! - [`Platform`] opens item streams and posts replies
//! - [`ItemStream`] yields live items one at a time, blocking until the next
//!   one arrives
//!
//! [`RedditClient`] is the production implementation; [`MockPlatform`] is a
//! scripted double for tests.

mod listing;
mod mock;
mod reddit;

pub use mock::{MockPlatform, MockStream};
pub use reddit::{RedditClient, RedditCredentials, RedditStream};

use async_trait::async_trait;
use thiserror::Error;

use crate::item::{Item, ItemKind};

/// Errors raised by platform clients.
///
/// `Auth`, `Api` and `Transport` form the fault set an engine recovers from
/// by sleeping. `Rejected` is a reply the platform will never accept for
/// that item. `Unexpected` is fatal to the engine that hit it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("reply rejected: {0}")]
    Rejected(String),

    #[error("unexpected platform response: {0}")]
    Unexpected(String),
}

impl PlatformError {
    /// Whether the engine should sleep and retry instead of terminating
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            PlatformError::Auth(_) | PlatformError::Api(_) | PlatformError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Ordered, unbounded, non-rewindable sequence of live items
#[async_trait]
pub trait ItemStream: Send {
    /// Wait for the next item. Cancel-safe: dropping the future loses no item.
    async fn next_item(&mut self) -> Result<Item>;
}

/// Client for one authenticated platform session
#[async_trait]
pub trait Platform: Send + Sync {
    /// Start consuming `kind` items of `source` from the live tip
    fn open_stream(&self, kind: ItemKind, source: &str) -> Box<dyn ItemStream>;

    /// Post `body` as a reply to `item`
    async fn reply(&self, item: &Item, body: &str) -> Result<()>;
}

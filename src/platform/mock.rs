//! Scripted platform for tests and dry runs

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ItemStream, Platform, PlatformError, Result};
use crate::item::{Item, ItemKind};

#[derive(Default)]
struct MockState {
    sessions: Mutex<VecDeque<Vec<Result<Item>>>>,
    streams_opened: AtomicUsize,
    replies: Mutex<Vec<(String, String)>>,
    reply_error: Mutex<Option<PlatformError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Platform whose streams replay scripted events.
///
/// Each `open_stream` call consumes the next scripted session. Once a
/// session's events are exhausted the stream blocks forever, like a quiet
/// live stream. Replies are recorded instead of posted.
#[derive(Clone, Default)]
pub struct MockPlatform {
    state: Arc<MockState>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session of stream events (builder style)
    pub fn with_session(self, events: Vec<Result<Item>>) -> Self {
        self.push_session(events);
        self
    }

    pub fn push_session(&self, events: Vec<Result<Item>>) {
        lock(&self.state.sessions).push_back(events);
    }

    /// Make every subsequent reply fail with `error`
    pub fn fail_replies_with(&self, error: PlatformError) {
        *lock(&self.state.reply_error) = Some(error);
    }

    /// Recorded replies as `(item id, body)` pairs
    pub fn replies(&self) -> Vec<(String, String)> {
        lock(&self.state.replies).clone()
    }

    pub fn streams_opened(&self) -> usize {
        self.state.streams_opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn open_stream(&self, kind: ItemKind, source: &str) -> Box<dyn ItemStream> {
        self.state.streams_opened.fetch_add(1, Ordering::SeqCst);
        let events = lock(&self.state.sessions).pop_front().unwrap_or_default();
        tracing::debug!(%kind, source, events = events.len(), "Mock stream opened");
        Box::new(MockStream {
            events: events.into(),
        })
    }

    async fn reply(&self, item: &Item, body: &str) -> Result<()> {
        if let Some(error) = lock(&self.state.reply_error).clone() {
            return Err(error);
        }
        lock(&self.state.replies).push((item.id.clone(), body.to_string()));
        Ok(())
    }
}

/// Stream over one scripted session
pub struct MockStream {
    events: VecDeque<Result<Item>>,
}

#[async_trait]
impl ItemStream for MockStream {
    async fn next_item(&mut self) -> Result<Item> {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_sessions_replay_in_order() {
        let platform = MockPlatform::new()
            .with_session(vec![Ok(Item::comment("a", "")), Err(PlatformError::Transport("reset".into()))])
            .with_session(vec![Ok(Item::comment("b", ""))]);

        let mut first = platform.open_stream(ItemKind::Comment, "test");
        assert_eq!(first.next_item().await.unwrap().id, "a");
        assert!(first.next_item().await.is_err());

        let mut second = platform.open_stream(ItemKind::Comment, "test");
        assert_eq!(second.next_item().await.unwrap().id, "b");
        assert_eq!(platform.streams_opened(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_stream_blocks() {
        let platform = MockPlatform::new();
        let mut stream = platform.open_stream(ItemKind::Submission, "test");

        let result = tokio::time::timeout(Duration::from_millis(20), stream.next_item()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_replies_recorded_or_failed() {
        let platform = MockPlatform::new();
        let item = Item::comment("c1", "");

        platform.reply(&item, "hello").await.unwrap();
        assert_eq!(platform.replies(), vec![("c1".to_string(), "hello".to_string())]);

        platform.fail_replies_with(PlatformError::Api("RATELIMIT".into()));
        assert!(platform.reply(&item, "again").await.is_err());
        assert_eq!(platform.replies().len(), 1);
    }
}

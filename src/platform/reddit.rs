//! Reddit OAuth client and polling item streams

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, Response, StatusCode};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::listing::{CommentResponse, Listing, TokenResponse};
use super::{ItemStream, Platform, PlatformError, Result};
use crate::item::{Item, ItemKind};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Refresh the access token this many seconds before Reddit expires it
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

const LISTING_LIMIT: u32 = 100;
/// Number of recently delivered ids a stream remembers
const SEEN_WINDOW: usize = 301;
const MIN_IDLE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_IDLE_BACKOFF: Duration = Duration::from_secs(16);

/// Reply error codes that will not clear up by retrying later
const PERMANENT_REPLY_ERRORS: &[&str] = &["THREAD_LOCKED", "DELETED_COMMENT", "DELETED_LINK", "TOO_OLD"];

/// Script-app credentials for the password grant
#[derive(Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Utc::now() + TimeDelta::seconds(TOKEN_REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// One authenticated Reddit session. Clones share the session.
#[derive(Clone)]
pub struct RedditClient {
    http: Client,
    credentials: Arc<RedditCredentials>,
    token: Arc<Mutex<Option<AccessToken>>>,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&credentials.user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            credentials: Arc::new(credentials),
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// Current bearer token, authenticating first if needed
    async fn access_token(&self) -> Result<String> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.authenticate().await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    async fn authenticate(&self) -> Result<AccessToken> {
        debug!(username = %self.credentials.username, "Requesting Reddit access token");

        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(map_transport)?;

        let body: TokenResponse = check_status(response)?.json().await.map_err(map_transport)?;

        match (body.access_token, body.error) {
            (Some(value), None) => {
                let lifetime = body.expires_in.unwrap_or(3600);
                info!(username = %self.credentials.username, lifetime, "Authenticated with Reddit");
                Ok(AccessToken {
                    value,
                    expires_at: Utc::now() + TimeDelta::seconds(lifetime as i64),
                })
            }
            (_, Some(error)) => Err(PlatformError::Auth(error.to_string())),
            (None, None) => Err(PlatformError::Unexpected(
                "token response without access_token".to_string(),
            )),
        }
    }

    /// Status check for authenticated calls; a rejected token is dropped so
    /// the next call authenticates again
    async fn checked(&self, response: Response) -> Result<Response> {
        let result = check_status(response);
        if let Err(PlatformError::Auth(_)) = &result {
            self.token.lock().await.take();
        }
        result
    }

    /// Newest-first page of the live listing for `kind`
    async fn fetch_listing(&self, kind: ItemKind, subreddit: &str) -> Result<Vec<Item>> {
        let endpoint = match kind {
            ItemKind::Comment => "comments",
            ItemKind::Submission => "new",
        };
        let url = format!("{}/r/{}/{}", API_BASE, subreddit, endpoint);
        let token = self.access_token().await?;

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("limit", LISTING_LIMIT.to_string()), ("raw_json", "1".to_string())])
            .send()
            .await
            .map_err(map_transport)?;

        let listing: Listing = self.checked(response).await?.json().await.map_err(map_transport)?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter_map(|thing| thing.into_item(kind))
            .collect())
    }
}

#[async_trait]
impl Platform for RedditClient {
    fn open_stream(&self, kind: ItemKind, source: &str) -> Box<dyn ItemStream> {
        Box::new(RedditStream::new(self.clone(), kind, source))
    }

    async fn reply(&self, item: &Item, body: &str) -> Result<()> {
        let token = self.access_token().await?;
        let fullname = item.fullname();

        let response = self
            .http
            .post(format!("{}/api/comment", API_BASE))
            .bearer_auth(token)
            .form(&[
                ("api_type", "json"),
                ("thing_id", fullname.as_str()),
                ("text", body),
            ])
            .send()
            .await
            .map_err(map_transport)?;

        let result: CommentResponse = self.checked(response).await?.json().await.map_err(map_transport)?;
        if !result.json.errors.is_empty() {
            let error = reply_error(result.json.errors);
            warn!(thing = %fullname, error = %error, "Reddit rejected reply");
            return Err(error);
        }

        debug!(thing = %fullname, "Reply posted");
        Ok(())
    }
}

/// Classify the `json.errors` of a comment response. Each entry is
/// `[code, message, field]`.
fn reply_error(errors: Vec<serde_json::Value>) -> PlatformError {
    let permanent = errors.iter().any(|entry| {
        let code = entry.get(0).and_then(|c| c.as_str()).or_else(|| entry.as_str());
        code.is_some_and(|code| PERMANENT_REPLY_ERRORS.contains(&code))
    });

    let errors = serde_json::Value::Array(errors).to_string();
    if permanent {
        PlatformError::Rejected(errors)
    } else {
        PlatformError::Api(errors)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let reason = format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PlatformError::Auth(reason)),
        _ => Err(PlatformError::Api(reason)),
    }
}

fn map_transport(e: reqwest::Error) -> PlatformError {
    if e.is_decode() {
        PlatformError::Unexpected(e.to_string())
    } else {
        PlatformError::Transport(e.to_string())
    }
}

/// Bounded, insertion-ordered set of recently delivered ids
#[derive(Debug, Default)]
struct SeenWindow {
    order: VecDeque<String>,
    index: HashSet<String>,
}

impl SeenWindow {
    /// Returns `false` if `id` was already seen
    fn insert(&mut self, id: &str) -> bool {
        if self.index.contains(id) {
            return false;
        }
        if self.order.len() == SEEN_WINDOW {
            if let Some(oldest) = self.order.pop_front() {
                self.index.remove(&oldest);
            }
        }
        self.order.push_back(id.to_string());
        self.index.insert(id.to_string());
        true
    }
}

/// Polling stream over a subreddit listing.
///
/// Delivers unseen items oldest-first. While a poll brings nothing new the
/// stream waits with exponential backoff between polls.
pub struct RedditStream {
    client: RedditClient,
    kind: ItemKind,
    subreddit: String,
    seen: SeenWindow,
    pending: VecDeque<Item>,
    idle_backoff: Duration,
}

impl RedditStream {
    pub fn new(client: RedditClient, kind: ItemKind, subreddit: &str) -> Self {
        Self {
            client,
            kind,
            subreddit: subreddit.to_string(),
            seen: SeenWindow::default(),
            pending: VecDeque::new(),
            idle_backoff: MIN_IDLE_BACKOFF,
        }
    }

    /// Queue the unseen items of a newest-first page, returning how many were new
    fn absorb(&mut self, newest_first: Vec<Item>) -> usize {
        let mut fresh = 0;
        for item in newest_first.into_iter().rev() {
            if self.seen.insert(&item.id) {
                self.pending.push_back(item);
                fresh += 1;
            }
        }
        fresh
    }
}

#[async_trait]
impl ItemStream for RedditStream {
    async fn next_item(&mut self) -> Result<Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Ok(item);
            }

            let page = self.client.fetch_listing(self.kind, &self.subreddit).await?;
            if self.absorb(page) > 0 {
                self.idle_backoff = MIN_IDLE_BACKOFF;
                continue;
            }

            debug!(kind = %self.kind, backoff = ?self.idle_backoff, "No new items");
            tokio::time::sleep(self.idle_backoff).await;
            self.idle_backoff = (self.idle_backoff * 2).min(MAX_IDLE_BACKOFF);
        }
    }
}

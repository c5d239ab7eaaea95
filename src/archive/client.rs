//! HTTP client for the archive.today snapshot service

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, LINK, LOCATION, REFRESH};
use reqwest::{Client, redirect};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use super::{ArchiveError, Result, SnapshotService};

static SUBMIT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name="submitid"\s+value="([^"]+)""#).expect("valid regex"));

/// archive.today client configuration
#[derive(Debug, Clone)]
pub struct ArchiveClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ArchiveClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://archive.today".to_string(),
            timeout: Duration::from_secs(120),
            user_agent: concat!("goldtbot/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Submits URLs to archive.today and reads the snapshot location from the
/// response headers
pub struct ArchiveTodayClient {
    client: Client,
    endpoint: String,
}

impl ArchiveTodayClient {
    pub fn new(config: ArchiveClientConfig) -> Result<Self> {
        if !(config.endpoint.starts_with("http://") || config.endpoint.starts_with("https://")) {
            return Err(ArchiveError::InvalidEndpoint(config.endpoint));
        }

        // Redirects carry the snapshot URL, so they must not be followed
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ArchiveError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Anti-duplicate token embedded in the submit form, when present
    async fn submit_id(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/", self.endpoint))
            .send()
            .await
            .map_err(map_request_error)?;
        let html = response.text().await.map_err(map_request_error)?;
        Ok(submit_id_from_html(&html))
    }
}

#[async_trait]
impl SnapshotService for ArchiveTodayClient {
    async fn capture(&self, url: &str) -> Result<Option<String>> {
        let submit_id = self.submit_id().await?;
        debug!(url, has_submit_id = submit_id.is_some(), "Submitting capture");

        let mut form = vec![("url", url), ("anyway", "1")];
        if let Some(id) = submit_id.as_deref() {
            form.push(("submitid", id));
        }

        let response = self
            .client
            .post(format!("{}/submit/", self.endpoint))
            .form(&form)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ArchiveError::Status(status.as_u16()));
        }

        Ok(memento_from_headers(response.headers()))
    }
}

fn map_request_error(e: reqwest::Error) -> ArchiveError {
    if e.is_timeout() {
        ArchiveError::Timeout
    } else {
        ArchiveError::RequestFailed(e.to_string())
    }
}

pub(crate) fn submit_id_from_html(html: &str) -> Option<String> {
    SUBMIT_ID_RE
        .captures(html)
        .map(|c| c[1].to_string())
}

/// Snapshot URL from a submit response: `Refresh`, then `Location`, then a
/// `rel="memento"` entry of `Link`. Candidates that do not point at a
/// snapshot page are skipped.
pub(crate) fn memento_from_headers(headers: &HeaderMap) -> Option<String> {
    let header = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());

    let refresh = header(REFRESH)
        .and_then(|refresh| refresh.split_once(";url="))
        .map(|(_, target)| target.trim().replace("/wip/", "/"));

    let location = header(LOCATION).map(|location| location.trim().to_string());

    let link = header(LINK).and_then(|link| {
        link.split(',')
            .find(|entry| entry.contains("rel=\"memento\""))
            .and_then(|entry| {
                let start = entry.find('<')? + 1;
                let end = entry.find('>')?;
                (start < end).then(|| entry[start..end].to_string())
            })
    });

    [refresh, location, link]
        .into_iter()
        .flatten()
        .find(|url| is_snapshot_url(url))
}

/// Whether `url` addresses a snapshot rather than the service's own pages
/// (landing page, submit form, work-in-progress view)
fn is_snapshot_url(url: &str) -> bool {
    let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    else {
        return false;
    };
    let Some((host, path)) = rest.split_once('/') else {
        return false;
    };
    let segment = path.split(['/', '?', '#']).next().unwrap_or("");

    !host.is_empty() && !segment.is_empty() && !matches!(segment, "submit" | "wip")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_submit_id_parsing() {
        let html = r#"<form><input type="hidden" name="submitid" value="abc+123/xyz="/></form>"#;
        assert_eq!(submit_id_from_html(html).as_deref(), Some("abc+123/xyz="));
        assert!(submit_id_from_html("<html></html>").is_none());
    }

    #[test]
    fn test_memento_from_refresh() {
        let mut headers = HeaderMap::new();
        headers.insert(REFRESH, HeaderValue::from_static("0;url=https://archive.ph/wip/AbCd1"));
        assert_eq!(
            memento_from_headers(&headers).as_deref(),
            Some("https://archive.ph/AbCd1")
        );
    }

    #[test]
    fn test_memento_from_location() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("https://archive.ph/XyZ9"));
        assert_eq!(memento_from_headers(&headers).as_deref(), Some("https://archive.ph/XyZ9"));
    }

    #[test]
    fn test_memento_from_link() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://www.bild.de/a.html>; rel=\"original\", \
                 <https://archive.ph/Q1w2E>; rel=\"memento\"; datetime=\"Mon, 01 Jan 2024 00:00:00 GMT\"",
            ),
        );
        assert_eq!(memento_from_headers(&headers).as_deref(), Some("https://archive.ph/Q1w2E"));
    }

    #[test]
    fn test_redirect_to_service_pages_is_not_a_memento() {
        for target in [
            "https://archive.ph/submit/",
            "https://archive.ph/",
            "https://archive.ph",
            "https://archive.ph/?run=1",
            "/AbCd1",
        ] {
            let mut headers = HeaderMap::new();
            headers.insert(LOCATION, HeaderValue::from_str(target).unwrap());
            assert!(memento_from_headers(&headers).is_none(), "accepted {target}");
        }
    }

    #[test]
    fn test_bad_location_falls_back_to_link() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("https://archive.ph/submit/"));
        headers.insert(
            LINK,
            HeaderValue::from_static("<https://archive.ph/Q1w2E>; rel=\"memento\""),
        );
        assert_eq!(memento_from_headers(&headers).as_deref(), Some("https://archive.ph/Q1w2E"));
    }

    #[test]
    fn test_no_memento_headers() {
        assert!(memento_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        let config = ArchiveClientConfig {
            endpoint: "ftp://archive.today".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ArchiveTodayClient::new(config),
            Err(ArchiveError::InvalidEndpoint(_))
        ));
    }
}

//! Reddit API wire types

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::item::{Item, ItemKind};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// String on rejected grants, number on HTTP-level failures
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub children: Vec<Thing>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thing {
    pub kind: String,
    pub data: ThingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThingData {
    pub id: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub created_utc: Option<f64>,
}

impl Thing {
    /// Convert to an [`Item`] when the thing matches the expected kind
    pub fn into_item(self, kind: ItemKind) -> Option<Item> {
        let expected = kind.fullname_prefix().trim_end_matches('_');
        if self.kind != expected {
            return None;
        }

        let data = self.data;
        let body = match kind {
            ItemKind::Comment => data.body,
            ItemKind::Submission => data.selftext,
        }
        .unwrap_or_default();

        Some(Item {
            id: data.id,
            kind,
            body,
            url: data.url.filter(|u| !u.is_empty()),
            author: data.author,
            created: data
                .created_utc
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts as i64, 0)),
        })
    }
}

/// Response of `POST /api/comment` with `api_type=json`
#[derive(Debug, Deserialize)]
pub(crate) struct CommentResponse {
    pub json: CommentResponseBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentResponseBody {
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

//! Content items observed on a live stream

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of content an engine consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Comment,
    Submission,
}

impl ItemKind {
    pub const ALL: [ItemKind; 2] = [ItemKind::Comment, ItemKind::Submission];

    /// Plural name used in ledger file names and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Comment => "comments",
            ItemKind::Submission => "submissions",
        }
    }

    /// Reddit "thing" prefix used to build fullnames
    pub fn fullname_prefix(&self) -> &'static str {
        match self {
            ItemKind::Comment => "t1_",
            ItemKind::Submission => "t3_",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comment or submission from the stream. Never mutated after it is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Stable id, unique within its stream (without the fullname prefix)
    pub id: String,
    pub kind: ItemKind,
    /// Comment body or submission self-text
    pub body: String,
    /// Link target of a submission
    pub url: Option<String>,
    pub author: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

impl Item {
    pub fn comment(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Comment,
            body: body.into(),
            url: None,
            author: None,
            created: None,
        }
    }

    pub fn submission(id: impl Into<String>, selftext: impl Into<String>, url: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Submission,
            body: selftext.into(),
            url,
            author: None,
            created: None,
        }
    }

    /// Author for log output; deleted or unknown authors read `[deleted]`
    pub fn author_name(&self) -> &str {
        self.author.as_deref().unwrap_or("[deleted]")
    }

    /// Time between creation and `now`, if the creation time is known
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        self.created.map(|created| now - created)
    }

    /// Fullname addressing this item in reply calls (e.g. `t1_abc123`)
    pub fn fullname(&self) -> String {
        format!("{}{}", self.kind.fullname_prefix(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullname_prefix() {
        assert_eq!(Item::comment("abc", "").fullname(), "t1_abc");
        assert_eq!(Item::submission("xyz", "", None).fullname(), "t3_xyz");
    }

    #[test]
    fn test_author_and_age() {
        let mut item = Item::comment("abc", "");
        assert_eq!(item.author_name(), "[deleted]");
        assert!(item.age_at(Utc::now()).is_none());

        let created = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        item.author = Some("someone".to_string());
        item.created = Some(created);
        assert_eq!(item.author_name(), "someone");
        assert_eq!(
            item.age_at(created + TimeDelta::seconds(90)),
            Some(TimeDelta::seconds(90))
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ItemKind::Comment.to_string(), "comments");
        assert_eq!(ItemKind::Submission.as_str(), "submissions");
    }
}

//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Utc};

use crate::SitemapDate;
use crate::repository::{ContentItem, ContentStatus};

pub(crate) fn date(raw: &str) -> SitemapDate {
    raw.parse().unwrap()
}

pub(crate) fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .unwrap()
        .with_timezone(&Utc)
}

pub(crate) fn post(id: u64, day: &str, modified: &str) -> ContentItem {
    ContentItem {
        id,
        url: format!("https://example.com/{day}/post-{id}"),
        date: date(day),
        modified: at(modified),
        status: ContentStatus::Published,
        images: Vec::new(),
    }
}

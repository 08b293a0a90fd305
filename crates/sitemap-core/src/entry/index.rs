use chrono::{DateTime, Utc};
use serde::Serialize;

use super::validate_loc;
use crate::Result;

/// A reference to one sitemap file inside a `<sitemapindex>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapIndexEntry {
    loc: String,
    lastmod: Option<DateTime<Utc>>,
}

impl SitemapIndexEntry {
    /// Create a reference to the sitemap at `loc`.
    pub fn new(loc: impl Into<String>, lastmod: Option<DateTime<Utc>>) -> Result<Self> {
        let loc = loc.into();
        validate_loc(&loc)?;
        Ok(Self { loc, lastmod })
    }

    /// Sitemap URL.
    #[must_use]
    pub fn loc(&self) -> &str {
        &self.loc
    }

    /// When the referenced sitemap last changed.
    #[must_use]
    pub const fn lastmod(&self) -> Option<DateTime<Utc>> {
        self.lastmod
    }
}

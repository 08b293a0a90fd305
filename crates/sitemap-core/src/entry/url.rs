use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ChangeFrequency, ImageEntry, MAX_IMAGES_PER_URL, validate_loc};
use crate::{Error, Result};

/// One page in a `<urlset>`.
///
/// ```rust
/// use sitemap_core::{ChangeFrequency, UrlEntry};
///
/// let entry = UrlEntry::new("https://example.com/2024/07/10/hello")?
///     .with_changefreq(ChangeFrequency::Monthly)
///     .with_priority(0.7)?;
/// assert_eq!(entry.priority(), Some(0.7));
/// assert!(UrlEntry::new("/relative").is_err());
/// # Ok::<(), sitemap_core::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlEntry {
    loc: String,
    lastmod: Option<DateTime<Utc>>,
    changefreq: Option<ChangeFrequency>,
    priority: Option<f32>,
    images: Vec<ImageEntry>,
}

impl UrlEntry {
    /// Create an entry for `loc`.
    pub fn new(loc: impl Into<String>) -> Result<Self> {
        let loc = loc.into();
        validate_loc(&loc)?;
        Ok(Self {
            loc,
            lastmod: None,
            changefreq: None,
            priority: None,
            images: Vec::new(),
        })
    }

    /// Set the last modification time.
    #[must_use]
    pub const fn with_lastmod(mut self, lastmod: DateTime<Utc>) -> Self {
        self.lastmod = Some(lastmod);
        self
    }

    /// Set the change frequency hint.
    #[must_use]
    pub const fn with_changefreq(mut self, changefreq: ChangeFrequency) -> Self {
        self.changefreq = Some(changefreq);
        self
    }

    /// Set the priority; must lie in `0.0..=1.0`.
    pub fn with_priority(mut self, priority: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&priority) {
            return Err(Error::InvalidEntry(format!(
                "priority {priority} is outside 0.0..=1.0"
            )));
        }
        self.priority = Some(priority);
        Ok(self)
    }

    /// Replace the attached images.
    pub fn with_images(mut self, images: Vec<ImageEntry>) -> Result<Self> {
        if images.len() > MAX_IMAGES_PER_URL {
            return Err(Error::InvalidEntry(format!(
                "{} images attached to {}, limit is {MAX_IMAGES_PER_URL}",
                images.len(),
                self.loc
            )));
        }
        self.images = images;
        Ok(self)
    }

    /// Page URL.
    #[must_use]
    pub fn loc(&self) -> &str {
        &self.loc
    }

    /// Last modification time.
    #[must_use]
    pub const fn lastmod(&self) -> Option<DateTime<Utc>> {
        self.lastmod
    }

    /// Change frequency hint.
    #[must_use]
    pub const fn changefreq(&self) -> Option<ChangeFrequency> {
        self.changefreq
    }

    /// Relative priority.
    #[must_use]
    pub const fn priority(&self) -> Option<f32> {
        self.priority
    }

    /// Attached images.
    #[must_use]
    pub fn images(&self) -> &[ImageEntry] {
        &self.images
    }
}

//! Validated sitemap entry value objects.
//!
//! Entries are immutable once built: every builder method consumes `self`
//! and returns a new, re-validated value. Constraints follow the sitemap
//! protocol:
//!
//! - `loc` must be an absolute `http`/`https` URL of at most
//!   [`MAX_URL_LENGTH`] characters
//! - `priority` must lie in `0.0..=1.0`
//! - `changefreq` is one of the enumerated [`ChangeFrequency`] values
//! - a page may carry at most [`MAX_IMAGES_PER_URL`] images

mod image;
mod index;
mod url;

pub use image::ImageEntry;
pub use index::SitemapIndexEntry;
pub use url::UrlEntry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest `loc` the sitemap protocol accepts.
pub const MAX_URL_LENGTH: usize = 2048;

/// Most images a single page entry may reference.
pub const MAX_IMAGES_PER_URL: usize = 1000;

/// Change frequency hints for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    /// The page changes every time it is accessed.
    Always,
    /// The page changes hourly.
    Hourly,
    /// The page changes daily.
    Daily,
    /// The page changes weekly.
    Weekly,
    /// The page changes monthly.
    Monthly,
    /// The page changes yearly.
    Yearly,
    /// The page is archived and will not change.
    Never,
}

impl ChangeFrequency {
    /// Protocol spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeFrequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            "never" => Ok(Self::Never),
            _ => Err(Error::InvalidEntry(format!("Invalid changefreq value: {s}"))),
        }
    }
}

/// Check that `loc` is an absolute web URL within the protocol length limit.
pub(crate) fn validate_loc(loc: &str) -> Result<()> {
    if loc.len() > MAX_URL_LENGTH {
        return Err(Error::InvalidUrl(format!(
            "URL is {} characters, limit is {MAX_URL_LENGTH}",
            loc.len()
        )));
    }
    let parsed = ::url::Url::parse(loc).map_err(|e| Error::InvalidUrl(format!("{loc}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::InvalidUrl(format!(
            "{loc}: sitemap URLs must be absolute http(s) URLs"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_changefreq_parse_is_case_insensitive() {
        assert_eq!("Weekly".parse::<ChangeFrequency>().unwrap(), ChangeFrequency::Weekly);
        assert_eq!("NEVER".parse::<ChangeFrequency>().unwrap(), ChangeFrequency::Never);
        assert!(matches!(
            "fortnightly".parse::<ChangeFrequency>(),
            Err(Error::InvalidEntry(_))
        ));
    }

    #[test]
    fn test_changefreq_display_roundtrips() {
        for freq in [
            ChangeFrequency::Always,
            ChangeFrequency::Hourly,
            ChangeFrequency::Daily,
            ChangeFrequency::Weekly,
            ChangeFrequency::Monthly,
            ChangeFrequency::Yearly,
            ChangeFrequency::Never,
        ] {
            assert_eq!(freq.to_string().parse::<ChangeFrequency>().unwrap(), freq);
        }
    }

    #[test]
    fn test_validate_loc() {
        assert!(validate_loc("https://example.com/2024/07/10/post").is_ok());
        assert!(validate_loc("http://example.com").is_ok());
        assert!(validate_loc("/2024/07/10/post").is_err());
        assert!(validate_loc("ftp://example.com/file").is_err());
        assert!(validate_loc("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_validate_loc_length_boundary() {
        let base = "https://example.com/";
        let at_limit = format!("{base}{}", "a".repeat(MAX_URL_LENGTH - base.len()));
        assert_eq!(at_limit.len(), MAX_URL_LENGTH);
        assert!(validate_loc(&at_limit).is_ok());

        let over = format!("{at_limit}a");
        assert!(matches!(validate_loc(&over), Err(Error::InvalidUrl(_))));
    }
}

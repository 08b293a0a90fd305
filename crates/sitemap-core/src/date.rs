//! Calendar date value type used to key sitemap partitions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A validated calendar date naming one sitemap partition.
///
/// Only real calendar days can be represented: `2024-02-29` is accepted,
/// `2023-02-29` is rejected at construction. Ordering and equality follow
/// `(year, month, day)`, and the canonical string form is `YYYY-MM-DD`.
///
/// ```rust
/// use sitemap_core::SitemapDate;
///
/// let leap = SitemapDate::new(2024, 2, 29)?;
/// assert_eq!(leap.to_string(), "2024-02-29");
/// assert!(SitemapDate::new(2023, 2, 29).is_err());
/// # Ok::<(), sitemap_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SitemapDate {
    year: i32,
    month: u32,
    day: u32,
}

impl SitemapDate {
    /// Build a date from a `(year, month, day)` triple.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        if !(1..=9999).contains(&year) {
            return Err(Error::InvalidDate(format!(
                "{year:04}-{month:02}-{day:02}: year out of range"
            )));
        }
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self::from_naive)
            .ok_or_else(|| {
                Error::InvalidDate(format!(
                    "{year:04}-{month:02}-{day:02} is not a calendar date"
                ))
            })
    }

    /// Today's date in the site's calendar, given its offset from UTC.
    pub fn today(utc_offset_minutes: i32) -> Result<Self> {
        Self::on(Utc::now(), utc_offset_minutes)
    }

    /// The site-local date of an instant.
    pub fn on(instant: DateTime<Utc>, utc_offset_minutes: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).ok_or_else(
            || Error::InvalidDate(format!("UTC offset out of range: {utc_offset_minutes} minutes")),
        )?;
        Ok(Self::from_naive(
            offset.from_utc_datetime(&instant.naive_utc()).date_naive(),
        ))
    }

    pub(crate) fn from_naive(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month in `1..=12`.
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Day of month in `1..=31`.
    #[must_use]
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// The equivalent `chrono` date.
    #[must_use]
    pub fn as_naive(&self) -> NaiveDate {
        // Constructed only from valid triples.
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).unwrap_or(NaiveDate::MIN)
    }

    /// Parse and sort a list of date strings, dropping duplicates.
    ///
    /// Any malformed entry fails the whole call.
    pub fn parse_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Self>> {
        let mut dates = raw
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<Self>>>()?;
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }
}

impl fmt::Display for SitemapDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for SitemapDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let mut parts = trimmed.splitn(3, '-');
        let (Some(y), Some(m), Some(d)) = (parts.next(), parts.next(), parts.next()) else {
            return Err(Error::InvalidDate(format!("expected YYYY-MM-DD, got '{s}'")));
        };
        let parse = |part: &str| -> Result<u32> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::InvalidDate(format!("expected YYYY-MM-DD, got '{s}'")));
            }
            part.parse()
                .map_err(|_| Error::InvalidDate(format!("expected YYYY-MM-DD, got '{s}'")))
        };
        let year = i32::try_from(parse(y)?)
            .map_err(|_| Error::InvalidDate(format!("year out of range in '{s}'")))?;
        Self::new(year, parse(m)?, parse(d)?)
    }
}

impl Serialize for SitemapDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SitemapDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

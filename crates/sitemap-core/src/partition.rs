//! Persisted per-date sitemap output.
//!
//! ## Storage layout
//!
//! ```text
//! sitemap_partition_2024-07-10   # PartitionRecord (rendered XML + metadata)
//! sitemap_partition_2024-07-11
//! sitemap_partition_index        # { "2024-07-10": {built_at, url_count}, ... }
//! ```
//!
//! Records are keyed by date and overwritten in place, so delivering the same
//! build twice leaves one record. The index is what detection reads: it
//! answers "which dates are built, and when" without loading any XML.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::store::{KeyValueStore, WriteHint, read_json, write_json};
use crate::{Error, Result, SitemapDate, UrlSet};

const RECORD_PREFIX: &str = "sitemap_partition_";
const INDEX_KEY: &str = "sitemap_partition_index";

/// One built date partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRecord {
    /// Partition date.
    pub date: SitemapDate,
    /// Number of `<url>` entries.
    pub url_count: usize,
    /// When the XML was last written.
    pub built_at: DateTime<Utc>,
    /// SHA-256 of `xml`, lowercase hex.
    pub digest: String,
    /// Rendered `<urlset>` document.
    pub xml: String,
}

/// Index entry for one built partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSummary {
    /// When the partition was last (re)built, including no-op rebuilds.
    pub built_at: DateTime<Utc>,
    /// Number of `<url>` entries.
    pub url_count: usize,
}

/// Result of [`PartitionStore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New or changed output was written.
    Written,
    /// Output matched the stored digest; only the build time was refreshed.
    Unchanged,
}

/// Date-keyed partition persistence over a [`KeyValueStore`].
pub struct PartitionStore {
    store: Arc<dyn KeyValueStore>,
    index_guard: Mutex<()>,
}

impl std::fmt::Debug for PartitionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionStore").finish_non_exhaustive()
    }
}

/// Lowercase hex SHA-256 of `content`.
#[must_use]
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.finalize().iter().fold(String::new(), |mut acc, b| {
        // write! to String is infallible
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

impl PartitionStore {
    /// Create a partition store backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            index_guard: Mutex::new(()),
        }
    }

    fn record_key(date: SitemapDate) -> String {
        format!("{RECORD_PREFIX}{date}")
    }

    /// Persist the rendered `urls` as the partition for `date`.
    pub fn save(&self, date: SitemapDate, urls: &UrlSet, now: DateTime<Utc>) -> Result<SaveOutcome> {
        let xml = urls.to_xml()?;
        let digest = content_digest(&xml);

        let unchanged = self
            .load(date)?
            .is_some_and(|existing| existing.digest == digest);

        if unchanged {
            debug!(%date, "Partition unchanged; refreshing build time");
        } else {
            let record = PartitionRecord {
                date,
                url_count: urls.count(),
                built_at: now,
                digest,
                xml,
            };
            write_json(
                self.store.as_ref(),
                &Self::record_key(date),
                &record,
                WriteHint::Default,
            )?;
            debug!(%date, urls = record.url_count, "Partition written");
        }

        self.update_index(|index| {
            index.insert(
                date,
                PartitionSummary {
                    built_at: now,
                    url_count: urls.count(),
                },
            );
        })?;

        Ok(if unchanged {
            SaveOutcome::Unchanged
        } else {
            SaveOutcome::Written
        })
    }

    /// Load the partition for `date`.
    pub fn load(&self, date: SitemapDate) -> Result<Option<PartitionRecord>> {
        read_json(self.store.as_ref(), &Self::record_key(date))
    }

    /// Remove the partition for `date`. Returns whether one existed.
    pub fn delete(&self, date: SitemapDate) -> Result<bool> {
        let had_record = self.store.delete(&Self::record_key(date))?;
        let had_entry = self.update_index(|index| index.remove(&date).is_some())?;
        Ok(had_record || had_entry)
    }

    /// Every built date with its summary, ascending.
    pub fn index(&self) -> Result<BTreeMap<SitemapDate, PartitionSummary>> {
        Ok(read_json(self.store.as_ref(), INDEX_KEY)?.unwrap_or_default())
    }

    /// Built dates, ascending.
    pub fn built_dates(&self) -> Result<Vec<SitemapDate>> {
        Ok(self.index()?.into_keys().collect())
    }

    /// When `date` was last built.
    pub fn built_at(&self, date: SitemapDate) -> Result<Option<DateTime<Utc>>> {
        Ok(self.index()?.get(&date).map(|summary| summary.built_at))
    }

    /// Sum of URL counts across all partitions.
    pub fn total_url_count(&self) -> Result<u64> {
        Ok(self
            .index()?
            .values()
            .map(|summary| summary.url_count as u64)
            .sum())
    }

    /// Dates that have a stored record, read from the store's keys rather
    /// than the index.
    pub fn stored_dates(&self) -> Result<Vec<SitemapDate>> {
        self.store
            .keys_with_prefix(RECORD_PREFIX)?
            .iter()
            .filter(|key| key.as_str() != INDEX_KEY)
            .filter_map(|key| key.strip_prefix(RECORD_PREFIX))
            .map(str::parse)
            .collect()
    }

    fn update_index<T>(
        &self,
        apply: impl FnOnce(&mut BTreeMap<SitemapDate, PartitionSummary>) -> T,
    ) -> Result<T> {
        let _lock = self
            .index_guard
            .lock()
            .map_err(|_| Error::Storage("partition index lock poisoned".into()))?;
        let mut index = self.index()?;
        let out = apply(&mut index);
        write_json(self.store.as_ref(), INDEX_KEY, &index, WriteHint::Default)?;
        Ok(out)
    }
}

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    ArchiveRepository, AuthorRecord, ContentItem, ContentRepository, ImageRecord, TermRecord,
};
use crate::{Error, Result, SitemapDate};

/// Exported site content.
///
/// ```json
/// {
///   "posts": [{"id": 1, "url": "https://example.com/hello", "date": "2024-07-10",
///              "modified": "2024-07-10T09:00:00Z"}],
///   "terms": [{"id": 3, "taxonomy": "category", "url": "https://example.com/c/news", "count": 4}],
///   "authors": [{"id": 9, "url": "https://example.com/author/ada", "post_count": 12}]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Dated content.
    #[serde(default)]
    pub posts: Vec<ContentItem>,
    /// Term archives.
    #[serde(default)]
    pub terms: Vec<TermRecord>,
    /// Author archives.
    #[serde(default)]
    pub authors: Vec<AuthorRecord>,
}

/// Content repository over an in-memory [`Catalog`].
///
/// Non-public posts, empty terms and authors without posts are filtered out
/// on load.
#[derive(Debug, Clone, Default)]
pub struct CatalogRepository {
    by_date: BTreeMap<SitemapDate, Vec<ContentItem>>,
    by_id: HashMap<u64, (SitemapDate, usize)>,
    terms: BTreeMap<String, Vec<TermRecord>>,
    authors: Vec<AuthorRecord>,
}

impl CatalogRepository {
    /// Index a catalog.
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        let mut by_date: BTreeMap<SitemapDate, Vec<ContentItem>> = BTreeMap::new();
        for post in catalog.posts.into_iter().filter(|p| p.status.is_public()) {
            by_date.entry(post.date).or_default().push(post);
        }

        let mut by_id = HashMap::new();
        for (date, posts) in &mut by_date {
            posts.sort_by_key(|p| p.id);
            posts.dedup_by_key(|p| p.id);
            for (position, post) in posts.iter().enumerate() {
                by_id.insert(post.id, (*date, position));
            }
        }

        let mut terms: BTreeMap<String, Vec<TermRecord>> = BTreeMap::new();
        for term in catalog.terms.into_iter().filter(|t| t.count > 0) {
            terms.entry(term.taxonomy.clone()).or_default().push(term);
        }
        for list in terms.values_mut() {
            list.sort_by_key(|t| t.id);
        }

        let mut authors: Vec<AuthorRecord> = catalog
            .authors
            .into_iter()
            .filter(|a| a.post_count > 0)
            .collect();
        authors.sort_by_key(|a| a.id);

        Self {
            by_date,
            by_id,
            terms,
            authors,
        }
    }

    /// Load a JSON catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("content catalog {}", path.display()))
            } else {
                Error::Content(format!("Failed to read catalog {}: {e}", path.display()))
            }
        })?;
        let catalog: Catalog = serde_json::from_str(&raw)
            .map_err(|e| Error::Content(format!("Invalid catalog {}: {e}", path.display())))?;

        let repo = Self::new(catalog);
        debug!(
            path = %path.display(),
            dates = repo.by_date.len(),
            posts = repo.by_id.len(),
            "Loaded content catalog"
        );
        Ok(repo)
    }

    /// Number of public posts.
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.by_id.len()
    }

    fn item(&self, id: u64) -> Option<&ContentItem> {
        let (date, position) = self.by_id.get(&id)?;
        self.by_date.get(date)?.get(*position)
    }
}

impl ContentRepository for CatalogRepository {
    fn dates_with_content(&self) -> Result<Vec<SitemapDate>> {
        Ok(self.by_date.keys().copied().collect())
    }

    fn dates_modified_since(&self, since: DateTime<Utc>) -> Result<Vec<SitemapDate>> {
        Ok(self
            .by_date
            .iter()
            .filter(|(_, posts)| posts.iter().any(|p| p.modified > since))
            .map(|(date, _)| *date)
            .collect())
    }

    fn content_ids_for_date(&self, date: SitemapDate, limit: usize) -> Result<Vec<u64>> {
        Ok(self
            .by_date
            .get(&date)
            .map(|posts| posts.iter().take(limit).map(|p| p.id).collect())
            .unwrap_or_default())
    }

    fn load_items(&self, ids: &[u64]) -> Result<Vec<ContentItem>> {
        Ok(ids.iter().filter_map(|id| self.item(*id)).cloned().collect())
    }

    fn max_modified_for_date(&self, date: SitemapDate) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .by_date
            .get(&date)
            .and_then(|posts| posts.iter().map(|p| p.modified).max()))
    }

    fn images_for_urls(&self, urls: &[&str]) -> Result<BTreeMap<String, Vec<ImageRecord>>> {
        let wanted: std::collections::HashSet<&str> = urls.iter().copied().collect();
        Ok(self
            .by_date
            .values()
            .flatten()
            .filter(|p| !p.images.is_empty() && wanted.contains(p.url.as_str()))
            .map(|p| (p.url.clone(), p.images.clone()))
            .collect())
    }
}

impl ArchiveRepository for CatalogRepository {
    fn terms(&self, taxonomy: &str, offset: usize, limit: usize) -> Result<Vec<TermRecord>> {
        Ok(self
            .terms
            .get(taxonomy)
            .map(|terms| terms.iter().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn term_count(&self, taxonomy: &str) -> Result<u64> {
        Ok(self.terms.get(taxonomy).map_or(0, |terms| terms.len() as u64))
    }

    fn authors(&self, offset: usize, limit: usize) -> Result<Vec<AuthorRecord>> {
        Ok(self.authors.iter().skip(offset).take(limit).cloned().collect())
    }

    fn author_count(&self) -> Result<u64> {
        Ok(self.authors.len() as u64)
    }
}

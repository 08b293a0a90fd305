use std::sync::Arc;

use tracing::debug;

use super::UrlEnhancer;
use crate::entry::MAX_IMAGES_PER_URL;
use crate::repository::{ContentRepository, ImageRecord};
use crate::{ImageEntry, Result, UrlEntry};

/// Attaches image metadata to page entries whose content has images.
///
/// Entries that already carry images, or whose content has no usable images,
/// come back unchanged.
pub struct ImageEnhancer {
    repo: Arc<dyn ContentRepository>,
}

impl std::fmt::Debug for ImageEnhancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageEnhancer").finish_non_exhaustive()
    }
}

impl ImageEnhancer {
    /// Create an enhancer reading images from `repo`.
    #[must_use]
    pub fn new(repo: Arc<dyn ContentRepository>) -> Self {
        Self { repo }
    }
}

fn to_image_entries(records: &[ImageRecord]) -> Vec<ImageEntry> {
    records
        .iter()
        .filter_map(|record| match ImageEntry::new(record.url.clone()) {
            Ok(image) => {
                let image = match &record.title {
                    Some(title) => image.with_title(title.clone()),
                    None => image,
                };
                Some(match &record.caption {
                    Some(caption) => image.with_caption(caption.clone()),
                    None => image,
                })
            },
            Err(e) => {
                debug!(url = %record.url, error = %e, "Dropping invalid image");
                None
            },
        })
        .take(MAX_IMAGES_PER_URL)
        .collect()
}

impl UrlEnhancer for ImageEnhancer {
    fn name(&self) -> &str {
        "image"
    }

    fn enhance(&self, entries: &[UrlEntry]) -> Result<Vec<UrlEntry>> {
        let candidates: Vec<&str> = entries
            .iter()
            .filter(|entry| entry.images().is_empty())
            .map(UrlEntry::loc)
            .collect();
        if candidates.is_empty() {
            return Ok(entries.to_vec());
        }

        let found = self.repo.images_for_urls(&candidates)?;
        entries
            .iter()
            .map(|entry| {
                if !entry.images().is_empty() {
                    return Ok(entry.clone());
                }
                let images = found
                    .get(entry.loc())
                    .map(|records| to_image_entries(records))
                    .unwrap_or_default();
                if images.is_empty() {
                    Ok(entry.clone())
                } else {
                    entry.clone().with_images(images)
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::repository::{Catalog, CatalogRepository};
    use crate::testing::post;

    fn enhancer() -> ImageEnhancer {
        let mut with_images = post(1, "2024-07-10", "2024-07-10T08:00:00Z");
        with_images.images = vec![
            ImageRecord {
                url: "https://example.com/a.jpg".into(),
                title: Some("A".into()),
                caption: None,
            },
            ImageRecord {
                url: "not a url".into(),
                title: None,
                caption: None,
            },
        ];
        ImageEnhancer::new(Arc::new(CatalogRepository::new(Catalog {
            posts: vec![with_images, post(2, "2024-07-10", "2024-07-10T08:00:00Z")],
            ..Catalog::default()
        })))
    }

    #[test]
    fn test_attaches_images_without_touching_input() {
        // Given: Entries for a post with images and one without
        let input = vec![
            UrlEntry::new("https://example.com/2024-07-10/post-1").unwrap(),
            UrlEntry::new("https://example.com/2024-07-10/post-2").unwrap(),
        ];
        let snapshot = input.clone();

        // When: Enhancing
        let output = enhancer().enhance(&input).unwrap();

        // Then: Only the first gains its one valid image; input is unchanged
        assert_eq!(input, snapshot);
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].images().len(), 1);
        assert_eq!(output[0].images()[0].title(), Some("A"));
        assert_eq!(output[1], input[1]);
    }

    #[test]
    fn test_existing_images_are_preserved() {
        let existing = UrlEntry::new("https://example.com/2024-07-10/post-1")
            .unwrap()
            .with_images(vec![ImageEntry::new("https://example.com/keep.jpg").unwrap()])
            .unwrap();
        let output = enhancer().enhance(std::slice::from_ref(&existing)).unwrap();
        assert_eq!(output, vec![existing]);
    }

    #[test]
    fn test_empty_input() {
        assert!(enhancer().enhance(&[]).unwrap().is_empty());
    }
}

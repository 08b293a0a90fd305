//! Configuration for the sitemap engine.
//!
//! Configuration is stored as TOML. Every section and field is optional in
//! the file; missing values fall back to the defaults documented below.
//!
//! ## Resolution
//!
//! 1. `SITEMAP_CONFIG` names the config file, if set.
//! 2. Otherwise the platform config directory is used
//!    (e.g. `~/.config/sitemapctl/config.toml` on Linux).
//! 3. `SITEMAP_DATA_DIR` overrides `[paths] root` after loading.
//!
//! ## Example
//!
//! ```toml
//! [site]
//! base_url = "https://example.com"
//! public = true
//! utc_offset_minutes = 120
//!
//! [generation]
//! interval_secs = 5
//! posts_per_sitemap = 500
//! detection = "stale"
//!
//! [content]
//! default_changefreq = "weekly"
//! taxonomies = ["category"]
//!
//! [paths]
//! root = "/var/lib/sitemap"
//! ```
//!
//! ```rust
//! use sitemap_core::Config;
//!
//! let config: Config = toml::from_str("[generation]\nposts_per_sitemap = 100")
//!     .map_err(sitemap_core::Error::from)?;
//! assert_eq!(config.generation.posts_per_sitemap, 100);
//! assert_eq!(config.generation.interval_secs, 5);
//! config.validate()?;
//! # Ok::<(), sitemap_core::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::content::UrlPolicy;
use crate::detection::DetectionKind;
use crate::scheduler::{DEFAULT_ACTION_NAME, SchedulerSettings};
use crate::{ChangeFrequency, DEFAULT_MAX_ENTRIES, Error, Result};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SITEMAP_CONFIG";

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "SITEMAP_DATA_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site identity and eligibility.
    pub site: SiteConfig,
    /// Run scheduling.
    pub generation: GenerationConfig,
    /// URL hints and archive providers.
    pub content: ContentConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
}

/// Site identity and eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute base URL sitemap file locations are built from.
    pub base_url: String,
    /// Whether the site may publish sitemaps.
    pub public: bool,
    /// Offset of the site's calendar from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://example.com".to_string(),
            public: true,
            utc_offset_minutes: 0,
        }
    }
}

/// Run scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seconds between staggered tasks.
    pub interval_secs: u64,
    /// Most posts in one date partition.
    pub posts_per_sitemap: usize,
    /// Entry ceiling applied to every collection.
    pub max_entries: usize,
    /// Dispatcher lane name.
    pub action_name: String,
    /// Detection strategy used when none is given explicitly.
    pub detection: DetectionKind,
    /// Date counts at or below this are generated synchronously; 0 always
    /// schedules.
    pub sync_threshold: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            posts_per_sitemap: crate::content::DEFAULT_POSTS_PER_SITEMAP,
            max_entries: DEFAULT_MAX_ENTRIES,
            action_name: DEFAULT_ACTION_NAME.to_string(),
            detection: DetectionKind::Missing,
            sync_threshold: 0,
        }
    }
}

impl GenerationConfig {
    /// Per-date cap after applying the entry ceiling.
    #[must_use]
    pub fn effective_posts_per_sitemap(&self) -> usize {
        self.posts_per_sitemap.min(self.max_entries)
    }

    /// Scheduler settings derived from this section.
    #[must_use]
    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            interval: Duration::from_secs(self.interval_secs),
            action_name: self.action_name.clone(),
        }
    }
}

/// URL hints and archive providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// `changefreq` emitted when a provider has no better value.
    pub default_changefreq: ChangeFrequency,
    /// `priority` emitted when a provider has no better value.
    pub default_priority: f32,
    /// Attach image metadata to post URLs.
    pub include_images: bool,
    /// Taxonomies with archive sitemaps.
    pub taxonomies: Vec<String>,
    /// Include author archive sitemaps.
    pub include_authors: bool,
    /// URLs per archive sitemap page.
    pub terms_per_page: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_changefreq: ChangeFrequency::Monthly,
            default_priority: 0.7,
            include_images: true,
            taxonomies: vec!["category".to_string(), "post_tag".to_string()],
            include_authors: true,
            terms_per_page: crate::generator::DEFAULT_ARCHIVE_PER_PAGE,
        }
    }
}

impl ContentConfig {
    /// A URL policy emitting the configured defaults.
    #[must_use]
    pub fn url_policy(&self) -> UrlPolicy {
        UrlPolicy::new(Some(self.default_changefreq), Some(self.default_priority))
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Data root holding the key-value store.
    pub root: PathBuf,
    /// Content catalog file; defaults to `<root>/catalog.json`.
    pub catalog: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: project_dirs().map_or_else(
                || {
                    directories::BaseDirs::new().map_or_else(
                        || PathBuf::from(".sitemapctl"),
                        |base| base.home_dir().join(".sitemapctl"),
                    )
                },
                |dirs| dirs.data_dir().to_path_buf(),
            ),
            catalog: None,
        }
    }
}

impl PathsConfig {
    /// Directory holding the key-value store.
    #[must_use]
    pub fn store_dir(&self) -> PathBuf {
        self.root.join("store")
    }

    /// Content catalog file.
    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| self.root.join("catalog.json"))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "sitemap", "sitemapctl")
}

impl Config {
    /// Load from `SITEMAP_CONFIG` or the platform config directory, falling
    /// back to defaults when no file exists, then apply environment
    /// overrides and validate.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::read(&path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "config file {}",
                path.display()
            )));
        }
        let mut config = Self::read(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Write as TOML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// The config file location.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        let dirs = project_dirs()
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.paths.root = PathBuf::from(root);
        }
    }

    /// Reject values outside their supported ranges.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.site.base_url)
            .map_err(|e| Error::Config(format!("site.base_url '{}': {e}", self.site.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "site.base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if !(-14 * 60..=14 * 60).contains(&self.site.utc_offset_minutes) {
            return Err(Error::Config(format!(
                "site.utc_offset_minutes {} is outside -840..=840",
                self.site.utc_offset_minutes
            )));
        }

        let generation = &self.generation;
        if !(1..=DEFAULT_MAX_ENTRIES).contains(&generation.max_entries) {
            return Err(Error::Config(format!(
                "generation.max_entries must be within 1..={DEFAULT_MAX_ENTRIES}"
            )));
        }
        if generation.posts_per_sitemap == 0 || generation.posts_per_sitemap > generation.max_entries
        {
            return Err(Error::Config(format!(
                "generation.posts_per_sitemap must be within 1..={}",
                generation.max_entries
            )));
        }
        if generation.action_name.trim().is_empty() {
            return Err(Error::Config("generation.action_name cannot be empty".into()));
        }
        if generation.interval_secs > 3600 {
            return Err(Error::Config(
                "generation.interval_secs must be at most 3600".into(),
            ));
        }

        let content = &self.content;
        if !(0.0..=1.0).contains(&content.default_priority) {
            return Err(Error::Config(format!(
                "content.default_priority {} is outside 0.0..=1.0",
                content.default_priority
            )));
        }
        if content.terms_per_page == 0 || content.terms_per_page > generation.max_entries {
            return Err(Error::Config(format!(
                "content.terms_per_page must be within 1..={}",
                generation.max_entries
            )));
        }
        if content.taxonomies.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::Config("content.taxonomies cannot contain blanks".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_values() {
        // Given: Default configuration is requested
        let config = Config::default();

        // Then: Should have the documented defaults
        assert_eq!(config.generation.interval_secs, 5);
        assert_eq!(config.generation.posts_per_sitemap, 500);
        assert_eq!(config.generation.max_entries, 50_000);
        assert_eq!(config.generation.action_name, "sitemap_generate_for_date");
        assert_eq!(config.generation.detection, DetectionKind::Missing);
        assert_eq!(config.content.default_changefreq, ChangeFrequency::Monthly);
        assert!(config.content.include_images);
        assert_eq!(config.content.taxonomies, vec!["category", "post_tag"]);
        assert!(!config.paths.root.as_os_str().is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [site]
            base_url = "https://news.example.org"

            [generation]
            detection = "stale"
            "#,
        )
        .unwrap();

        assert_eq!(config.site.base_url, "https://news.example.org");
        assert!(config.site.public);
        assert_eq!(config.generation.detection, DetectionKind::Stale);
        assert_eq!(config.generation.interval_secs, 5);
    }

    #[test]
    fn test_save_and_load_roundtrip() -> Result<()> {
        // Given: A customised config saved to disk
        let temp = TempDir::new().map_err(Error::from)?;
        let path = temp.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.site.base_url = "https://blog.example.com".into();
        config.generation.sync_threshold = 3;
        config.paths.root = temp.path().join("data");
        config.save(&path)?;

        // When: Loading it back
        let loaded = Config::read(&path)?;

        // Then: Values survive
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_load_from_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Config::load_from(&temp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "[generation\nbroken").unwrap();
        assert!(matches!(Config::read(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_data_dir_override() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == DATA_DIR_ENV).then(|| "/srv/sitemaps".to_string()));
        assert_eq!(config.paths.root, PathBuf::from("/srv/sitemaps"));
        assert_eq!(config.paths.store_dir(), PathBuf::from("/srv/sitemaps/store"));
        assert_eq!(
            config.paths.catalog_path(),
            PathBuf::from("/srv/sitemaps/catalog.json")
        );

        config.apply_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.paths.root, PathBuf::from("/srv/sitemaps"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cases: Vec<fn(&mut Config)> = vec![
            |c| c.site.base_url = "not a url".into(),
            |c| c.site.base_url = "ftp://example.com".into(),
            |c| c.site.utc_offset_minutes = 24 * 60,
            |c| c.generation.max_entries = 60_000,
            |c| c.generation.posts_per_sitemap = 0,
            |c| {
                c.generation.max_entries = 100;
                c.generation.posts_per_sitemap = 101;
            },
            |c| c.generation.action_name = " ".into(),
            |c| c.content.default_priority = 1.5,
            |c| c.content.terms_per_page = 0,
            |c| c.content.taxonomies = vec![String::new()],
        ];
        for (i, mutate) in cases.into_iter().enumerate() {
            let mut config = Config::default();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(Error::Config(_))),
                "case {i} should fail validation"
            );
        }
    }

    #[test]
    fn test_derived_settings() {
        let mut config = Config::default();
        config.generation.interval_secs = 7;
        config.generation.max_entries = 300;
        let settings = config.generation.scheduler_settings();
        assert_eq!(settings.interval, Duration::from_secs(7));
        assert_eq!(config.generation.effective_posts_per_sitemap(), 300);
    }

    proptest! {
        #[test]
        fn test_priority_validation_matches_range(priority in -2.0f32..2.0) {
            let mut config = Config::default();
            config.content.default_priority = priority;
            prop_assert_eq!(config.validate().is_ok(), (0.0..=1.0).contains(&priority));
        }
    }
}

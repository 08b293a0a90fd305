//! Wiring of the core engine from configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use sitemap_core::content::{AuthorsProvider, ImageEnhancer, PostsProvider, TaxonomyProvider};
use sitemap_core::repository::{Catalog, CatalogRepository};
use sitemap_core::{
    Config, DateProvider, DetectionKind, Error, FileStore, GenerationScheduler, KeyValueStore,
    PartitionGenerator, PartitionStore, QueueDispatcher, StaticEligibility, build_date_provider,
};
use tracing::debug;

/// Load configuration from `--config`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Everything a command needs, built once per invocation.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub partitions: Arc<PartitionStore>,
    pub queue: Arc<QueueDispatcher>,
    pub repo: Arc<CatalogRepository>,
    pub scheduler: Arc<GenerationScheduler>,
    missing_catalog: Option<PathBuf>,
}

impl AppContext {
    /// Open the store under the data root and load the content catalog.
    ///
    /// A missing catalog is tolerated so progress commands keep working;
    /// commands that read content call [`Self::require_catalog`].
    pub fn open(config: Config) -> Result<Self> {
        let store_dir = config.paths.store_dir();
        let store: Arc<dyn KeyValueStore> = Arc::new(
            FileStore::open(&store_dir)
                .with_context(|| format!("Failed to open store at {}", store_dir.display()))?,
        );

        let catalog_path = config.paths.catalog_path();
        let (repo, missing_catalog) = match CatalogRepository::load(&catalog_path) {
            Ok(repo) => (repo, None),
            Err(Error::NotFound(_)) => {
                debug!(path = %catalog_path.display(), "No content catalog");
                (CatalogRepository::new(Catalog::default()), Some(catalog_path))
            },
            Err(e) => return Err(e.into()),
        };
        let repo = Arc::new(repo);

        let partitions = Arc::new(PartitionStore::new(Arc::clone(&store)));
        let generator = build_generator(&config, &repo, &partitions);
        let queue = Arc::new(QueueDispatcher::new(Arc::clone(&store)));
        let scheduler = Arc::new(
            GenerationScheduler::new(
                Arc::new(generator),
                Arc::clone(&store),
                queue.clone(),
                Arc::new(StaticEligibility(config.site.public)),
            )
            .with_settings(config.generation.scheduler_settings()),
        );

        Ok(Self {
            config,
            store,
            partitions,
            queue,
            repo,
            scheduler,
            missing_catalog,
        })
    }

    /// Fail unless the content catalog was found.
    pub fn require_catalog(&self) -> Result<()> {
        if let Some(path) = &self.missing_catalog {
            bail!(
                "Content catalog not found at {}. Set paths.catalog or export the catalog there.",
                path.display()
            );
        }
        Ok(())
    }

    /// The detection strategy `kind`, or the configured default.
    pub fn date_provider(&self, kind: Option<DetectionKind>) -> Box<dyn DateProvider> {
        build_date_provider(
            kind.unwrap_or(self.config.generation.detection),
            self.repo.clone(),
            Arc::clone(&self.partitions),
            Arc::clone(&self.store),
        )
    }
}

fn build_generator(
    config: &Config,
    repo: &Arc<CatalogRepository>,
    partitions: &Arc<PartitionStore>,
) -> PartitionGenerator {
    let policy = config.content.url_policy();
    let posts = PostsProvider::new(repo.clone())
        .with_cap(config.generation.effective_posts_per_sitemap())
        .with_policy(policy.clone());

    let mut generator =
        PartitionGenerator::new(Arc::new(posts), repo.clone(), Arc::clone(partitions))
            .with_archive_per_page(config.content.terms_per_page);

    if config.content.include_images {
        generator = generator.with_enhancer(Arc::new(ImageEnhancer::new(repo.clone())));
    }
    for taxonomy in &config.content.taxonomies {
        generator = generator.with_archive(Arc::new(
            TaxonomyProvider::new(repo.clone(), taxonomy.as_str()).with_policy(policy.clone()),
        ));
    }
    generator.with_archive(Arc::new(
        AuthorsProvider::new(repo.clone())
            .with_enabled(config.content.include_authors)
            .with_policy(policy),
    ))
}

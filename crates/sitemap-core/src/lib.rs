//! # sitemap-core
//!
//! Incremental, date-partitioned XML sitemap generation.
//!
//! A content site's sitemap is split into one partition per publication
//! date. Partitions are (re)built one at a time in the background so a large
//! catalog never has to be processed in a single request, and progress is
//! persisted so runs survive restarts and can be inspected or cancelled from
//! any process.
//!
//! ## Architecture
//!
//! - **Value types**: [`SitemapDate`], [`GenerationProgress`], validated
//!   entries ([`UrlEntry`], [`ImageEntry`], [`SitemapIndexEntry`]) and the
//!   50,000-entry bounded collections [`UrlSet`] and
//!   [`SitemapIndexCollection`]
//! - **Collaborators**: [`KeyValueStore`], [`TaskDispatcher`],
//!   [`ContentRepository`] / [`ArchiveRepository`], [`SiteEligibility`]
//! - **Content providers**: turn repository rows into bounded collections
//! - **Detection**: decide which dates need work
//! - **Scheduler**: drives builds synchronously or as staggered tasks and owns
//!   the progress lifecycle
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sitemap_core::content::PostsProvider;
//! use sitemap_core::repository::{Catalog, CatalogRepository};
//! use sitemap_core::{
//!     GenerationScheduler, KeyValueStore, MemoryStore, PartitionGenerator, PartitionStore,
//!     QueueDispatcher, StaticEligibility,
//! };
//!
//! let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let repo = Arc::new(CatalogRepository::new(Catalog::default()));
//! let generator = PartitionGenerator::new(
//!     Arc::new(PostsProvider::new(repo.clone())),
//!     repo,
//!     Arc::new(PartitionStore::new(Arc::clone(&store))),
//! );
//! let scheduler = GenerationScheduler::new(
//!     Arc::new(generator),
//!     Arc::clone(&store),
//!     Arc::new(QueueDispatcher::new(Arc::clone(&store))),
//!     Arc::new(StaticEligibility(true)),
//! );
//!
//! let outcome = scheduler.schedule(&["2024-07-10", "2024-07-11"])?;
//! assert!(outcome.success);
//! assert_eq!(scheduler.get_progress()?.total, 2);
//! # Ok::<(), sitemap_core::Error>(())
//! ```

/// Bounded URL and index collections
pub mod collection;
/// Configuration loading and validation
pub mod config;
/// Content providers and URL policies
pub mod content;
/// Calendar date value type
pub mod date;
/// Detection strategies
pub mod detection;
/// Deferred task dispatch
pub mod dispatch;
/// Site eligibility checks
pub mod eligibility;
/// Sitemap entry value objects
pub mod entry;
/// Error types and result aliases
pub mod error;
/// Partition building and indexing
pub mod generator;
/// Persisted per-date output
pub mod partition;
/// Run progress snapshots
pub mod progress;
/// Content repository interfaces
pub mod repository;
/// Background generation scheduling
pub mod scheduler;
/// Key-value storage
pub mod store;

#[cfg(test)]
mod testing;

pub use collection::{Bounded, DEFAULT_MAX_ENTRIES, SitemapIndexCollection, UrlSet};
pub use config::Config;
pub use date::SitemapDate;
pub use detection::{DateProvider, DetectionKind, build_date_provider};
pub use dispatch::{QueueDispatcher, ScheduledTask, TaskDispatcher};
pub use eligibility::{SiteEligibility, StaticEligibility};
pub use entry::{
    ChangeFrequency, ImageEntry, MAX_IMAGES_PER_URL, MAX_URL_LENGTH, SitemapIndexEntry, UrlEntry,
};
pub use error::{Error, Result};
pub use generator::{DateBuild, PartitionGenerator};
pub use partition::{PartitionRecord, PartitionStore};
pub use progress::{GenerationProgress, ProgressReport};
pub use scheduler::{
    CancelOutcome, CronTaskHandler, DateOutcome, GENERATION_INTERVAL, GenerateOutcome,
    GenerationScheduler, ReconcileOutcome, ScheduleOutcome, SchedulerSettings, SchedulerState,
    TaskOutcome, TaskPayload,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, WriteHint};

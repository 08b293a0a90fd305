//! End-to-end runs through the public API: schedule, dispatch, build, inspect.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sitemap_core::content::PostsProvider;
use sitemap_core::repository::{Catalog, CatalogRepository, ContentItem, ContentStatus};
use sitemap_core::{
    CronTaskHandler, DateBuild, DateOutcome, FileStore, GenerationScheduler, KeyValueStore,
    MemoryStore, PartitionGenerator, PartitionStore, QueueDispatcher, SchedulerState, SitemapDate,
    StaticEligibility, TaskOutcome,
};
use tempfile::TempDir;

fn date(raw: &str) -> SitemapDate {
    raw.parse().unwrap()
}

fn post(id: u64, day: &str) -> ContentItem {
    ContentItem {
        id,
        url: format!("https://example.com/{day}/post-{id}"),
        date: date(day),
        modified: DateTime::parse_from_rfc3339(&format!("{day}T12:00:00Z"))
            .unwrap()
            .with_timezone(&Utc),
        status: ContentStatus::Published,
        images: Vec::new(),
    }
}

fn catalog() -> Catalog {
    Catalog {
        posts: vec![
            post(1, "2024-07-10"),
            post(2, "2024-07-10"),
            post(3, "2024-07-11"),
            post(4, "2024-07-12"),
        ],
        ..Catalog::default()
    }
}

struct Site {
    scheduler: Arc<GenerationScheduler>,
    queue: Arc<QueueDispatcher>,
    handler: CronTaskHandler,
}

fn site(store: Arc<dyn KeyValueStore>) -> Site {
    let repo = Arc::new(CatalogRepository::new(catalog()));
    let generator = PartitionGenerator::new(
        Arc::new(PostsProvider::new(repo.clone())),
        repo,
        Arc::new(PartitionStore::new(Arc::clone(&store))),
    );
    let queue = Arc::new(QueueDispatcher::new(Arc::clone(&store)));
    let scheduler = Arc::new(GenerationScheduler::new(
        Arc::new(generator),
        store,
        queue.clone(),
        Arc::new(StaticEligibility(true)),
    ));
    Site {
        handler: CronTaskHandler::new(Arc::clone(&scheduler)),
        scheduler,
        queue,
    }
}

fn drain(site: &Site) -> Vec<TaskOutcome> {
    let horizon = Utc::now() + Duration::hours(1);
    let mut outcomes = Vec::new();
    while let Some(task) = site.queue.next_due(horizon).unwrap() {
        outcomes.push(site.handler.handle(&task).unwrap());
        site.queue.acknowledge(task.id).unwrap();
    }
    outcomes
}

#[test]
fn scheduled_run_drains_to_completion() {
    // Given: Two dates scheduled on a fresh site
    let site = site(Arc::new(MemoryStore::new()));
    let outcome = site
        .scheduler
        .schedule(&["2024-07-10", "2024-07-11"])
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.scheduled, 2);
    assert_eq!(site.scheduler.state().unwrap(), SchedulerState::Scheduled);

    // When: The worker runs every queued task
    let outcomes = drain(&site);

    // Then: Both partitions exist and the run is finished
    assert_eq!(outcomes.len(), 2);
    let report = site.scheduler.get_progress().unwrap();
    assert_eq!(
        (report.total, report.remaining, report.completed),
        (2, 0, 2)
    );
    assert!(!report.in_progress);
    assert_eq!(site.scheduler.state().unwrap(), SchedulerState::Completed);

    let partitions = site.scheduler.generator().partitions();
    assert_eq!(
        partitions.built_dates().unwrap(),
        vec![date("2024-07-10"), date("2024-07-11")]
    );
    assert_eq!(partitions.total_url_count().unwrap(), 3);
}

#[test]
fn cancel_keeps_run_totals() {
    let site = site(Arc::new(MemoryStore::new()));
    site.scheduler
        .schedule(&["2024-07-10", "2024-07-11", "2024-07-12"])
        .unwrap();

    let cancelled = site.scheduler.cancel().unwrap();

    assert!(cancelled.success);
    assert_eq!(cancelled.removed_tasks, 3);
    let report = site.scheduler.get_progress().unwrap();
    assert_eq!(report.total, 3);
    assert!(!report.in_progress);
    assert_eq!(site.scheduler.state().unwrap(), SchedulerState::Cancelled);
    assert!(drain(&site).is_empty());
}

#[test]
fn second_schedule_is_refused_while_running() {
    let site = site(Arc::new(MemoryStore::new()));
    site.scheduler.schedule(&["2024-07-10"]).unwrap();

    let again = site.scheduler.schedule(&["2024-07-11"]).unwrap();

    assert!(!again.success);
    assert_eq!(again.scheduled, 0);
    assert_eq!(site.scheduler.get_progress().unwrap().total, 1);
}

#[test]
fn empty_date_writes_nothing() {
    // Given: A date with no published content
    let site = site(Arc::new(MemoryStore::new()));

    // When: Generating it synchronously
    let outcome = site.scheduler.generate_now(&["2024-01-01"]).unwrap();

    // Then: It counts as empty and leaves no partition behind
    assert!(outcome.success);
    assert_eq!((outcome.generated, outcome.empty), (0, 1));
    let partitions = site.scheduler.generator().partitions();
    assert!(partitions.load(date("2024-01-01")).unwrap().is_none());
    assert!(partitions.built_dates().unwrap().is_empty());
}

#[test]
fn regeneration_is_idempotent() {
    let site = site(Arc::new(MemoryStore::new()));

    let first = site.scheduler.generate_for_date("2024-07-10").unwrap();
    let stored = site
        .scheduler
        .generator()
        .partitions()
        .load(date("2024-07-10"))
        .unwrap()
        .unwrap();
    let second = site.scheduler.generate_for_date("2024-07-10").unwrap();
    let again = site
        .scheduler
        .generator()
        .partitions()
        .load(date("2024-07-10"))
        .unwrap()
        .unwrap();

    assert!(matches!(
        first,
        DateOutcome::Built {
            build: DateBuild::Written { urls: 2 },
            ..
        }
    ));
    assert!(matches!(
        second,
        DateOutcome::Built {
            build: DateBuild::Unchanged { urls: 2 },
            ..
        }
    ));
    assert_eq!(stored.xml, again.xml);
    assert_eq!(stored.digest, again.digest);
    // Outside a run nothing is recorded
    assert_eq!(site.scheduler.state().unwrap(), SchedulerState::Idle);
}

#[test]
fn file_store_survives_restart() {
    // Given: A run scheduled against an on-disk store
    let dir = TempDir::new().unwrap();
    {
        let site = site(Arc::new(FileStore::open(dir.path()).unwrap()));
        site.scheduler
            .schedule(&["2024-07-10", "2024-07-12"])
            .unwrap();
        let task = site.queue.next_due(Utc::now()).unwrap().unwrap();
        site.handler.handle(&task).unwrap();
        site.queue.acknowledge(task.id).unwrap();
    }

    // When: A new process opens the same directory
    let site = site(Arc::new(FileStore::open(dir.path()).unwrap()));

    // Then: It sees the half-finished run and can finish it
    let report = site.scheduler.get_progress().unwrap();
    assert!(report.in_progress);
    assert_eq!((report.total, report.remaining), (2, 1));
    assert_eq!(
        site.scheduler.progress().unwrap().current_date(),
        Some(date("2024-07-12"))
    );

    let outcomes = drain(&site);
    assert_eq!(outcomes.len(), 1);
    assert!(!site.scheduler.is_in_progress().unwrap());
    assert_eq!(
        site.scheduler.generator().partitions().built_dates().unwrap(),
        vec![date("2024-07-10"), date("2024-07-12")]
    );
}

#[test]
fn index_lists_built_partitions() {
    let site = site(Arc::new(MemoryStore::new()));
    site.scheduler
        .generate_now(&["2024-07-11", "2024-07-10"])
        .unwrap();

    let index = site
        .scheduler
        .generator()
        .build_index("https://example.com")
        .unwrap();
    let locs: Vec<&str> = index.entries().iter().map(|e| e.loc()).collect();

    assert_eq!(
        locs,
        vec![
            "https://example.com/sitemap-2024-07-10.xml",
            "https://example.com/sitemap-2024-07-11.xml",
        ]
    );
}

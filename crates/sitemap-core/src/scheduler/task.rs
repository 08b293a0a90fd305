//! Adapter between dispatched tasks and the scheduler.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{GenerationScheduler, TaskOutcome};
use crate::dispatch::ScheduledTask;
use crate::{Error, Result, SitemapDate};

/// Arguments carried by one generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Date to build.
    pub date: SitemapDate,
    /// Date of the following task in the same run, if any.
    #[serde(default)]
    pub next_date: Option<SitemapDate>,
}

/// Entry point invoked once per dispatched generation task.
#[derive(Debug, Clone)]
pub struct CronTaskHandler {
    scheduler: Arc<GenerationScheduler>,
}

impl CronTaskHandler {
    /// Handle tasks for `scheduler`'s lane.
    #[must_use]
    pub const fn new(scheduler: Arc<GenerationScheduler>) -> Self {
        Self { scheduler }
    }

    /// Whether `task` belongs to this handler's lane.
    #[must_use]
    pub fn accepts(&self, task: &ScheduledTask) -> bool {
        task.action == self.scheduler.settings().action_name
    }

    /// Decode and run one task.
    ///
    /// A payload that does not decode is an error; the caller should
    /// acknowledge it anyway so it is not redelivered forever.
    pub fn handle(&self, task: &ScheduledTask) -> Result<TaskOutcome> {
        if !self.accepts(task) {
            return Err(Error::Dispatch(format!(
                "task {} belongs to lane '{}'",
                task.id, task.action
            )));
        }
        let payload: TaskPayload = serde_json::from_value(task.payload.clone()).map_err(|e| {
            warn!(id = task.id, error = %e, "Undecodable generation task");
            Error::Serialization(format!("task {} payload: {e}", task.id))
        })?;
        self.scheduler.run_task(&payload)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::content::PostsProvider;
    use crate::dispatch::QueueDispatcher;
    use crate::eligibility::SiteEligibility;
    use crate::generator::{DateBuild, PartitionGenerator};
    use crate::partition::PartitionStore;
    use crate::repository::{Catalog, CatalogRepository, ContentItem, ContentRepository};
    use crate::scheduler::{DEFAULT_ACTION_NAME, DateOutcome, SchedulerState};
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::testing::{date, post};
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Repository failing for one date.
    struct Flaky {
        inner: CatalogRepository,
        broken: SitemapDate,
    }

    impl ContentRepository for Flaky {
        fn dates_with_content(&self) -> Result<Vec<SitemapDate>> {
            self.inner.dates_with_content()
        }
        fn dates_modified_since(&self, since: DateTime<Utc>) -> Result<Vec<SitemapDate>> {
            self.inner.dates_modified_since(since)
        }
        fn content_ids_for_date(&self, date: SitemapDate, limit: usize) -> Result<Vec<u64>> {
            if date == self.broken {
                return Err(Error::Content("database went away".into()));
            }
            self.inner.content_ids_for_date(date, limit)
        }
        fn load_items(&self, ids: &[u64]) -> Result<Vec<ContentItem>> {
            self.inner.load_items(ids)
        }
        fn max_modified_for_date(&self, date: SitemapDate) -> Result<Option<DateTime<Utc>>> {
            self.inner.max_modified_for_date(date)
        }
        fn images_for_urls(
            &self,
            urls: &[&str],
        ) -> Result<BTreeMap<String, Vec<crate::repository::ImageRecord>>> {
            self.inner.images_for_urls(urls)
        }
    }

    struct Setup {
        handler: CronTaskHandler,
        scheduler: Arc<GenerationScheduler>,
        queue: Arc<QueueDispatcher>,
        public: Arc<AtomicBool>,
    }

    fn setup() -> Setup {
        setup_broken_on("2024-07-11")
    }

    fn setup_broken_on(broken: &str) -> Setup {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let repo = Arc::new(Flaky {
            inner: CatalogRepository::new(Catalog {
                posts: vec![
                    post(1, "2024-07-10", "2024-07-10T08:00:00Z"),
                    post(2, "2024-07-11", "2024-07-11T08:00:00Z"),
                    post(3, "2024-07-12", "2024-07-12T08:00:00Z"),
                ],
                ..Catalog::default()
            }),
            broken: date(broken),
        });
        let generator = Arc::new(PartitionGenerator::new(
            Arc::new(PostsProvider::new(repo.clone())),
            repo,
            Arc::new(PartitionStore::new(Arc::clone(&store))),
        ));
        let queue = Arc::new(QueueDispatcher::new(Arc::clone(&store)));
        let public = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&public);
        let eligibility: Arc<dyn SiteEligibility> =
            Arc::new(move || flag.load(Ordering::SeqCst));
        let scheduler = Arc::new(GenerationScheduler::new(
            generator,
            store,
            queue.clone(),
            eligibility,
        ));
        Setup {
            handler: CronTaskHandler::new(Arc::clone(&scheduler)),
            scheduler,
            queue,
            public,
        }
    }

    fn drain(s: &Setup) -> Vec<TaskOutcome> {
        let far_future = Utc::now() + chrono::Duration::hours(1);
        let mut outcomes = Vec::new();
        while let Some(task) = s.queue.next_due(far_future).unwrap() {
            outcomes.push(s.handler.handle(&task).unwrap());
            s.queue.acknowledge(task.id).unwrap();
        }
        outcomes
    }

    #[test]
    fn test_failed_date_does_not_stop_the_lane() {
        // Given: A run over three dates where the middle one fails to build
        let s = setup();
        s.scheduler
            .schedule(&["2024-07-10", "2024-07-11", "2024-07-12"])
            .unwrap();

        // When: Every task runs
        let outcomes = drain(&s);

        // Then: The failure is reported, progress still reaches zero
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(
            &outcomes[1],
            TaskOutcome::Ran(DateOutcome::Failed { .. })
        ));
        assert!(matches!(
            &outcomes[2],
            TaskOutcome::Ran(DateOutcome::Built {
                build: DateBuild::Written { urls: 1 },
                ..
            })
        ));
        let progress = s.scheduler.get_progress().unwrap();
        assert_eq!((progress.total, progress.remaining, progress.completed), (3, 0, 3));
        assert!(!progress.in_progress);
        assert_eq!(
            s.scheduler.generator().partitions().built_dates().unwrap(),
            vec![date("2024-07-10"), date("2024-07-12")]
        );
    }

    #[test]
    fn test_redelivered_task_counts_once() {
        // Given: A run whose first task is delivered twice before it is acknowledged
        let s = setup_broken_on("2024-07-01");
        s.scheduler
            .schedule(&["2024-07-10", "2024-07-12", "2024-07-11"])
            .unwrap();
        let first = s.queue.next_due(Utc::now()).unwrap().unwrap();
        s.handler.handle(&first).unwrap();
        s.handler.handle(&first).unwrap();
        s.queue.acknowledge(first.id).unwrap();
        assert_eq!(s.scheduler.get_progress().unwrap().remaining, 2);

        // When: The rest of the lane runs
        let outcomes = drain(&s);

        // Then: Every date is built and the run completes exactly once
        assert_eq!(outcomes.len(), 2);
        assert!(
            outcomes
                .iter()
                .all(|outcome| matches!(outcome, TaskOutcome::Ran(DateOutcome::Built { .. })))
        );
        assert_eq!(
            s.scheduler.generator().partitions().built_dates().unwrap(),
            vec![date("2024-07-10"), date("2024-07-11"), date("2024-07-12")]
        );
        let progress = s.scheduler.get_progress().unwrap();
        assert_eq!((progress.total, progress.remaining, progress.completed), (3, 0, 3));
        assert!(!progress.in_progress);
    }

    #[test]
    fn test_ineligible_site_halts_run() {
        let s = setup();
        s.scheduler
            .schedule(&["2024-07-10", "2024-07-12"])
            .unwrap();
        s.public.store(false, Ordering::SeqCst);

        let outcomes = drain(&s);

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            outcomes[0],
            TaskOutcome::Halted {
                removed_tasks: 2,
                ..
            }
        ));
        assert!(!s.scheduler.is_in_progress().unwrap());
        assert_eq!(s.scheduler.state().unwrap(), SchedulerState::Cancelled);
        assert!(s.scheduler.generator().partitions().built_dates().unwrap().is_empty());
    }

    #[test]
    fn test_running_state_tracks_current_date() {
        let s = setup();
        s.scheduler
            .schedule(&["2024-07-10", "2024-07-12"])
            .unwrap();

        let task = s.queue.next_due(Utc::now()).unwrap().unwrap();
        s.handler.handle(&task).unwrap();
        s.queue.acknowledge(task.id).unwrap();

        assert_eq!(s.scheduler.state().unwrap(), SchedulerState::Running);
        assert_eq!(
            s.scheduler.progress().unwrap().current_date(),
            Some(date("2024-07-12"))
        );
    }

    #[test]
    fn test_rejects_foreign_and_garbled_tasks() {
        let s = setup();
        let foreign = ScheduledTask {
            id: 1,
            action: "other".into(),
            payload: serde_json::json!({"date": "2024-07-10"}),
            run_at: Utc::now(),
        };
        assert!(matches!(s.handler.handle(&foreign), Err(Error::Dispatch(_))));

        let garbled = ScheduledTask {
            action: DEFAULT_ACTION_NAME.into(),
            payload: serde_json::json!({"date": "2024-02-30"}),
            ..foreign
        };
        assert!(matches!(
            s.handler.handle(&garbled),
            Err(Error::Serialization(_))
        ));
    }
}

//! Deferred task dispatch.
//!
//! The scheduler never runs date builds itself when staggering; it hands
//! them to a [`TaskDispatcher`] under a named action ("lane"). Delivery is
//! at-least-once: a task may run more than once, and callers must make task
//! handlers idempotent.
//!
//! [`QueueDispatcher`] keeps the queue in a [`KeyValueStore`] so pending
//! work survives restarts. Worker loops drive it with
//! [`QueueDispatcher::next_due`] and acknowledge with
//! [`QueueDispatcher::acknowledge`] only after the handler returns.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{KeyValueStore, WriteHint, read_json, write_json};
use crate::{Error, Result};

const QUEUE_KEY: &str = "sitemap_task_queue";

/// A unit of deferred work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    /// Queue-assigned identifier.
    pub id: u64,
    /// Action (lane) name.
    pub action: String,
    /// Handler arguments.
    pub payload: serde_json::Value,
    /// Earliest time the task may run.
    pub run_at: DateTime<Utc>,
}

/// Deferred task dispatcher consumed by the scheduler.
pub trait TaskDispatcher: Send + Sync {
    /// Queue `payload` under `action` to run after `delay`. Returns the task id.
    fn enqueue(&self, action: &str, payload: serde_json::Value, delay: Duration) -> Result<u64>;

    /// Remove every pending task for `action`. Returns how many were removed.
    fn cancel_all(&self, action: &str) -> Result<usize>;

    /// Run time of the earliest pending task for `action`.
    fn next_scheduled(&self, action: &str) -> Result<Option<DateTime<Utc>>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueState {
    next_id: u64,
    tasks: Vec<ScheduledTask>,
}

/// [`TaskDispatcher`] persisted in a [`KeyValueStore`].
pub struct QueueDispatcher {
    store: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl std::fmt::Debug for QueueDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueDispatcher").finish_non_exhaustive()
    }
}

impl QueueDispatcher {
    /// Create a dispatcher storing its queue in `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            guard: Mutex::new(()),
        }
    }

    /// Pending tasks for `action`, in run order.
    pub fn pending(&self, action: &str) -> Result<Vec<ScheduledTask>> {
        let mut tasks: Vec<ScheduledTask> = self
            .load()?
            .tasks
            .into_iter()
            .filter(|t| t.action == action)
            .collect();
        tasks.sort_by_key(|t| (t.run_at, t.id));
        Ok(tasks)
    }

    /// The earliest task due at `now`, across all actions.
    ///
    /// The task stays queued until [`Self::acknowledge`] is called.
    pub fn next_due(&self, now: DateTime<Utc>) -> Result<Option<ScheduledTask>> {
        Ok(self
            .load()?
            .tasks
            .into_iter()
            .filter(|t| t.run_at <= now)
            .min_by_key(|t| (t.run_at, t.id)))
    }

    /// Run time of the earliest pending task across all actions.
    pub fn next_run_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load()?.tasks.iter().map(|t| t.run_at).min())
    }

    /// Remove a finished task. Returns whether it was still queued.
    pub fn acknowledge(&self, id: u64) -> Result<bool> {
        self.update(|state| {
            let before = state.tasks.len();
            state.tasks.retain(|t| t.id != id);
            before != state.tasks.len()
        })
    }

    fn load(&self) -> Result<QueueState> {
        Ok(read_json(self.store.as_ref(), QUEUE_KEY)?.unwrap_or_default())
    }

    fn update<T>(&self, apply: impl FnOnce(&mut QueueState) -> T) -> Result<T> {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| Error::Dispatch("task queue lock poisoned".into()))?;
        let mut state = self.load()?;
        let out = apply(&mut state);
        write_json(self.store.as_ref(), QUEUE_KEY, &state, WriteHint::SkipWarmup)?;
        Ok(out)
    }
}

impl TaskDispatcher for QueueDispatcher {
    fn enqueue(&self, action: &str, payload: serde_json::Value, delay: Duration) -> Result<u64> {
        let delay = chrono::Duration::from_std(delay)
            .map_err(|e| Error::Dispatch(format!("delay out of range: {e}")))?;
        let run_at = Utc::now() + delay;
        let id = self.update(|state| {
            state.next_id += 1;
            let id = state.next_id;
            state.tasks.push(ScheduledTask {
                id,
                action: action.to_string(),
                payload,
                run_at,
            });
            id
        })?;
        debug!(action, id, %run_at, "Enqueued task");
        Ok(id)
    }

    fn cancel_all(&self, action: &str) -> Result<usize> {
        let removed = self.update(|state| {
            let before = state.tasks.len();
            state.tasks.retain(|t| t.action != action);
            before - state.tasks.len()
        })?;
        debug!(action, removed, "Cancelled pending tasks");
        Ok(removed)
    }

    fn next_scheduled(&self, action: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .load()?
            .tasks
            .iter()
            .filter(|t| t.action == action)
            .map(|t| t.run_at)
            .min())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};
    use serde_json::json;
    use tempfile::TempDir;

    fn dispatcher() -> QueueDispatcher {
        QueueDispatcher::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_tasks_are_ordered_by_run_time() {
        // Given: Tasks enqueued out of run order
        let queue = dispatcher();
        queue
            .enqueue("lane", json!({"n": 2}), Duration::from_secs(10))
            .unwrap();
        queue
            .enqueue("lane", json!({"n": 1}), Duration::from_secs(5))
            .unwrap();
        queue
            .enqueue("other", json!({}), Duration::from_secs(1))
            .unwrap();

        // When: Listing the lane
        let pending = queue.pending("lane").unwrap();

        // Then: Earlier run times come first and other lanes are excluded
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].payload, json!({"n": 1}));
        assert!(queue.next_scheduled("lane").unwrap().unwrap() <= pending[1].run_at);
    }

    #[test]
    fn test_next_due_respects_run_time_and_ack() {
        let queue = dispatcher();
        let id = queue.enqueue("lane", json!(1), Duration::ZERO).unwrap();
        queue
            .enqueue("lane", json!(2), Duration::from_secs(3600))
            .unwrap();

        let due = queue.next_due(Utc::now()).unwrap().unwrap();
        assert_eq!(due.id, id);

        // Not acknowledged yet: still delivered
        assert_eq!(queue.next_due(Utc::now()).unwrap().unwrap().id, id);

        assert!(queue.acknowledge(id).unwrap());
        assert!(!queue.acknowledge(id).unwrap());
        assert!(queue.next_due(Utc::now()).unwrap().is_none());
        assert!(queue.next_run_at().unwrap().is_some());
    }

    #[test]
    fn test_cancel_all_only_touches_one_lane() {
        let queue = dispatcher();
        queue.enqueue("lane", json!(1), Duration::ZERO).unwrap();
        queue.enqueue("lane", json!(2), Duration::ZERO).unwrap();
        queue.enqueue("keep", json!(3), Duration::ZERO).unwrap();

        assert_eq!(queue.cancel_all("lane").unwrap(), 2);
        assert_eq!(queue.cancel_all("lane").unwrap(), 0);
        assert!(queue.next_scheduled("lane").unwrap().is_none());
        assert_eq!(queue.pending("keep").unwrap().len(), 1);
    }

    #[test]
    fn test_queue_persists_in_file_store() {
        let temp = TempDir::new().unwrap();
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(temp.path()).unwrap());
        QueueDispatcher::new(Arc::clone(&store))
            .enqueue("lane", json!("x"), Duration::ZERO)
            .unwrap();

        let reopened = QueueDispatcher::new(Arc::new(FileStore::open(temp.path()).unwrap()));
        let pending = reopened.pending("lane").unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, 1);
    }
}

//! Persistent key-value storage used for progress counters, partition output
//! and the task queue.
//!
//! The host platform's option table is modelled as a [`KeyValueStore`]. Two
//! implementations ship with the crate:
//!
//! - [`MemoryStore`]: process-local, used by tests and one-shot runs.
//! - [`FileStore`]: one JSON document per key under a directory, written
//!   atomically so a crashed writer never leaves a half-written value.
//!
//! Values are opaque strings. [`read_json`] and [`write_json`] layer typed
//! access on top.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

/// How a value is expected to be accessed after it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteHint {
    /// Regular value, read often enough to be worth preloading.
    #[default]
    Default,
    /// High-churn value (progress counters) that should not be preloaded
    /// into any warm cache the store maintains.
    SkipWarmup,
}

/// String-keyed persistent storage.
///
/// Writes to a single key are last-writer-wins. Implementations must make a
/// `set` visible in full or not at all.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str, hint: WriteHint) -> Result<()>;

    /// Remove `key`. Returns whether a value was present.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Keys starting with `prefix`, in ascending order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Read and decode a JSON value.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    store
        .get(key)?
        .map(|raw| serde_json::from_str(&raw).map_err(Into::into))
        .transpose()
}

/// Encode and store a JSON value.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
    hint: WriteHint,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw, hint)
}

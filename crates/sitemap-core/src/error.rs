//! Error types and handling for sitemap-core operations.
//!
//! Errors fall into three broad families, and callers are expected to treat
//! them differently:
//!
//! - **Validation errors** (`InvalidDate`, `InvalidUrl`, `InvalidEntry`,
//!   `ResourceLimited`): raised synchronously while building a value object.
//!   They indicate a bug in the caller and never reach persisted state.
//! - **Collaborator errors** (`Content`, `Storage`, `Dispatch`, `Io`,
//!   `Serialization`): failures of the content repository, key-value store or
//!   task dispatcher during one unit of work. The scheduler logs them per date
//!   and keeps the queue moving.
//! - **Setup errors** (`Config`, `NotFound`, `Other`).
//!
//! Expected conditions such as "no dates to process" or "site is not public"
//! are not errors at all; the scheduler reports them through structured
//! outcomes instead.
//!
//! ```rust
//! use sitemap_core::{Error, SitemapDate};
//!
//! match "2023-02-29".parse::<SitemapDate>() {
//!     Err(e @ Error::InvalidDate(_)) => assert_eq!(e.category(), "invalid_date"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use thiserror::Error;

/// The main error type for sitemap-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers the file-backed key-value store and configuration files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    ///
    /// Raised when persisted JSON/TOML cannot be decoded or when XML output
    /// cannot be written.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The key-value store rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The content repository failed to answer a query.
    #[error("Content error: {0}")]
    Content(String),

    /// The deferred task dispatcher failed to enqueue or cancel work.
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A date string or triple does not name a real calendar day.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A URL is not absolute, uses an unsupported scheme, or is too long.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A sitemap entry violates a protocol constraint (priority range,
    /// change frequency, image count).
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// A bounded collection is full.
    #[error("Resource limited: {0}")]
    ResourceLimited(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// Only transient I/O conditions qualify. Collaborator failures are
    /// retried by re-detection on the next pass rather than inline.
    ///
    /// ```rust
    /// use sitemap_core::Error;
    /// use std::io;
    ///
    /// assert!(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).is_recoverable());
    /// assert!(!Error::InvalidDate("2023-02-29".into()).is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Whether this error is a synchronous validation failure.
    ///
    /// Validation errors are raised when constructing value objects and are
    /// propagated to callers instead of being absorbed per task.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDate(_)
                | Self::InvalidUrl(_)
                | Self::InvalidEntry(_)
                | Self::ResourceLimited(_)
        )
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful as a structured logging field.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
            Self::Storage(_) => "storage",
            Self::Content(_) => "content",
            Self::Dispatch(_) => "dispatch",
            Self::NotFound(_) => "not_found",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidUrl(_) => "invalid_url",
            Self::InvalidEntry(_) => "invalid_entry",
            Self::ResourceLimited(_) => "resource_limited",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

//! Shared helpers for command implementations.

pub mod context;
pub mod logging;

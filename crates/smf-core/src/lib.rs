//! Foundational low-level utilities shared across Secure Music Flow crates.
//!
//! Provides the atomic file-write helper used for deployment manifests and the
//! clock helpers that stamp deployment runs.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::write_text_atomic;
pub use time_utils::{current_unix_timestamp_ms, iso8601_from_unix_ms};

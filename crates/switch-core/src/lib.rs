//! Foundational low-level utilities shared across switch crates.
//!
//! Provides atomic file-write helpers used by the channel record store and the
//! millisecond clock stamped onto persisted channel records.

pub mod atomic_io;
pub mod time_utils;

pub use atomic_io::{write_json_pretty_atomic, write_text_atomic};
pub use time_utils::current_unix_timestamp_ms;

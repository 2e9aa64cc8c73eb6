//! Async JSONL (JSON Lines) support for skilltree storage.
//!
//! Reading is resilient: malformed lines are skipped and reported as
//! [`Warning`]s instead of aborting the load. Writing goes through a
//! temp-file-then-rename step so a crash never leaves a half-written file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{write_jsonl_atomic, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::{JsonlReader, read_jsonl_resilient};
pub use warning::{Warning, WarningCollector};
pub use writer::JsonlWriter;

//! Non-fatal warnings raised while reading JSONL data.
//!
//! A tree file edited by hand or truncated by a crash should still load. The
//! reader records a [`Warning`] for every line it cannot use and keeps going;
//! the [`WarningCollector`] gathers them across async stream boundaries.
//!
//! ```
//! use skilltree_jsonl::warning::{Warning, WarningCollector};
//!
//! let collector = WarningCollector::new();
//! collector.add(Warning::MalformedJson {
//!     line_number: 3,
//!     error: "expected value".to_string(),
//! });
//! assert_eq!(collector.into_warnings().len(), 1);
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

/// A line-level problem that did not stop processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The line is not valid JSON for the requested type and was skipped.
    MalformedJson {
        /// 1-based line number.
        line_number: usize,
        /// The parser's message.
        error: String,
    },

    /// The line was skipped for another reason (e.g. invalid UTF-8).
    SkippedLine {
        /// 1-based line number.
        line_number: usize,
        /// Why the line was skipped.
        reason: String,
    },
}

impl Warning {
    /// Returns the line number associated with this warning.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } | Self::SkippedLine { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::SkippedLine { .. } => "skipped_line",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => write!(f, "line {line_number}: skipped: {reason}"),
        }
    }
}

impl std::error::Error for Warning {}

/// Shared, clonable accumulator for [`Warning`]s.
///
/// Clones share the same underlying list, so a clone can be moved into a
/// stream closure while the caller keeps the original.
///
/// # Mutex Poisoning
///
/// All methods panic if the internal mutex is poisoned, which only happens
/// when another holder panicked mid-push.
#[derive(Debug, Clone, Default)]
pub struct WarningCollector {
    warnings: Arc<Mutex<Vec<Warning>>>,
}

impl WarningCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn add(&self, warning: Warning) {
        tracing::trace!(kind = warning.kind(), line = warning.line_number(), "JSONL warning");
        self.warnings
            .lock()
            .expect("warning collector mutex should not be poisoned")
            .push(warning);
    }

    /// Number of warnings recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings
            .lock()
            .expect("warning collector mutex should not be poisoned")
            .len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the collector and returns the recorded warnings.
    ///
    /// Moves the list out when this is the last clone, copies it otherwise.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        Arc::try_unwrap(self.warnings)
            .map(|mutex| {
                mutex
                    .into_inner()
                    .expect("warning collector mutex should not be poisoned")
            })
            .unwrap_or_else(|shared| {
                shared
                    .lock()
                    .expect("warning collector mutex should not be poisoned")
                    .clone()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line_number_and_detail() {
        let warning = Warning::MalformedJson {
            line_number: 7,
            error: "trailing comma".to_string(),
        };
        let text = warning.to_string();
        assert!(text.contains("line 7"));
        assert!(text.contains("trailing comma"));
    }

    #[test]
    fn kind_is_stable_per_variant() {
        let skipped = Warning::SkippedLine {
            line_number: 1,
            reason: "invalid utf-8".to_string(),
        };
        assert_eq!(skipped.kind(), "skipped_line");
        assert_eq!(skipped.line_number(), 1);
    }

    #[test]
    fn clones_share_the_same_list() {
        let collector = WarningCollector::new();
        let clone = collector.clone();
        clone.add(Warning::SkippedLine {
            line_number: 2,
            reason: "test".to_string(),
        });

        assert_eq!(collector.len(), 1);
        drop(clone);
        assert_eq!(collector.into_warnings().len(), 1);
    }

    #[test]
    fn into_warnings_copies_when_still_shared() {
        let collector = WarningCollector::new();
        let other = collector.clone();
        collector.add(Warning::MalformedJson {
            line_number: 4,
            error: "eof".to_string(),
        });

        let warnings = collector.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(other.len(), 1);
    }
}

//! JSONL reading operations.
//!
//! [`JsonlReader`] wraps any async reader, tracks 1-based line numbers and
//! skips blank lines. [`JsonlReader::read_value`] is strict and fails on the
//! first bad line; [`JsonlReader::stream_resilient`] and
//! [`read_jsonl_resilient`] skip bad lines and record a [`Warning`] instead.

use crate::warning::{Warning, WarningCollector};
use crate::{Error, Result};
use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::pin::pin;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for JSONL (JSON Lines) data.
///
/// # Examples
///
/// ```no_run
/// use skilltree_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("trees.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_value::<serde_json::Value>().await? {
///     println!("line {}: {}", reader.line_number(), value);
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// 1-based number of the last line read; 0 before the first read.
    line_number: usize,
    buffer: String,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::new(),
        }
    }

    /// Creates a new `JsonlReader` with a custom buffer capacity.
    #[must_use]
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: String::new(),
        }
    }

    /// Returns the number of the last line read (0 before any read).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next non-blank line, trimmed. `None` at end of input.
    async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            self.buffer.clear();
            let bytes = self.reader.read_line(&mut self.buffer).await?;
            if bytes == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.buffer.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    /// Reads and deserializes the next value.
    ///
    /// Blank lines are skipped. Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with the line number if the line does not
    /// deserialize, or [`Error::Io`] if reading fails.
    pub async fn read_value<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.next_line().await? {
            Some(line) => serde_json::from_str(&line)
                .map(Some)
                .map_err(|source| Error::Parse {
                    line_number: self.line_number,
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Converts the reader into a stream that yields only the lines that
    /// deserialize, recording a warning for every line that does not.
    ///
    /// An IO error ends the stream after recording a
    /// [`Warning::SkippedLine`].
    pub fn stream_resilient<T>(self, warnings: WarningCollector) -> impl Stream<Item = T>
    where
        T: DeserializeOwned,
    {
        stream::unfold(self, move |mut reader| {
            let warnings = warnings.clone();
            async move {
                loop {
                    match reader.next_line().await {
                        Ok(Some(line)) => match serde_json::from_str::<T>(&line) {
                            Ok(value) => return Some((value, reader)),
                            Err(e) => warnings.add(Warning::MalformedJson {
                                line_number: reader.line_number,
                                error: e.to_string(),
                            }),
                        },
                        Ok(None) => return None,
                        Err(e) => {
                            warnings.add(Warning::SkippedLine {
                                line_number: reader.line_number + 1,
                                reason: e.to_string(),
                            });
                            return None;
                        }
                    }
                }
            }
        })
    }
}

/// Reads every parseable record from a JSONL file.
///
/// Returns the records in file order together with the warnings for lines
/// that were skipped.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened. Bad lines never
/// produce an error.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    let collector = WarningCollector::new();

    let mut values = Vec::new();
    {
        let mut records = pin!(JsonlReader::new(file).stream_resilient::<T>(collector.clone()));
        while let Some(value) = records.next().await {
            values.push(value);
        }
    }

    let warnings = collector.into_warnings();
    if !warnings.is_empty() {
        tracing::debug!(
            path = %path.as_ref().display(),
            count = warnings.len(),
            "Skipped unreadable JSONL lines"
        );
    }
    Ok((values, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    #[test]
    fn new_reader_starts_at_line_zero() {
        let reader = JsonlReader::new(Cursor::new(b""));
        assert_eq!(reader.line_number(), 0);
    }

    #[tokio::test]
    async fn read_value_skips_blank_lines() {
        let mut reader = JsonlReader::new(Cursor::new(b"\n{\"id\":1}\n\n  \n{\"id\":2}\n"));

        assert_eq!(reader.read_value::<Row>().await.unwrap(), Some(Row { id: 1 }));
        assert_eq!(reader.line_number(), 2);
        assert_eq!(reader.read_value::<Row>().await.unwrap(), Some(Row { id: 2 }));
        assert_eq!(reader.line_number(), 5);
        assert_eq!(reader.read_value::<Row>().await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_value_reports_line_of_bad_record() {
        let mut reader = JsonlReader::new(Cursor::new(b"{\"id\":1}\n{oops}\n"));
        reader.read_value::<Row>().await.unwrap();

        let err = reader.read_value::<Row>().await.unwrap_err();
        assert!(matches!(err, Error::Parse { line_number: 2, .. }));
    }

    #[tokio::test]
    async fn resilient_stream_skips_and_records_bad_lines() {
        let collector = WarningCollector::new();
        let reader = JsonlReader::new(Cursor::new(b"{\"id\":1}\nnot json\n{\"id\":3}\n"));

        let rows: Vec<Row> = reader.stream_resilient(collector.clone()).collect().await;

        assert_eq!(rows, vec![Row { id: 1 }, Row { id: 3 }]);
        let warnings = collector.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line_number(), 2);
    }
}

//! Pipeline events and the sinks that receive them.
//!
//! Components never log through a global. Each one is handed a
//! `&dyn EventSink` and reports what happened as a [`PipelineEvent`]; the
//! binary plugs in [`TracingSink`], tests plug in [`RecordingSink`].

use crate::storage::{FailureCategory, StorageKey};
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

/// Severity attached to each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// Everything the pipeline reports while it runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    FetchStarted {
        symbol: String,
        provider: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    FetchCompleted {
        symbol: String,
        rows: usize,
    },
    /// Provider answered but had nothing for the range.
    NoData {
        symbol: String,
    },
    /// Provider error, swallowed into an empty series.
    FetchFailed {
        symbol: String,
        error: String,
    },
    CsvWritten {
        path: PathBuf,
        rows: usize,
    },
    CsvRejected {
        symbol: String,
        reason: String,
    },
    CsvWriteFailed {
        path: PathBuf,
        error: String,
    },
    LocalFileMissing {
        path: PathBuf,
    },
    Uploaded {
        bucket: String,
        key: StorageKey,
    },
    Archived {
        bucket: String,
        source: StorageKey,
        dest: StorageKey,
    },
    UploadFailed {
        category: FailureCategory,
        message: String,
    },
}

impl PipelineEvent {
    pub fn level(&self) -> Level {
        match self {
            PipelineEvent::FetchStarted { .. }
            | PipelineEvent::FetchCompleted { .. }
            | PipelineEvent::CsvWritten { .. }
            | PipelineEvent::Uploaded { .. }
            | PipelineEvent::Archived { .. } => Level::Info,
            PipelineEvent::NoData { .. } | PipelineEvent::CsvRejected { .. } => Level::Warn,
            PipelineEvent::FetchFailed { .. }
            | PipelineEvent::CsvWriteFailed { .. }
            | PipelineEvent::LocalFileMissing { .. }
            | PipelineEvent::UploadFailed { .. } => Level::Error,
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::FetchStarted {
                symbol,
                provider,
                start,
                end,
            } => write!(f, "fetching {symbol} from {provider} ({start} to {end})"),
            PipelineEvent::FetchCompleted { symbol, rows } => {
                write!(f, "fetched {rows} rows for {symbol}")
            }
            PipelineEvent::NoData { symbol } => write!(f, "no data returned for {symbol}"),
            PipelineEvent::FetchFailed { symbol, error } => {
                write!(f, "error fetching data for {symbol}: {error}")
            }
            PipelineEvent::CsvWritten { path, rows } => {
                write!(f, "saved {rows} rows to {}", path.display())
            }
            PipelineEvent::CsvRejected { symbol, reason } => {
                write!(f, "not writing CSV for {symbol}: {reason}")
            }
            PipelineEvent::CsvWriteFailed { path, error } => {
                write!(f, "error saving {}: {error}", path.display())
            }
            PipelineEvent::LocalFileMissing { path } => {
                write!(f, "local file not found: {}", path.display())
            }
            PipelineEvent::Uploaded { bucket, key } => {
                write!(f, "uploaded to s3://{bucket}/{key}")
            }
            PipelineEvent::Archived { bucket, source, dest } => {
                write!(f, "archived s3://{bucket}/{source} to s3://{bucket}/{dest}")
            }
            PipelineEvent::UploadFailed { category, message } => {
                write!(f, "upload failed [{category}]: {message}")
            }
        }
    }
}

/// Receiver for pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match event.level() {
            Level::Info => tracing::info!("{event}"),
            Level::Warn => tracing::warn!("{event}"),
            Level::Error => tracing::error!("{event}"),
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Upload failure categories, in order.
    pub fn failure_categories(&self) -> Vec<FailureCategory> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::UploadFailed { category, .. } => Some(category),
                _ => None,
            })
            .collect()
    }

    pub fn count_at(&self, level: Level) -> usize {
        self.events().iter().filter(|e| e.level() == level).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(PipelineEvent::NoData {
            symbol: "AAPL".into(),
        });
        sink.emit(PipelineEvent::FetchCompleted {
            symbol: "AAPL".into(),
            rows: 3,
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PipelineEvent::NoData { .. }));
        assert_eq!(sink.count_at(Level::Warn), 1);
        assert_eq!(sink.count_at(Level::Info), 1);
    }

    #[test]
    fn upload_failure_display_names_category() {
        let event = PipelineEvent::UploadFailed {
            category: FailureCategory::Credentials,
            message: "AWS credentials not available".into(),
        };
        assert_eq!(event.level(), Level::Error);
        assert_eq!(
            event.to_string(),
            "upload failed [credentials]: AWS credentials not available"
        );
    }

    #[test]
    fn archive_display_uses_both_keys() {
        let event = PipelineEvent::Archived {
            bucket: "b".into(),
            source: StorageKey::new("latest", "x.csv"),
            dest: StorageKey::new("historical/20240102", "x.csv"),
        };
        assert_eq!(
            event.to_string(),
            "archived s3://b/latest/x.csv to s3://b/historical/20240102/x.csv"
        );
    }
}

//! CSV persistence of a fetched price series.
//!
//! Layout: `{output_dir}/{TICKER}_{prefix}_{YYYYmmdd_HHMMSS}.csv`, header
//! `Date,Open,High,Low,Close,Adj Close,Volume`, one row per bar.

use crate::data::PriceSeries;
use crate::events::{EventSink, PipelineEvent};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PREFIX: &str = "latest";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("refusing to write empty price series for {symbol}")]
    EmptySeries { symbol: String },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize CSV {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

/// A CSV file written by [`CsvWriter`]. Left on disk after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvArtifact {
    pub path: PathBuf,
    pub rows: usize,
}

impl CsvArtifact {
    /// Bare file name, used as the object key suffix.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

#[derive(Serialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Adj Close")]
    adj_close: f64,
    #[serde(rename = "Volume")]
    volume: u64,
}

/// File name for a snapshot of `symbol` taken at `now`.
pub fn snapshot_file_name(symbol: &str, prefix: &str, now: NaiveDateTime) -> String {
    format!("{symbol}_{prefix}_{}.csv", now.format(TIMESTAMP_FORMAT))
}

pub struct CsvWriter<'a> {
    output_dir: PathBuf,
    events: &'a dyn EventSink,
}

impl<'a> CsvWriter<'a> {
    pub fn new(output_dir: impl Into<PathBuf>, events: &'a dyn EventSink) -> Self {
        Self {
            output_dir: output_dir.into(),
            events,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `series` stamped with the current local time.
    pub fn write(&self, series: &PriceSeries, prefix: &str) -> Result<CsvArtifact, WriteError> {
        self.write_at(series, prefix, Local::now().naive_local())
    }

    /// Write `series` stamped with `now`. Creates or overwrites the file.
    pub fn write_at(
        &self,
        series: &PriceSeries,
        prefix: &str,
        now: NaiveDateTime,
    ) -> Result<CsvArtifact, WriteError> {
        if series.is_empty() {
            let err = WriteError::EmptySeries {
                symbol: series.symbol().to_string(),
            };
            self.events.emit(PipelineEvent::CsvRejected {
                symbol: series.symbol().to_string(),
                reason: err.to_string(),
            });
            return Err(err);
        }

        let path = self
            .output_dir
            .join(snapshot_file_name(series.symbol(), prefix, now));

        match write_rows(&path, series) {
            Ok(()) => {
                self.events.emit(PipelineEvent::CsvWritten {
                    path: path.clone(),
                    rows: series.len(),
                });
                Ok(CsvArtifact {
                    path,
                    rows: series.len(),
                })
            }
            Err(err) => {
                self.events.emit(PipelineEvent::CsvWriteFailed {
                    path,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }
}

fn write_rows(path: &Path, series: &PriceSeries) -> Result<(), WriteError> {
    let io_err = |source: std::io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source: csv::Error| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = csv::Writer::from_writer(file);

    for bar in series.bars() {
        writer
            .serialize(CsvRow {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                adj_close: bar.adj_close,
                volume: bar.volume,
            })
            .map_err(csv_err)?;
    }

    let mut file = writer.into_inner().map_err(|e| io_err(e.into_error()))?;
    file.flush().map_err(io_err)?;
    Ok(())
}

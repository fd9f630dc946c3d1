//! In-memory fakes shared by the integration tests.

#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use pricevault_core::data::{DataError, DataProvider, DataSource, FetchResult, PriceBar};
use pricevault_core::storage::{ObjectStore, StorageKey, StoreConnector, UploadError};
use pricevault_core::StorageConfig;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Returns exactly `rows` weekday bars starting at `start`.
pub struct FixedProvider {
    pub rows: usize,
}

impl DataProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let bars = start
            .iter_days()
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .take(self.rows)
            .enumerate()
            .map(|(i, date)| {
                let px = 130.0 + i as f64 * 0.25;
                PriceBar {
                    date,
                    open: px,
                    high: px + 1.0,
                    low: px - 1.0,
                    close: px + 0.5,
                    adj_close: px + 0.4,
                    volume: 50_000_000 + i as u64,
                }
            })
            .collect();

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }
}

/// Always fails as if the network were down.
pub struct FailingProvider;

impl DataProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn fetch(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<FetchResult, DataError> {
        Err(DataError::NetworkUnreachable("connection refused".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Put {
        bucket: String,
        key: String,
        bytes: usize,
    },
    Copy {
        bucket: String,
        source: String,
        dest: String,
    },
}

/// Failure to inject into the recorded store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inject {
    Nothing,
    ClientErrorOnPut,
    UnexpectedOnPut,
}

/// Connector whose stores record every operation into a shared log.
pub struct RecordingConnector {
    ops: Arc<Mutex<Vec<StoreOp>>>,
    connects: Arc<Mutex<usize>>,
    inject: Inject,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self::failing_with(Inject::Nothing)
    }

    pub fn failing_with(inject: Inject) -> Self {
        Self {
            ops: Arc::new(Mutex::new(Vec::new())),
            connects: Arc::new(Mutex::new(0)),
            inject,
        }
    }

    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        *self.connects.lock().unwrap()
    }
}

impl StoreConnector for RecordingConnector {
    fn connect(&self, config: &StorageConfig) -> Result<Box<dyn ObjectStore>, UploadError> {
        *self.connects.lock().unwrap() += 1;
        if config.credentials.is_none() {
            return Err(UploadError::MissingCredentials);
        }
        Ok(Box::new(RecordingStore {
            ops: Arc::clone(&self.ops),
            inject: self.inject,
        }))
    }
}

struct RecordingStore {
    ops: Arc<Mutex<Vec<StoreOp>>>,
    inject: Inject,
}

impl ObjectStore for RecordingStore {
    fn put_object(&self, bucket: &str, key: &StorageKey, path: &Path) -> Result<(), UploadError> {
        match self.inject {
            Inject::ClientErrorOnPut => {
                return Err(UploadError::Client {
                    code: "NoSuchBucket".into(),
                    message: "The specified bucket does not exist".into(),
                })
            }
            Inject::UnexpectedOnPut => {
                return Err(UploadError::Unexpected("dispatch failure: io error".into()))
            }
            Inject::Nothing => {}
        }
        let bytes = std::fs::metadata(path).map(|m| m.len() as usize).unwrap_or(0);
        self.ops.lock().unwrap().push(StoreOp::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
            bytes,
        });
        Ok(())
    }

    fn copy_object(
        &self,
        bucket: &str,
        source: &StorageKey,
        dest: &StorageKey,
    ) -> Result<(), UploadError> {
        self.ops.lock().unwrap().push(StoreOp::Copy {
            bucket: bucket.to_string(),
            source: source.to_string(),
            dest: dest.to_string(),
        });
        Ok(())
    }
}

pub fn storage_with_credentials() -> StorageConfig {
    StorageConfig::new("us-east-1", "test-bucket").with_credentials(
        pricevault_core::StaticCredentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG"),
    )
}

pub fn storage_without_credentials() -> StorageConfig {
    StorageConfig::new("us-east-1", "test-bucket")
}

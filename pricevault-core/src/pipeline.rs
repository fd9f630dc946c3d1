//! Single-run pipeline: fetch → CSV → upload (+ archive).
//!
//! Strictly sequential. "No data" and "upload failed" come back as outcomes;
//! only a local write error is returned as `Err`.

use crate::artifact::{CsvArtifact, CsvWriter, WriteError, DEFAULT_PREFIX};
use crate::config::StorageConfig;
use crate::data::{DataFetcher, DataProvider};
use crate::events::EventSink;
use crate::storage::{ObjectStoreUploader, StoreConnector, UploadReceipt, LATEST_FOLDER};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::path::PathBuf;

/// Parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Label embedded in the CSV file name.
    pub prefix: String,
    pub bucket: String,
    /// Destination folder in the bucket; `latest` also archives.
    pub folder: String,
    pub output_dir: PathBuf,
    /// When false the run stops after the CSV is written.
    pub upload: bool,
}

impl PipelineRequest {
    pub fn new(
        symbol: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end,
            prefix: DEFAULT_PREFIX.to_string(),
            bucket: bucket.into(),
            folder: LATEST_FOLDER.to_string(),
            output_dir: PathBuf::from("."),
            upload: true,
        }
    }
}

/// How a run ended, short of a local write error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Provider returned nothing (or failed); no file, no upload.
    NoData,
    /// CSV written, upload skipped on request.
    Written { artifact: CsvArtifact },
    Uploaded {
        artifact: CsvArtifact,
        receipt: UploadReceipt,
    },
    UploadFailed { artifact: CsvArtifact },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            PipelineOutcome::Written { .. } | PipelineOutcome::Uploaded { .. }
        )
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn artifact(&self) -> Option<&CsvArtifact> {
        match self {
            PipelineOutcome::NoData => None,
            PipelineOutcome::Written { artifact }
            | PipelineOutcome::Uploaded { artifact, .. }
            | PipelineOutcome::UploadFailed { artifact } => Some(artifact),
        }
    }
}

pub struct Pipeline<'a> {
    provider: &'a dyn DataProvider,
    connector: &'a dyn StoreConnector,
    storage: StorageConfig,
    events: &'a dyn EventSink,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        provider: &'a dyn DataProvider,
        connector: &'a dyn StoreConnector,
        storage: StorageConfig,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            provider,
            connector,
            storage,
            events,
        }
    }

    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineOutcome, WriteError> {
        self.run_at(request, Local::now().naive_local())
    }

    /// Run with an explicit clock; `now` stamps the file name and its date
    /// picks the archive partition.
    pub fn run_at(
        &self,
        request: &PipelineRequest,
        now: NaiveDateTime,
    ) -> Result<PipelineOutcome, WriteError> {
        let series = DataFetcher::new(self.provider, self.events).fetch(
            &request.symbol,
            request.start,
            request.end,
        );
        if series.is_empty() {
            return Ok(PipelineOutcome::NoData);
        }

        let artifact = CsvWriter::new(&request.output_dir, self.events).write_at(
            &series,
            &request.prefix,
            now,
        )?;

        if !request.upload {
            return Ok(PipelineOutcome::Written { artifact });
        }

        let uploader = ObjectStoreUploader::new(self.storage.clone(), self.connector, self.events);
        let receipt = uploader.upload_at(
            &artifact.path,
            &request.bucket,
            &request.folder,
            now.date(),
        );
        match receipt {
            Some(receipt) => Ok(PipelineOutcome::Uploaded { artifact, receipt }),
            None => Ok(PipelineOutcome::UploadFailed { artifact }),
        }
    }
}

//! Object storage: keys, error categories, the store seam, and the uploader.
//!
//! Retention scheme: every snapshot lands under `latest/`, and anything
//! uploaded to `latest/` is then copied server-side to
//! `historical/{yyyymmdd}/`. The copy only happens after the upload succeeded.

mod key;
pub mod s3;
mod uploader;

pub use key::{StorageKey, HISTORICAL_FOLDER, LATEST_FOLDER};
pub use s3::{S3Connector, S3Store};
pub use uploader::{ObjectStoreUploader, UploadReceipt};

use crate::config::StorageConfig;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Why an upload failed. All variants collapse to `false` at the uploader
/// surface; the category is what gets reported.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("AWS credentials not available")]
    MissingCredentials,

    #[error("client error ({code}): {message}")]
    Client { code: String, message: String },

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl UploadError {
    pub fn category(&self) -> FailureCategory {
        match self {
            UploadError::MissingCredentials => FailureCategory::Credentials,
            UploadError::Client { .. } => FailureCategory::Client,
            UploadError::Unexpected(_) => FailureCategory::Unexpected,
        }
    }
}

/// Reported category of an upload failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    Credentials,
    Client,
    Unexpected,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureCategory::Credentials => "credentials",
            FailureCategory::Client => "client",
            FailureCategory::Unexpected => "unexpected",
        })
    }
}

/// The two object operations the uploader needs.
pub trait ObjectStore {
    /// Upload the local file at `path` to `bucket/key`.
    fn put_object(&self, bucket: &str, key: &StorageKey, path: &Path) -> Result<(), UploadError>;

    /// Server-side copy of `bucket/source` to `bucket/dest`.
    fn copy_object(
        &self,
        bucket: &str,
        source: &StorageKey,
        dest: &StorageKey,
    ) -> Result<(), UploadError>;
}

/// Builds an [`ObjectStore`] client from explicit configuration.
pub trait StoreConnector {
    fn connect(&self, config: &StorageConfig) -> Result<Box<dyn ObjectStore>, UploadError>;
}

use super::{StorageKey, StoreConnector, UploadError, LATEST_FOLDER};
use crate::config::StorageConfig;
use crate::events::{EventSink, PipelineEvent};
use chrono::{Local, NaiveDate};
use std::path::Path;

/// Keys written by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: StorageKey,
    /// Set only when the upload went to `latest/`.
    pub archived: Option<StorageKey>,
}

/// Uploads a local file and, for `latest/`, archives it under `historical/`.
pub struct ObjectStoreUploader<'a> {
    config: StorageConfig,
    connector: &'a dyn StoreConnector,
    events: &'a dyn EventSink,
}

impl<'a> ObjectStoreUploader<'a> {
    pub fn new(
        config: StorageConfig,
        connector: &'a dyn StoreConnector,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            config,
            connector,
            events,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Upload `path` to `bucket` under `folder`. True only if the upload, and
    /// the archive copy when `folder` is `latest`, both succeeded.
    pub fn upload(&self, path: &Path, bucket: &str, folder: &str) -> bool {
        self.upload_at(path, bucket, folder, Local::now().date_naive())
            .is_some()
    }

    /// Like [`upload`](Self::upload), archiving under `today`'s partition and
    /// returning the written keys.
    pub fn upload_at(
        &self,
        path: &Path,
        bucket: &str,
        folder: &str,
        today: NaiveDate,
    ) -> Option<UploadReceipt> {
        if !path.exists() {
            self.events.emit(PipelineEvent::LocalFileMissing {
                path: path.to_path_buf(),
            });
            return None;
        }

        match self.try_upload(path, bucket, folder, today) {
            Ok(receipt) => Some(receipt),
            Err(err) => {
                self.events.emit(PipelineEvent::UploadFailed {
                    category: err.category(),
                    message: err.to_string(),
                });
                None
            }
        }
    }

    fn try_upload(
        &self,
        path: &Path,
        bucket: &str,
        folder: &str,
        today: NaiveDate,
    ) -> Result<UploadReceipt, UploadError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                UploadError::Unexpected(format!("no usable file name in {}", path.display()))
            })?;

        let store = self.connector.connect(&self.config)?;

        let key = StorageKey::new(folder, file_name);
        store.put_object(bucket, &key, path)?;
        self.events.emit(PipelineEvent::Uploaded {
            bucket: bucket.to_string(),
            key: key.clone(),
        });

        let archived = if folder == LATEST_FOLDER {
            let dest = StorageKey::historical(today, file_name);
            store.copy_object(bucket, &key, &dest)?;
            self.events.emit(PipelineEvent::Archived {
                bucket: bucket.to_string(),
                source: key.clone(),
                dest: dest.clone(),
            });
            Some(dest)
        } else {
            None
        };

        Ok(UploadReceipt {
            bucket: bucket.to_string(),
            key,
            archived,
        })
    }
}

//! PriceVault Core: daily price snapshots from a market-data provider to
//! object storage.
//!
//! One run fetches one ticker, writes it to a timestamped CSV, uploads the
//! file under `latest/` and archives a server-side copy under
//! `historical/{yyyymmdd}/`:
//! - Market-data providers (Yahoo Finance, synthetic)
//! - CSV writer with empty-series guard
//! - Object-store uploader with an S3 backend
//! - Injected event sinks for logging

pub mod artifact;
pub mod config;
pub mod data;
pub mod events;
pub mod pipeline;
pub mod storage;

pub use artifact::{CsvArtifact, CsvWriter, WriteError};
pub use config::{StaticCredentials, StorageConfig};
pub use data::{DataFetcher, DataProvider, PriceBar, PriceSeries};
pub use events::{EventSink, PipelineEvent, RecordingSink, TracingSink};
pub use pipeline::{Pipeline, PipelineOutcome, PipelineRequest};
pub use storage::{ObjectStoreUploader, S3Connector, StorageKey, StoreConnector, UploadError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the values handed between stages are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<CsvArtifact>();
        require_sync::<CsvArtifact>();
        require_send::<StorageConfig>();
        require_sync::<StorageConfig>();
        require_send::<PipelineEvent>();
        require_sync::<PipelineEvent>();
        require_send::<RecordingSink>();
        require_sync::<RecordingSink>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
    }
}

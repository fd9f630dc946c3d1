//! Amazon S3 (and S3-compatible) backend.
//!
//! The AWS SDK is async; each store owns a current-thread tokio runtime and
//! blocks on every call so the rest of the crate stays synchronous.

use super::{ObjectStore, StorageKey, StoreConnector, UploadError};
use crate::config::StorageConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Debug;
use std::path::Path;
use tokio::runtime::Runtime;

const CREDENTIALS_PROVIDER: &str = "pricevault";

/// Everything but unreserved characters and the path separator.
const COPY_SOURCE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// `x-amz-copy-source` value; S3 URL-decodes it, so the key is encoded.
fn copy_source(bucket: &str, key: &StorageKey) -> String {
    format!("{bucket}/{}", utf8_percent_encode(key.as_str(), COPY_SOURCE))
}

/// Connects to S3 with the static credentials in [`StorageConfig`].
#[derive(Debug, Default, Clone, Copy)]
pub struct S3Connector;

impl StoreConnector for S3Connector {
    fn connect(&self, config: &StorageConfig) -> Result<Box<dyn ObjectStore>, UploadError> {
        Ok(Box::new(S3Store::new(config)?))
    }
}

pub struct S3Store {
    client: Client,
    runtime: Runtime,
}

impl S3Store {
    pub fn new(config: &StorageConfig) -> Result<Self, UploadError> {
        let creds = config
            .credentials
            .as_ref()
            .ok_or(UploadError::MissingCredentials)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| UploadError::Unexpected(format!("failed to start runtime: {e}")))?;

        let credentials = Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            creds.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        let client = {
            let _guard = runtime.enter();
            Client::from_conf(builder.build())
        };

        Ok(Self { client, runtime })
    }
}

impl ObjectStore for S3Store {
    fn put_object(&self, bucket: &str, key: &StorageKey, path: &Path) -> Result<(), UploadError> {
        let body = std::fs::read(path).map_err(|e| {
            UploadError::Unexpected(format!("failed to read {}: {e}", path.display()))
        })?;

        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(bucket)
                    .key(key.as_str())
                    .content_type("text/csv")
                    .body(ByteStream::from(body))
                    .send(),
            )
            .map_err(classify)?;
        Ok(())
    }

    fn copy_object(
        &self,
        bucket: &str,
        source: &StorageKey,
        dest: &StorageKey,
    ) -> Result<(), UploadError> {
        self.runtime
            .block_on(
                self.client
                    .copy_object()
                    .bucket(bucket)
                    .copy_source(copy_source(bucket, source))
                    .key(dest.as_str())
                    .send(),
            )
            .map_err(classify)?;
        Ok(())
    }
}

/// Service-reported errors are client errors; everything else (dispatch,
/// timeouts, response parsing) is unexpected.
fn classify<E, R>(err: SdkError<E, R>) -> UploadError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            let service_err = ctx.err();
            UploadError::Client {
                code: service_err.code().unwrap_or("Unknown").to_string(),
                message: service_err
                    .message()
                    .unwrap_or("no message in error response")
                    .to_string(),
            }
        }
        _ => UploadError::Unexpected(DisplayErrorContext(&err).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticCredentials;
    use crate::storage::FailureCategory;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::put_object::PutObjectError;

    #[test]
    fn connector_without_credentials_fails_before_building_a_client() {
        let config = StorageConfig::new("us-east-1", "bucket");
        let err = S3Connector.connect(&config).err().unwrap();
        assert!(matches!(err, UploadError::MissingCredentials));
    }

    #[test]
    fn connector_with_credentials_builds_a_store() {
        let config = StorageConfig::new("eu-west-1", "bucket")
            .with_credentials(StaticCredentials::new("AKIDEXAMPLE", "secret"))
            .with_endpoint("http://127.0.0.1:9000");
        assert!(S3Connector.connect(&config).is_ok());
    }

    #[test]
    fn copy_source_encodes_key_but_keeps_separators() {
        let key = StorageKey::new("latest", "BRK B%20_latest_20240105_063000.csv");
        assert_eq!(
            copy_source("prices", &key),
            "prices/latest/BRK%20B%2520_latest_20240105_063000.csv"
        );

        let key = StorageKey::new("historical/20240105", "EURUSD=X_latest.csv");
        assert_eq!(
            copy_source("prices", &key),
            "prices/historical/20240105/EURUSD%3DX_latest.csv"
        );
    }

    #[test]
    fn plain_keys_pass_through_unchanged() {
        let key = StorageKey::new("latest", "AAPL_latest_20240105_063000.csv");
        assert_eq!(
            copy_source("prices", &key),
            "prices/latest/AAPL_latest_20240105_063000.csv"
        );
    }

    #[test]
    fn service_error_is_a_client_error_with_its_message() {
        let meta = ErrorMetadata::builder()
            .code("NoSuchBucket")
            .message("The specified bucket does not exist")
            .build();
        let err: SdkError<PutObjectError, ()> =
            SdkError::service_error(PutObjectError::generic(meta), ());

        let classified = classify(err);

        assert_eq!(classified.category(), FailureCategory::Client);
        match classified {
            UploadError::Client { code, message } => {
                assert_eq!(code, "NoSuchBucket");
                assert_eq!(message, "The specified bucket does not exist");
            }
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[test]
    fn service_error_without_metadata_still_counts_as_client() {
        let meta = ErrorMetadata::builder().build();
        let err: SdkError<PutObjectError, ()> =
            SdkError::service_error(PutObjectError::generic(meta), ());

        match classify(err) {
            UploadError::Client { code, message } => {
                assert_eq!(code, "Unknown");
                assert_eq!(message, "no message in error response");
            }
            other => panic!("expected client error, got {other:?}"),
        }
    }

    #[test]
    fn timeout_and_construction_failures_are_unexpected() {
        let timeout: SdkError<PutObjectError, ()> = SdkError::timeout_error("request timed out");
        assert_eq!(classify(timeout).category(), FailureCategory::Unexpected);

        let construction: SdkError<PutObjectError, ()> =
            SdkError::construction_failure("bad request input");
        let classified = classify(construction);
        assert_eq!(classified.category(), FailureCategory::Unexpected);
        assert!(classified.to_string().contains("bad request input"));
    }
}

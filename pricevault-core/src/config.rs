//! Object-storage configuration.
//!
//! The uploader only ever sees an explicit [`StorageConfig`]. Reading the
//! process environment happens once, in the binary, through
//! [`StorageConfig::from_env`].

use std::fmt;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_BUCKET: &str = "your-bucket-name";

pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_BUCKET: &str = "AWS_S3_BUCKET";
pub const ENV_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";

/// Long-lived access key pair, optionally with a session token.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl StaticCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// `None` when no access key pair was supplied.
    pub credentials: Option<StaticCredentials>,
    pub region: String,
    pub bucket: String,
    /// Custom endpoint for S3-compatible services.
    pub endpoint_url: Option<String>,
}

impl StorageConfig {
    pub fn new(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            credentials: None,
            region: region.into(),
            bucket: bucket.into(),
            endpoint_url: None,
        }
    }

    pub fn with_credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_endpoint(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Build from a variable lookup. Blank values count as unset; credentials
    /// need both the key id and the secret.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let credentials = match (get(ENV_ACCESS_KEY_ID), get(ENV_SECRET_ACCESS_KEY)) {
            (Some(id), Some(secret)) => Some(StaticCredentials {
                access_key_id: id,
                secret_access_key: secret,
                session_token: get(ENV_SESSION_TOKEN),
            }),
            _ => None,
        };

        Self {
            credentials,
            region: get(ENV_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bucket: get(ENV_BUCKET).unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            endpoint_url: get(ENV_ENDPOINT_URL),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

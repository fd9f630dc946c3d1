use chrono::NaiveDate;
use std::fmt;

pub const LATEST_FOLDER: &str = "latest";
pub const HISTORICAL_FOLDER: &str = "historical";

/// Object key of the form `{prefix}/{file_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(prefix: &str, file_name: &str) -> Self {
        Self(format!("{}/{file_name}", prefix.trim_end_matches('/')))
    }

    /// `historical/{yyyymmdd}/{file_name}`
    pub fn historical(date: NaiveDate, file_name: &str) -> Self {
        Self::new(
            &format!("{HISTORICAL_FOLDER}/{}", date.format("%Y%m%d")),
            file_name,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

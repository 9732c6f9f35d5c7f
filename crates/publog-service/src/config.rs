//! Service configuration types.

use std::path::PathBuf;

use publog_store::CsvOptions;
use serde::Deserialize;

/// Configuration for the dataset service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Root directory of the flat-file datasets.
    #[serde(default = "ServiceConfig::default_data_dir")]
    pub data_dir: PathBuf,

    /// Path of the embedded database file.
    #[serde(default = "ServiceConfig::default_db_path")]
    pub db_path: PathBuf,

    /// Records sampled per file for column type inference.
    #[serde(default = "ServiceConfig::default_sample_size")]
    pub sample_size: usize,

    /// Page size used when a caller does not give one.
    #[serde(default = "ServiceConfig::default_page_size")]
    pub default_page_size: i64,

    /// Upper bound on any caller-supplied limit.
    #[serde(default = "ServiceConfig::default_max_search_results")]
    pub max_search_results: i64,

    /// Fixed cap on classification search results.
    #[serde(default = "ServiceConfig::default_classification_cap")]
    pub classification_search_cap: i64,
}

impl ServiceConfig {
    fn default_data_dir() -> PathBuf {
        PathBuf::from("../Data")
    }

    fn default_db_path() -> PathBuf {
        PathBuf::from("/tmp/publog_index.sqlite")
    }

    const fn default_sample_size() -> usize {
        10_000
    }

    const fn default_page_size() -> i64 {
        50
    }

    const fn default_max_search_results() -> i64 {
        1000
    }

    const fn default_classification_cap() -> i64 {
        100
    }

    /// CSV options derived from this configuration.
    #[must_use]
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions::with_sample_size(self.sample_size)
    }

    /// The query limits derived from this configuration.
    #[must_use]
    pub const fn limits(&self) -> Limits {
        Limits {
            default_page_size: self.default_page_size,
            max_search_results: self.max_search_results,
            classification_search_cap: self.classification_search_cap,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: Self::default_data_dir(),
            db_path: Self::default_db_path(),
            sample_size: Self::default_sample_size(),
            default_page_size: Self::default_page_size(),
            max_search_results: Self::default_max_search_results(),
            classification_search_cap: Self::default_classification_cap(),
        }
    }
}

/// Result-size limits shared by the query services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Page size used when a caller does not give one.
    pub default_page_size: i64,
    /// Upper bound on any caller-supplied limit.
    pub max_search_results: i64,
    /// Fixed cap on classification search results.
    pub classification_search_cap: i64,
}

impl Default for Limits {
    fn default() -> Self {
        ServiceConfig::default().limits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("../Data"));
        assert_eq!(config.db_path, PathBuf::from("/tmp/publog_index.sqlite"));
        assert_eq!(config.sample_size, 10_000);
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.max_search_results, 1000);
        assert_eq!(config.classification_search_cap, 100);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"data_dir": "/srv/publog", "sample_size": 500}"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/publog"));
        assert_eq!(config.csv_options().sample_size, 500);
        assert_eq!(config.limits(), Limits::default());
    }
}

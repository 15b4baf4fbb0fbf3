use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use breedflow_utils::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.thedogapi.com/v1";
pub const DEFAULT_API_ENDPOINT: &str = "breeds";
pub const DEFAULT_DATASET_NAME: &str = "dog_breeds_raw";
pub const DEFAULT_PIPELINE_NAME: &str = "dog_breeds_pipeline";
pub const DEFAULT_TABLE_NAME: &str = "dog_breeds_resource";
pub const DEFAULT_BIGQUERY_LOCATION: &str = "US";

/// Where the breed table is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationKind {
    BigQuery,
    Sqlite,
    ArrowIpc,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::BigQuery => "bigquery",
            DestinationKind::Sqlite => "sqlite",
            DestinationKind::ArrowIpc => "arrow",
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DestinationKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bigquery" => Ok(DestinationKind::BigQuery),
            "sqlite" => Ok(DestinationKind::Sqlite),
            "arrow" | "arrow_ipc" => Ok(DestinationKind::ArrowIpc),
            _ => Err(ConfigError::UnknownDestination(s.to_string())),
        }
    }
}

/// Settings for one pipeline run.
///
/// Built once at process entry by [`crate::config::loader`] and passed by
/// reference to everything else; nothing downstream reads the environment.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api_base_url: String,
    pub api_endpoint: String,
    pub dataset_name: String,
    pub project_id: Option<String>,
    /// Absolute path of a service account key file that was checked to exist.
    pub credentials_path: Option<PathBuf>,
    pub pipeline_name: String,
    pub table_name: String,
    pub destination: DestinationKind,
    /// Absolute directory used by the file-backed destinations.
    pub destination_path: PathBuf,
    pub bigquery_location: String,
}

impl PipelineConfig {
    /// Base URL and endpoint joined by exactly one `/`.
    pub fn full_api_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.api_endpoint.trim_start_matches('/')
        )
    }
}

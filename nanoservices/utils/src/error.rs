use std::path::PathBuf;

use thiserror::Error;
use reqwest::Error as ReqwestError;
use reqwest::StatusCode;
use tokio::io::Error as TokioIoError;
use arrow::error::ArrowError;
use url::ParseError;

/// Failures raised while resolving the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(".env file not found at: {path}. Project root: {project_root}")]
    EnvFileNotFound { path: PathBuf, project_root: PathBuf },

    #[error("failed to read .env file at {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error(
        "service account key file not found at: {path}. \
         Check CREDENTIALS_PATH. Project root: {project_root}"
    )]
    CredentialsNotFound { path: PathBuf, project_root: PathBuf },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("invalid API url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: ParseError,
    },

    #[error("unknown destination `{0}` (expected bigquery, sqlite or arrow)")]
    UnknownDestination(String),

    #[error("no project id: set PROJECT_ID or use a service account key file")]
    MissingProjectId,

    #[error("failed to resolve path: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Reqwest Error: {0}")]
    Http(#[from] ReqwestError),

    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: StatusCode },

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO Error: {0}")]
    Io(#[from] TokioIoError),

    #[error("SQLite Error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Arrow Error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Url Error: {0}")]
    UrlParse(#[from] ParseError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("warehouse load failed: {0}")]
    Warehouse(String),

    #[error("pipeline build failed: {0}")]
    Build(String),
}

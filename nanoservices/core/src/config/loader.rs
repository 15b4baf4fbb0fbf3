use std::collections::HashMap;
use std::path::{Path, PathBuf};

use url::Url;

pub use breedflow_utils::error::ConfigError;

use crate::config::types::{
    DestinationKind, PipelineConfig, DEFAULT_API_BASE_URL, DEFAULT_API_ENDPOINT,
    DEFAULT_BIGQUERY_LOCATION, DEFAULT_DATASET_NAME, DEFAULT_PIPELINE_NAME, DEFAULT_TABLE_NAME,
};

/// Each setting is read under its own name first, then under its legacy
/// Google Cloud name.
const API_BASE_URL: (&str, Option<&str>) = ("API_BASE_URL", Some("DOG_API_BASE_URL"));
const API_ENDPOINT: (&str, Option<&str>) = ("API_ENDPOINT", Some("DOG_API_ENDPOINT"));
const DATASET_NAME: (&str, Option<&str>) = ("DATASET_NAME", Some("BIGQUERY_DATASET"));
const PROJECT_ID: (&str, Option<&str>) = ("PROJECT_ID", Some("GCP_PROJECT_ID"));
const CREDENTIALS_PATH: (&str, Option<&str>) =
    ("CREDENTIALS_PATH", Some("GOOGLE_APPLICATION_CREDENTIALS"));
const PIPELINE_NAME: (&str, Option<&str>) = ("PIPELINE_NAME", None);
const TABLE_NAME: (&str, Option<&str>) = ("TABLE_NAME", None);
const DESTINATION: (&str, Option<&str>) = ("DESTINATION", None);
const DESTINATION_PATH: (&str, Option<&str>) = ("DESTINATION_PATH", None);
const BIGQUERY_LOCATION: (&str, Option<&str>) = ("BIGQUERY_LOCATION", None);

/// Load the run configuration from the process environment and a `.env` file.
///
/// `env_file` defaults to `<project_root>/.env`.
pub fn load_config(
    env_file: Option<&Path>,
    project_root: &Path,
) -> Result<PipelineConfig, ConfigError> {
    load_config_with(|key| std::env::var(key).ok(), env_file, project_root)
}

/// Same as [`load_config`] but with the process environment supplied as a
/// lookup function.
///
/// Values from `process_env` win over values in the `.env` file. The file may
/// only be missing when a project id is already present in `process_env`,
/// which is how the pipeline runs inside a container.
pub fn load_config_with<F>(
    process_env: F,
    env_file: Option<&Path>,
    project_root: &Path,
) -> Result<PipelineConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let project_root = absolute(project_root)?;
    tracing::info!(project_root = %project_root.display(), "resolved project root");

    let dotenv_path = match env_file {
        Some(path) => absolute(path)?,
        None => project_root.join(".env"),
    };
    tracing::info!(path = %dotenv_path.display(), exists = dotenv_path.exists(), "looking for .env");

    let file_vars = if dotenv_path.exists() {
        let vars = read_env_file(&dotenv_path)?;
        tracing::info!(path = %dotenv_path.display(), "loaded .env");
        vars
    } else if lookup(&process_env, PROJECT_ID).is_some() {
        tracing::info!("no .env file found, but a project id is set in the environment (likely running in a container)");
        HashMap::new()
    } else {
        return Err(ConfigError::EnvFileNotFound {
            path: dotenv_path,
            project_root,
        });
    };

    from_vars(
        |key: &str| process_env(key).or_else(|| file_vars.get(key).cloned()),
        &project_root,
    )
}

/// Build a [`PipelineConfig`] from already merged variables.
pub fn from_vars<F>(vars: F, project_root: &Path) -> Result<PipelineConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_base_url = required(&vars, API_BASE_URL, DEFAULT_API_BASE_URL)?;
    let api_endpoint = required(&vars, API_ENDPOINT, DEFAULT_API_ENDPOINT)?;
    let dataset_name = required(&vars, DATASET_NAME, DEFAULT_DATASET_NAME)?;
    let pipeline_name = required(&vars, PIPELINE_NAME, DEFAULT_PIPELINE_NAME)?;
    let table_name = required(&vars, TABLE_NAME, DEFAULT_TABLE_NAME)?;
    let bigquery_location = required(&vars, BIGQUERY_LOCATION, DEFAULT_BIGQUERY_LOCATION)?;
    let project_id = lookup(&vars, PROJECT_ID);

    let destination = match lookup(&vars, DESTINATION) {
        Some(name) => name.parse::<DestinationKind>()?,
        None => DestinationKind::BigQuery,
    };

    let destination_path = match lookup(&vars, DESTINATION_PATH) {
        Some(path) => project_root.join(path),
        None => project_root.to_path_buf(),
    };

    let credentials_path = match lookup(&vars, CREDENTIALS_PATH) {
        Some(raw) => Some(resolve_credentials(&raw, project_root)?),
        None => None,
    };

    let config = PipelineConfig {
        api_base_url,
        api_endpoint,
        dataset_name,
        project_id,
        credentials_path,
        pipeline_name,
        table_name,
        destination,
        destination_path,
        bigquery_location,
    };

    let url = config.full_api_url();
    Url::parse(&url).map_err(|source| ConfigError::InvalidUrl { url, source })?;

    Ok(config)
}

fn lookup<F>(vars: &F, (name, fallback): (&str, Option<&str>)) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    vars(name)
        .or_else(|| fallback.and_then(|f| vars(f)))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(
    vars: &F,
    key: (&'static str, Option<&str>),
    default: &str,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(vars, key).unwrap_or_else(|| default.to_string());
    if value.trim_matches('/').is_empty() {
        return Err(ConfigError::Empty(key.0));
    }
    Ok(value)
}

fn resolve_credentials(raw: &str, project_root: &Path) -> Result<PathBuf, ConfigError> {
    let path = PathBuf::from(raw);
    tracing::info!(path = %path.display(), "found credentials path");
    let resolved = if path.is_absolute() {
        path
    } else {
        let joined = project_root.join(&path);
        tracing::info!(path = %joined.display(), "converting credentials path to absolute");
        joined
    };

    if !resolved.exists() {
        return Err(ConfigError::CredentialsNotFound {
            path: resolved,
            project_root: project_root.to_path_buf(),
        });
    }
    Ok(resolved.canonicalize()?)
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_file_error = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };
    let mut vars = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(env_file_error)? {
        let (key, value) = item.map_err(env_file_error)?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

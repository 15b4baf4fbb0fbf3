use std::fmt;
use std::path::Path;

use breedflow_utils::error::Error;
use breedflow_utils::BreedFlowResult;

use crate::builder::PipelineBuilder;
use crate::config::{load_config, DestinationKind, PipelineConfig};
use crate::destinations::bigquery::auth::{Credentials, ServiceAccountKey};
use crate::destinations::{ArrowIpcDestination, BigQueryDestination, Destination, SqliteDestination};
use crate::sources::BreedsResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => f.write_str("success"),
            RunStatus::Failure => f.write_str("failure"),
        }
    }
}

/// What a finished run hands back to its caller.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: RunStatus,
    /// Human-readable load summary.
    pub summary: String,
    pub dataset: String,
}

/// Load the configuration, then [`run_pipeline`]. This is the command-line entry.
pub async fn run_from_environment(
    env_file: Option<&Path>,
    project_root: &Path,
) -> BreedFlowResult<RunResult> {
    let config = match load_config(env_file, project_root) {
        Ok(config) => config,
        Err(e) => {
            let err = Error::from(e);
            tracing::error!(error = %err, "pipeline execution failed");
            return Err(err);
        }
    };
    run_pipeline(&config).await
}

/// Run the breed pipeline once against the configured destination.
///
/// Errors are logged here with their context and returned unchanged.
pub async fn run_pipeline(config: &PipelineConfig) -> BreedFlowResult<RunResult> {
    match execute(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            tracing::error!(error = %e, details = ?e, "pipeline execution failed");
            Err(e)
        }
    }
}

async fn execute(config: &PipelineConfig) -> BreedFlowResult<RunResult> {
    tracing::info!(pipeline = %config.pipeline_name, "starting dog breeds data pipeline");
    tracing::info!(
        dataset = %config.dataset_name,
        project = ?config.project_id,
        destination = %config.destination,
        "configuration loaded"
    );

    let destination = destination_from_config(config)?;
    tracing::info!(dataset = %config.dataset_name, "pipeline will create the dataset if it does not exist");

    let url = config.full_api_url();
    tracing::info!(url = %url, "fetching data from");
    let pipeline = PipelineBuilder::new(&config.pipeline_name)
        .resource(BreedsResource::new(url).with_name(&config.table_name))
        .boxed_destination(destination)
        .build()?;

    tracing::info!("running pipeline");
    let info = pipeline.run().await?;
    tracing::info!(rows = info.rows, load_id = %info.load_id, "pipeline execution completed successfully");
    tracing::info!("load info:\n{info}");

    Ok(RunResult {
        status: RunStatus::Success,
        summary: info.to_string(),
        dataset: config.dataset_name.clone(),
    })
}

/// The bulk loader `config` asks for, with credentials materialised.
pub fn destination_from_config(config: &PipelineConfig) -> BreedFlowResult<Box<dyn Destination>> {
    let destination: Box<dyn Destination> = match config.destination {
        DestinationKind::BigQuery => {
            let credentials = match &config.credentials_path {
                Some(path) => {
                    tracing::info!(path = %path.display(), "using BigQuery credentials from key file");
                    Credentials::ServiceAccount(ServiceAccountKey::from_file(path)?)
                }
                None => {
                    tracing::info!("using application default BigQuery credentials");
                    Credentials::application_default()?
                }
            };
            Box::new(BigQueryDestination::new(
                &config.dataset_name,
                config.project_id.clone(),
                &config.bigquery_location,
                credentials,
            )?)
        }
        DestinationKind::Sqlite => Box::new(SqliteDestination::new(
            &config.dataset_name,
            &config.destination_path,
        )),
        DestinationKind::ArrowIpc => Box::new(ArrowIpcDestination::new(
            &config.dataset_name,
            &config.destination_path,
        )),
    };
    Ok(destination)
}

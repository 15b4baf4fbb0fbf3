//! BigQuery bulk loader.
//!
//! A replace is one load job with `WRITE_TRUNCATE`: BigQuery swaps the table
//! contents atomically when the job succeeds and leaves them alone when it fails.

pub mod auth;
pub mod job;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;
use breedflow_utils::error::{ConfigError, Error};
use breedflow_utils::BreedFlowResult;

use crate::schema::TableSchema;
use crate::sources::ResourceRows;
use super::{Destination, TableLoad};
use auth::Credentials;
use job::{JobResource, LoadTarget};

pub const DEFAULT_API_ROOT: &str = "https://bigquery.googleapis.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Longest we wait for a submitted job to reach `DONE`.
const JOB_TIMEOUT: Duration = Duration::from_secs(600);

pub struct BigQueryDestination {
    dataset: String,
    project_id: String,
    location: String,
    credentials: Credentials,
    api_root: String,
    client: ReqwestClient,
}

impl BigQueryDestination {
    /// `project_id` falls back to the key file's project; ambient credentials
    /// need it set explicitly.
    pub fn new(
        dataset: impl Into<String>,
        project_id: Option<String>,
        location: impl Into<String>,
        credentials: Credentials,
    ) -> BreedFlowResult<Self> {
        let project_id = project_id
            .or_else(|| credentials.project_id().map(str::to_string))
            .ok_or(ConfigError::MissingProjectId)?;
        let client = ReqwestClient::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            dataset: dataset.into(),
            project_id,
            location: location.into(),
            credentials,
            api_root: DEFAULT_API_ROOT.to_string(),
            client,
        })
    }

    /// Point the loader at another API root, such as an emulator.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into().trim_end_matches('/').to_string();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn projects_url(&self) -> String {
        format!("{}/bigquery/v2/projects/{}", self.api_root, self.project_id)
    }

    async fn ensure_dataset(&self, token: &str) -> BreedFlowResult<()> {
        let url = format!("{}/datasets/{}", self.projects_url(), self.dataset);
        let resp = self.client.get(&url).bearer_auth(token).send().await?;
        match resp.status() {
            status if status.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            status => return Err(warehouse_error(&url, status, resp).await),
        }

        tracing::info!(dataset = %self.dataset, location = %self.location, "creating dataset");
        let url = format!("{}/datasets", self.projects_url());
        let body = json!({
            "datasetReference": { "projectId": self.project_id, "datasetId": self.dataset },
            "location": self.location,
        });
        let resp = self.client.post(&url).bearer_auth(token).json(&body).send().await?;
        match resp.status() {
            // Someone else created it in between.
            status if status.is_success() || status == StatusCode::CONFLICT => Ok(()),
            status => Err(warehouse_error(&url, status, resp).await),
        }
    }

    async fn wait_for_job(&self, token: &str, mut job: JobResource, job_id: &str) -> BreedFlowResult<JobResource> {
        let url = format!("{}/jobs/{}", self.projects_url(), job_id);
        let started = Instant::now();
        while !job.is_done() {
            if started.elapsed() > JOB_TIMEOUT {
                return Err(Error::Warehouse(format!(
                    "load job {job_id} did not finish within {}s",
                    JOB_TIMEOUT.as_secs()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            tracing::debug!(job_id, state = %job.status.state, "waiting for load job");
            let req = self
                .client
                .get(&url)
                .query(&[("location", self.location.as_str())])
                .bearer_auth(token);
            job = send_json(req).await?;
        }

        match job.failure() {
            Some(message) => Err(Error::Warehouse(format!("load job {job_id} failed: {message}"))),
            None => Ok(job),
        }
    }
}

#[async_trait]
impl Destination for BigQueryDestination {
    fn name(&self) -> &str { "bigquery" }

    fn dataset(&self) -> &str { &self.dataset }

    async fn replace_table(
        &self,
        load_id: &str,
        schema: &TableSchema,
        rows: ResourceRows,
    ) -> BreedFlowResult<TableLoad> {
        let token = self.credentials.access_token(&self.client).await?;
        self.ensure_dataset(&token).await?;

        let (data, count) = job::ndjson_body(rows)?;
        let job_id = format!("{}_{}", schema.name, load_id.replace('-', "_"));
        let target = LoadTarget {
            project_id: &self.project_id,
            dataset: &self.dataset,
            location: &self.location,
            job_id: &job_id,
        };
        let metadata = job::load_job_config(&target, schema);
        let boundary = format!("breedflow_{}", Uuid::new_v4().simple());
        let body = job::multipart_related(&metadata, &data, &boundary);

        tracing::info!(
            job_id = %job_id,
            table = %schema.name,
            rows = count,
            bytes = data.len(),
            "submitting load job"
        );
        let url = format!(
            "{}/upload/bigquery/v2/projects/{}/jobs",
            self.api_root, self.project_id
        );
        let req = self
            .client
            .post(&url)
            .query(&[("uploadType", "multipart")])
            .bearer_auth(&token)
            .header(CONTENT_TYPE, format!("multipart/related; boundary={boundary}"))
            .body(body);
        let submitted: JobResource = send_json(req).await?;

        let finished = self.wait_for_job(&token, submitted, &job_id).await?;
        let rows = finished
            .output_rows()
            .map(|n| n as usize)
            .unwrap_or(count);

        Ok(TableLoad {
            table: format!("{}.{}.{}", self.project_id, self.dataset, schema.name),
            rows,
            location: self.location.clone(),
        })
    }
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> BreedFlowResult<T> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let url = resp.url().to_string();
        return Err(warehouse_error(&url, status, resp).await);
    }
    let body = resp.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn warehouse_error(url: &str, status: StatusCode, resp: reqwest::Response) -> Error {
    let body = resp.text().await.unwrap_or_default();
    Error::Warehouse(format!("{status} from {url}: {body}"))
}

//! Request and response shapes of the BigQuery load-job API.

use serde::Deserialize;
use serde_json::{json, Value};
use breedflow_utils::{BreedFlowResult, BreedRow};

use crate::schema::{TableSchema, WriteDisposition};

/// Target of one load job.
#[derive(Debug, Clone)]
pub struct LoadTarget<'a> {
    pub project_id: &'a str,
    pub dataset: &'a str,
    pub location: &'a str,
    pub job_id: &'a str,
}

fn write_disposition(disposition: WriteDisposition) -> &'static str {
    match disposition {
        WriteDisposition::Replace => "WRITE_TRUNCATE",
    }
}

/// Job resource for a newline-delimited JSON load with an explicit schema.
pub fn load_job_config(target: &LoadTarget<'_>, schema: &TableSchema) -> Value {
    json!({
        "jobReference": {
            "projectId": target.project_id,
            "jobId": target.job_id,
            "location": target.location,
        },
        "configuration": {
            "load": {
                "destinationTable": {
                    "projectId": target.project_id,
                    "datasetId": target.dataset,
                    "tableId": schema.name,
                },
                "schema": { "fields": schema.bigquery_fields() },
                "sourceFormat": "NEWLINE_DELIMITED_JSON",
                "writeDisposition": write_disposition(schema.write_disposition),
                "createDisposition": "CREATE_IF_NEEDED",
            }
        }
    })
}

/// Serialize rows as newline-delimited JSON, returning the bytes and row count.
pub fn ndjson_body<I>(rows: I) -> BreedFlowResult<(Vec<u8>, usize)>
where
    I: IntoIterator<Item = BreedRow>,
{
    let mut body = Vec::new();
    let mut count = 0;
    for row in rows {
        serde_json::to_writer(&mut body, &row)?;
        body.push(b'\n');
        count += 1;
    }
    Ok((body, count))
}

/// `multipart/related` upload body: job metadata first, then the data.
pub fn multipart_related(metadata: &Value, data: &[u8], boundary: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 1024);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[derive(Debug, Deserialize)]
pub struct JobResource {
    pub status: JobStatus,
    #[serde(default)]
    pub statistics: Option<JobStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: String,
    #[serde(default)]
    pub error_result: Option<ErrorProto>,
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobStatistics {
    #[serde(default)]
    pub load: Option<LoadStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatistics {
    /// int64 values arrive as JSON strings.
    #[serde(default)]
    pub output_rows: Option<String>,
}

impl JobResource {
    pub fn is_done(&self) -> bool {
        self.status.state == "DONE"
    }

    /// The job's failure, joined with its individual errors.
    pub fn failure(&self) -> Option<String> {
        let result = self.status.error_result.as_ref()?;
        let mut message = result.describe();
        for detail in &self.status.errors {
            let text = detail.describe();
            if text != message {
                message.push_str("; ");
                message.push_str(&text);
            }
        }
        Some(message)
    }

    pub fn output_rows(&self) -> Option<u64> {
        self.statistics
            .as_ref()?
            .load
            .as_ref()?
            .output_rows
            .as_deref()?
            .parse()
            .ok()
    }
}

impl ErrorProto {
    fn describe(&self) -> String {
        match (&self.reason, &self.message) {
            (Some(reason), Some(message)) => format!("{reason}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(reason), None) => reason.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

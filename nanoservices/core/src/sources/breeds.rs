use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use reqwest::Client as ReqwestClient;
use serde_json::Value;
use breedflow_utils::error::Error;
use breedflow_utils::{BreedFlowResult, BreedRow};

use crate::config::types::DEFAULT_TABLE_NAME;
use crate::schema::TableSchema;
use super::Resource;

/// Upper bound on the single breed catalog request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The dog breed catalog behind one API url.
#[derive(Debug, Clone)]
pub struct BreedsResource {
    name: String,
    url: String,
    timeout: Duration,
}

impl BreedsResource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_TABLE_NAME.to_string(),
            url: url.into(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Rename the resource, which renames the destination table.
    pub fn with_name<T: Into<String>>(mut self, name: T) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One GET, no retries. Any non-2xx status is an error and the body must
    /// be a JSON array.
    async fn fetch(&self) -> BreedFlowResult<Vec<Value>> {
        let client = ReqwestClient::builder().timeout(self.timeout).build()?;
        let resp = client.get(&self.url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = resp.bytes().await?;
        let breeds: Vec<Value> = serde_json::from_slice(&body)?;
        Ok(breeds)
    }
}

#[async_trait]
impl Resource for BreedsResource {
    fn name(&self) -> &str { &self.name }

    fn schema(&self) -> TableSchema { TableSchema::breeds(&self.name) }

    async fn extract(&self) -> BreedFlowResult<ResourceRows> {
        tracing::info!(url = %self.url, "fetching dog breeds");
        let breeds = match self.fetch().await {
            Ok(breeds) => breeds,
            Err(e) => {
                tracing::error!(url = %self.url, error = %e, "failed to fetch dog breeds");
                return Err(e);
            }
        };
        tracing::info!(count = breeds.len(), "fetched dog breeds");

        // Warehouses keep microseconds; truncating here keeps what was
        // generated equal to what is read back.
        let updated_at = Utc::now().trunc_subsecs(6);
        Ok(ResourceRows::new(breeds, updated_at))
    }
}

/// Rows of one fetch, produced lazily in response order.
///
/// Consumed by value and not `Clone`: a fetch can be traversed exactly once and
/// every row it yields carries the same `updated_at`.
#[derive(Debug)]
pub struct ResourceRows {
    breeds: std::iter::Enumerate<std::vec::IntoIter<Value>>,
    updated_at: DateTime<Utc>,
    total: usize,
}

impl ResourceRows {
    pub fn new(breeds: Vec<Value>, updated_at: DateTime<Utc>) -> Self {
        let total = breeds.len();
        Self {
            breeds: breeds.into_iter().enumerate(),
            updated_at,
            total,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Number of rows the fetch produced, independent of how many were consumed.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Iterator for ResourceRows {
    type Item = BreedRow;

    fn next(&mut self) -> Option<BreedRow> {
        let (index, breed) = self.breeds.next()?;
        if index == 0 {
            if let Some(fields) = breed.as_object() {
                let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
                tracing::debug!(?keys, "sample breed JSON keys");
            }
        }
        if self.breeds.len() == 0 {
            tracing::info!(rows = self.total, "prepared all breed records for loading");
        }

        Some(BreedRow {
            row_id: index as i64 + 1,
            breed_json: breed,
            updated_at: self.updated_at,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.breeds.size_hint()
    }
}

impl ExactSizeIterator for ResourceRows {}

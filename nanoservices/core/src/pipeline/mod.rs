use std::fmt;
use std::time::{Duration, Instant};

use uuid::Uuid;
use breedflow_utils::BreedFlowResult;

use super::sources::Resource;
use super::destinations::Destination;

/// A named load job: one resource replacing one table in one destination.
pub struct Pipeline {
    name: String,
    resource: Box<dyn Resource>,
    destination: Box<dyn Destination>,
}

impl Pipeline {
    pub fn new(
        name: impl Into<String>,
        resource: Box<dyn Resource>,
        destination: Box<dyn Destination>,
    ) -> Self {
        Self { name: name.into(), resource, destination }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extract the resource and replace its table in the destination.
    ///
    /// Nothing is retried; the first error ends the run.
    pub async fn run(&self) -> BreedFlowResult<LoadInfo> {
        let started = Instant::now();
        let load_id = Uuid::new_v4().to_string();
        let schema = self.resource.schema();

        tracing::info!(
            pipeline = %self.name,
            load_id = %load_id,
            resource = %self.resource.name(),
            destination = %self.destination.name(),
            dataset = %self.destination.dataset(),
            "extracting resource"
        );
        let rows = self.resource.extract().await?;

        tracing::info!(
            write_disposition = %schema.write_disposition,
            table = %schema.name,
            rows = rows.total(),
            "pipeline will replace existing table contents"
        );
        let load = self.destination.replace_table(&load_id, &schema, rows).await?;

        Ok(LoadInfo {
            pipeline_name: self.name.clone(),
            destination: self.destination.name().to_string(),
            dataset: self.destination.dataset().to_string(),
            table: load.table,
            rows: load.rows,
            location: load.location,
            load_id,
            elapsed: started.elapsed(),
        })
    }
}

/// Outcome of a successful [`Pipeline::run`]. `Display` renders the summary.
#[derive(Debug, Clone)]
pub struct LoadInfo {
    pub pipeline_name: String,
    pub destination: String,
    pub dataset: String,
    pub table: String,
    pub rows: usize,
    pub location: String,
    pub load_id: String,
    pub elapsed: Duration,
}

impl fmt::Display for LoadInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Pipeline {} load step completed in {:.2} seconds",
            self.pipeline_name,
            self.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "1 load package(s) were loaded to destination {} and into dataset {}",
            self.destination, self.dataset
        )?;
        writeln!(f, "The {} destination used {} to store data", self.destination, self.location)?;
        write!(
            f,
            "Load package {} is LOADED: {} row(s) replaced the contents of {}",
            self.load_id, self.rows, self.table
        )
    }
}

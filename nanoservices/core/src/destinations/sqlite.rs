use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::task;
use breedflow_utils::BreedFlowResult;

use crate::schema::TableSchema;
use crate::sources::ResourceRows;
use crate::store::Store;
use super::{join_error, Destination, TableLoad};

/// Local warehouse: one SQLite file per dataset under `dir`.
#[derive(Debug, Clone)]
pub struct SqliteDestination {
    dataset: String,
    dir: PathBuf,
}

impl SqliteDestination {
    pub fn new(dataset: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self { dataset: dataset.into(), dir: dir.into() }
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir.join(format!("{}.sqlite", self.dataset))
    }
}

#[async_trait]
impl Destination for SqliteDestination {
    fn name(&self) -> &str { "sqlite" }

    fn dataset(&self) -> &str { &self.dataset }

    async fn replace_table(
        &self,
        load_id: &str,
        schema: &TableSchema,
        rows: ResourceRows,
    ) -> BreedFlowResult<TableLoad> {
        let path = self.database_path();
        tracing::info!(database = %path.display(), table = %schema.name, "replacing sqlite table");

        let dir = self.dir.clone();
        let db_path = path.clone();
        let load_id = load_id.to_string();
        let table = schema.clone();
        let count = task::spawn_blocking(move || -> BreedFlowResult<usize> {
            std::fs::create_dir_all(&dir)?;
            let mut store = Store::open(&db_path)?;
            let inserted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
            Ok(store.replace_table(&load_id, &table, rows, &inserted_at)?)
        })
        .await
        .map_err(join_error)??;

        Ok(TableLoad {
            table: format!("{}.{}", self.dataset, schema.name),
            rows: count,
            location: path.display().to_string(),
        })
    }
}

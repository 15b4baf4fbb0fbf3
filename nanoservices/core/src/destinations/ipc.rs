use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use tokio::task;
use breedflow_utils::{BreedFlowResult, BreedRow};

use crate::schema::TableSchema;
use crate::sources::ResourceRows;
use super::{join_error, Destination, TableLoad};

/// Rows per record batch written to the IPC file.
pub const BATCH_SIZE: usize = 1000;

/// Writes each table as an Arrow IPC file at `<dir>/<dataset>/<table>.arrow`.
#[derive(Debug, Clone)]
pub struct ArrowIpcDestination {
    dataset: String,
    dir: PathBuf,
}

impl ArrowIpcDestination {
    pub fn new(dataset: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self { dataset: dataset.into(), dir: dir.into() }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(&self.dataset).join(format!("{table}.arrow"))
    }
}

#[async_trait]
impl Destination for ArrowIpcDestination {
    fn name(&self) -> &str { "arrow" }

    fn dataset(&self) -> &str { &self.dataset }

    async fn replace_table(
        &self,
        load_id: &str,
        schema: &TableSchema,
        rows: ResourceRows,
    ) -> BreedFlowResult<TableLoad> {
        let path = self.table_path(&schema.name);
        tracing::info!(file = %path.display(), load_id, "writing arrow ipc table");

        let target = path.clone();
        let arrow_schema = schema.to_arrow_schema();
        let count = task::spawn_blocking(move || replace_file(&target, arrow_schema, rows))
            .await
            .map_err(join_error)??;

        Ok(TableLoad {
            table: format!("{}.{}", self.dataset, schema.name),
            rows: count,
            location: path.display().to_string(),
        })
    }
}

/// Write to a sibling temp file and rename it over `path`, so readers see the
/// old file or the new one and never a partial write.
fn replace_file(path: &Path, schema: SchemaRef, rows: ResourceRows) -> BreedFlowResult<usize> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("arrow.tmp");
    match write_batches(&tmp, schema, rows) {
        Ok(count) => {
            fs::rename(&tmp, path)?;
            Ok(count)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn write_batches(path: &Path, schema: SchemaRef, rows: ResourceRows) -> BreedFlowResult<usize> {
    let file = File::create(path)?;
    let mut writer = FileWriter::try_new(file, &schema)?;

    let mut written = 0;
    let mut chunk = Vec::with_capacity(BATCH_SIZE);
    for row in rows {
        chunk.push(row);
        if chunk.len() == BATCH_SIZE {
            writer.write(&rows_to_batch(schema.clone(), &chunk)?)?;
            written += chunk.len();
            chunk.clear();
        }
    }
    if !chunk.is_empty() {
        writer.write(&rows_to_batch(schema.clone(), &chunk)?)?;
        written += chunk.len();
    }

    writer.finish()?;
    Ok(written)
}

/// Columnar form of breed rows; `schema` must be the breed table layout.
pub fn rows_to_batch(schema: SchemaRef, rows: &[BreedRow]) -> Result<RecordBatch, ArrowError> {
    let row_ids = Int64Array::from_iter_values(rows.iter().map(|r| r.row_id));
    let breeds = StringArray::from_iter_values(rows.iter().map(|r| r.breed_json.to_string()));
    let updated_at = TimestampMicrosecondArray::from_iter_values(
        rows.iter().map(|r| r.updated_at.timestamp_micros()),
    )
    .with_timezone("UTC");

    RecordBatch::try_new(
        schema,
        vec![Arc::new(row_ids), Arc::new(breeds), Arc::new(updated_at)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use arrow::ipc::reader::FileReader;
    use chrono::{SubsecRound, Utc};
    use serde_json::json;

    fn read_table(path: &Path) -> Vec<RecordBatch> {
        let reader = FileReader::try_new(File::open(path).unwrap(), None).unwrap();
        reader.map(|b| b.unwrap()).collect()
    }

    #[tokio::test]
    async fn writes_rows_and_replaces_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = ArrowIpcDestination::new("dog_breeds_raw", dir.path());
        let schema = TableSchema::breeds("dog_breeds_resource");

        let first = ResourceRows::new(vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})], Utc::now());
        dest.replace_table("load-1", &schema, first).await.unwrap();

        let at = Utc::now().trunc_subsecs(6);
        let second = ResourceRows::new(
            vec![json!({"id": 1, "name": "Affenpinscher"}), json!({"id": 2, "name": "Beagle"})],
            at,
        );
        let load = dest.replace_table("load-2", &schema, second).await.unwrap();
        assert_eq!(load.rows, 2);

        let path = dest.table_path("dog_breeds_resource");
        assert!(path.exists());
        assert!(!path.with_extension("arrow.tmp").exists());

        let batches = read_table(&path);
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);

        let batch = &batches[0];
        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.values().to_vec(), vec![1, 2]);
        let breeds = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(breeds.value(1), r#"{"id":2,"name":"Beagle"}"#);
        let stamps = batch
            .column(2)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(stamps.value(0), at.timestamp_micros());
        assert_eq!(stamps.value(0), stamps.value(1));
    }

    #[test]
    fn large_loads_are_split_into_batches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.arrow");
        let breeds = (0..BATCH_SIZE + 5).map(|i| json!({ "id": i })).collect();
        let schema = TableSchema::breeds("t").to_arrow_schema();

        let count = replace_file(&path, schema, ResourceRows::new(breeds, Utc::now())).unwrap();
        assert_eq!(count, BATCH_SIZE + 5);

        let batches = read_table(&path);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].num_rows(), BATCH_SIZE);
        assert_eq!(batches[1].num_rows(), 5);
        assert!(batches[1].column(0).null_count() == 0);
    }

    #[test]
    fn empty_load_writes_schema_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/t.arrow");
        let schema = TableSchema::breeds("t").to_arrow_schema();

        let count = replace_file(&path, schema.clone(), ResourceRows::new(Vec::new(), Utc::now())).unwrap();
        assert_eq!(count, 0);

        let reader = FileReader::try_new(File::open(&path).unwrap(), None).unwrap();
        assert_eq!(reader.schema().fields().len(), schema.fields().len());
        assert_eq!(reader.count(), 0);
    }
}

use async_trait::async_trait;
use breedflow_utils::BreedFlowResult;

use crate::schema::TableSchema;
use crate::sources::ResourceRows;

/// What a destination reports back after replacing a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLoad {
    /// Fully qualified table name as the destination spells it.
    pub table: String,
    pub rows: usize,
    /// Where the data ended up (region, database file, directory).
    pub location: String,
}

/// A bulk loader bound to one dataset.
#[async_trait]
pub trait Destination: Send + Sync {
    fn name(&self) -> &str;

    /// The dataset every table of this destination lives in.
    fn dataset(&self) -> &str;

    /// Replace the table's contents with `rows`, creating the dataset and the
    /// table when they are missing.
    ///
    /// Pulls `rows` to completion. Either the whole replacement is visible
    /// afterwards or the previous contents are.
    async fn replace_table(
        &self,
        load_id: &str,
        schema: &TableSchema,
        rows: ResourceRows,
    ) -> BreedFlowResult<TableLoad>;
}

use async_trait::async_trait;
use breedflow_utils::BreedFlowResult;

use crate::schema::TableSchema;
use super::ResourceRows;

/// A loadable data resource: one table's worth of rows plus its declared shape.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Resource name; also the destination table name.
    fn name(&self) -> &str;

    /// Shape and write policy the destination must apply.
    fn schema(&self) -> TableSchema;

    /// Fetch the data and hand back a single-pass row iterator.
    ///
    /// Every failure happens here, before the first row exists.
    async fn extract(&self) -> BreedFlowResult<ResourceRows>;
}

pub mod error;

use chrono::{DateTime, SecondsFormat, Utc};
use error::Error;
use serde::{Serialize, Serializer};
use serde_json::Value;

pub type BreedFlowResult<T> = Result<T, Error>;

/// One row of the destination table.
///
/// `row_id` is the 1-based position of the breed in the API response, not the
/// breed's own `id`. `breed_json` is the API element exactly as received.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreedRow {
    pub row_id: i64,
    pub breed_json: Value,
    #[serde(serialize_with = "micros")]
    pub updated_at: DateTime<Utc>,
}

fn micros<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

impl BreedRow {
    /// `updated_at` as RFC 3339 with microsecond precision, the finest unit
    /// the warehouses keep.
    pub fn updated_at_rfc3339(&self) -> String {
        self.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

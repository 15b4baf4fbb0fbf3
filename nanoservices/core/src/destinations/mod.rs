use tokio::io::Error as TokioIoError;
use tokio::task::JoinError;
use breedflow_utils::error::Error;

pub mod bigquery;
pub mod ipc;
pub mod sqlite;
pub mod traits;

pub use bigquery::BigQueryDestination;
pub use ipc::ArrowIpcDestination;
pub use sqlite::SqliteDestination;
pub use traits::{Destination, TableLoad};

/// Blocking loaders run on the blocking pool; a panic there surfaces as an IO error.
pub(crate) fn join_error(err: JoinError) -> Error {
    Error::Io(TokioIoError::new(std::io::ErrorKind::Other, err.to_string()))
}

//! breedflow_core: extract the dog breed catalogue and bulk-load it as raw JSON
//!
//! One run fetches the breed list once, stamps every record with the same
//! timestamp and replaces the destination table with the result. BigQuery is
//! the production warehouse; SQLite and Arrow IPC files serve local runs.
//!
//! Basic usage:
//!
//! ```no_run
//! use breedflow_core::builder::PipelineBuilder;
//! use breedflow_core::sources::BreedsResource;
//! use breedflow_core::destinations::SqliteDestination;
//!
//! # async fn demo() -> breedflow_utils::BreedFlowResult<()> {
//! let pipeline = PipelineBuilder::new("dog_breeds_pipeline")
//!     .resource(BreedsResource::new("https://api.thedogapi.com/v1/breeds"))
//!     .destination(SqliteDestination::new("dog_breeds_raw", ".breedflow"))
//!     .build()?;
//! let info = pipeline.run().await?;
//! println!("{info}");
//! # Ok(())
//! # }
//! ```

pub mod sources;
pub mod destinations;
pub mod schema;
pub mod store;
pub mod config;
pub mod builder;
pub mod pipeline;
pub mod engine;

pub mod logging;

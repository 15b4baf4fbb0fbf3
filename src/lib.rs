pub use breedflow_core as core;
pub use breedflow_utils as utils;

// Convenience re-exports for common usage
pub use breedflow_core::builder::PipelineBuilder;
pub use breedflow_core::config::{load_config, DestinationKind, PipelineConfig};
pub use breedflow_core::destinations::traits::Destination;
pub use breedflow_core::engine::{run_from_environment, run_pipeline, RunResult, RunStatus};
pub use breedflow_core::sources::traits::Resource;
pub use breedflow_utils::{BreedFlowResult, BreedRow};

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_with};
pub use types::{DestinationKind, PipelineConfig};

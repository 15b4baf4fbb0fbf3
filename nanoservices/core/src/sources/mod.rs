pub mod breeds;
pub mod traits;

pub use breeds::{BreedsResource, ResourceRows};
pub use traits::Resource;

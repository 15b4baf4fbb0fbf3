use breedflow_utils::error::Error;

use crate::destinations::Destination;
use crate::pipeline::Pipeline;
use crate::sources::Resource;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("pipeline name is required")]
    NoName,
    #[error("a resource is required")]
    NoResource,
    #[error("a destination is required")]
    NoDestination,
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Error::Build(err.to_string())
    }
}

pub struct PipelineBuilder {
    name: Option<String>,
    resource: Option<Box<dyn Resource>>,
    destination: Option<Box<dyn Destination>>,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: (!name.trim().is_empty()).then_some(name),
            resource: None,
            destination: None,
        }
    }

    pub fn resource(mut self, resource: impl Resource + 'static) -> Self {
        self.resource = Some(Box::new(resource));
        self
    }

    pub fn destination(mut self, destination: impl Destination + 'static) -> Self {
        self.destination = Some(Box::new(destination));
        self
    }

    /// For destinations picked at runtime.
    pub fn boxed_destination(mut self, destination: Box<dyn Destination>) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn build(self) -> Result<Pipeline, BuildError> {
        let name = self.name.ok_or(BuildError::NoName)?;
        let resource = self.resource.ok_or(BuildError::NoResource)?;
        let destination = self.destination.ok_or(BuildError::NoDestination)?;
        Ok(Pipeline::new(name, resource, destination))
    }
}

//! The endpoint resource builder.
//!
//! Declares the model / endpoint-configuration / endpoint triad into a
//! [`ResourceGraph`] and registers the ordering edges the provisioning
//! engine needs: the configuration waits for the model, the endpoint
//! waits for the configuration (reversed on teardown).

use crate::image::{ImageError, InferenceImage};
use crate::names::ResourceNames;
use crate::resource::{
    ContainerDefinition, GraphError, ProductionVariant, Resource, ResourceGraph,
};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Environment key carrying the model identifier into the container
pub const MODEL_ID_ENV: &str = "HF_MODEL_ID";

/// Environment key carrying the inference task into the container
pub const TASK_ENV: &str = "HF_TASK";

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Image resolution failed: {0}")]
    Image(#[from] ImageError),

    #[error("Graph declaration failed: {0}")]
    Graph(#[from] GraphError),
}

pub type EndpointResult<T> = Result<T, EndpointError>;

/// Inputs for one endpoint declaration
#[derive(Debug, Clone)]
pub struct EndpointSpec {
    pub model: String,
    pub task: String,
    pub instance_type: String,
    pub execution_role_arn: String,
    pub region: String,
}

impl EndpointSpec {
    /// Declare the model, endpoint configuration, and endpoint into `graph`.
    ///
    /// Fails before declaring anything if the region or instance type is
    /// unusable. The returned handle exposes the endpoint's resource name;
    /// the endpoint itself only becomes invocable once the provisioning
    /// engine has applied the graph.
    pub fn declare(&self, graph: &mut ResourceGraph) -> EndpointResult<EndpointHandle> {
        let image = InferenceImage::for_instance(&self.region, &self.instance_type)?;
        let names = ResourceNames::derive(&self.model);

        let mut environment = BTreeMap::new();
        environment.insert(MODEL_ID_ENV.to_string(), self.model.clone());
        environment.insert(TASK_ENV.to_string(), self.task.clone());

        graph.declare(Resource::Model {
            name: names.model_name.clone(),
            execution_role_arn: self.execution_role_arn.clone(),
            container: ContainerDefinition {
                image: image.uri(),
                environment,
            },
        })?;

        graph.declare(Resource::EndpointConfig {
            name: names.endpoint_config_name.clone(),
            variant: ProductionVariant {
                model_name: names.model_name.clone(),
                variant_name: names.model_name.clone(),
                instance_type: self.instance_type.clone(),
                initial_instance_count: 1,
                initial_variant_weight: 1.0,
            },
        })?;

        graph.declare(Resource::Endpoint {
            name: names.endpoint_name.clone(),
            endpoint_config_name: names.endpoint_config_name.clone(),
        })?;

        // Name references alone carry no ordering; register both edges.
        graph.depends_on(&names.endpoint_config_name, &names.model_name)?;
        graph.depends_on(&names.endpoint_name, &names.endpoint_config_name)?;

        debug!(
            endpoint = %names.endpoint_name,
            accelerator = ?image.accelerator(),
            "declared endpoint resources"
        );

        Ok(EndpointHandle {
            endpoint_name: names.endpoint_name,
        })
    }
}

/// Read-only handle over a declared endpoint
#[derive(Debug, Clone)]
pub struct EndpointHandle {
    endpoint_name: String,
}

impl EndpointHandle {
    /// The declared resource name of the endpoint
    pub fn endpoint_name(&self) -> &str {
        &self.endpoint_name
    }
}

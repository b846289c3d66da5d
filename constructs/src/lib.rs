pub mod config;
pub mod endpoint;
pub mod image;
pub mod names;
pub mod resource;
pub mod stack;

pub use config::{
    StackConfig, DEFAULT_ACCOUNT, DEFAULT_INSTANCE_TYPE, DEFAULT_MODEL, DEFAULT_REGION,
    DEFAULT_TASK,
};
pub use endpoint::{
    EndpointError, EndpointHandle, EndpointResult, EndpointSpec, MODEL_ID_ENV, TASK_ENV,
};
pub use image::{
    registry_account, supported_regions, AcceleratorClass, ImageError, ImageResult,
    InferenceImage, PYTORCH_VERSION, TRANSFORMERS_VERSION,
};
pub use names::ResourceNames;
pub use resource::{
    ContainerDefinition, GraphError, GraphResult, PolicyStatement, ProductionVariant, Relation,
    Resource, ResourceGraph,
};
pub use stack::{
    Stack, StackError, StackResult, ENDPOINT_NAME_ENV, EXECUTION_ROLE_ACTIONS,
    SAGEMAKER_SERVICE_PRINCIPAL,
};

pub mod prelude {
    pub use crate::config::*;
    pub use crate::endpoint::*;
    pub use crate::image::*;
    pub use crate::names::*;
    pub use crate::resource::*;
    pub use crate::stack::*;
}

//! Template synthesis for a declared resource graph.
//!
//! Turns a [`ResourceGraph`] into a CloudFormation-style JSON document:
//! one entry per resource under deterministic logical IDs, with
//! `DependsOn` populated from the graph's registered edges. The emitted
//! template is the hand-off artifact; applying it is the provisioning
//! engine's job.

use constructs::{GraphError, Resource, ResourceGraph};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;

const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";
const POLICY_DOCUMENT_VERSION: &str = "2012-10-17";

/// Errors raised while synthesizing a template
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Graph lookup failed: {0}")]
    Graph(#[from] GraphError),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// One synthesized resource entry
#[derive(Debug, Serialize)]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: &'static str,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// A synthesized template, ready to serialize
#[derive(Debug, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: &'static str,
    #[serde(rename = "Resources")]
    resources: BTreeMap<String, TemplateResource>,
}

impl Template {
    /// Entry for a logical ID, if present
    pub fn resource(&self, logical_id: &str) -> Option<&TemplateResource> {
        self.resources.get(logical_id)
    }

    /// Number of synthesized resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Pretty-printed JSON rendition
    pub fn to_json(&self) -> TemplateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Synthesize a template from a declared resource graph
pub fn synthesize(graph: &ResourceGraph) -> TemplateResult<Template> {
    let mut resources = BTreeMap::new();
    for resource in graph.resources() {
        let depends_on = graph
            .dependencies_of(resource.name())?
            .iter()
            .map(|name| logical_id(name))
            .collect();
        resources.insert(
            logical_id(resource.name()),
            TemplateResource {
                resource_type: resource_type(resource),
                properties: properties(resource),
                depends_on,
            },
        );
    }
    Ok(Template {
        format_version: TEMPLATE_FORMAT_VERSION,
        resources,
    })
}

/// Derive the logical ID for a resource name.
///
/// Logical IDs must be alphanumeric, so name segments are title-cased
/// and joined: `endpoint-org--model-x` becomes `EndpointOrgModelX`.
pub fn logical_id(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn resource_type(resource: &Resource) -> &'static str {
    match resource {
        Resource::ExecutionRole { .. } => "AWS::IAM::Role",
        Resource::Model { .. } => "AWS::SageMaker::Model",
        Resource::EndpointConfig { .. } => "AWS::SageMaker::EndpointConfig",
        Resource::Endpoint { .. } => "AWS::SageMaker::Endpoint",
        Resource::Function { .. } => "AWS::Lambda::Function",
        Resource::RestApi { .. } => "AWS::ApiGateway::RestApi",
    }
}

fn properties(resource: &Resource) -> Value {
    match resource {
        Resource::ExecutionRole {
            name,
            assumed_by,
            policy,
        } => json!({
            "RoleName": name,
            "AssumeRolePolicyDocument": {
                "Version": POLICY_DOCUMENT_VERSION,
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": assumed_by },
                    "Action": "sts:AssumeRole",
                }],
            },
            "Policies": [{
                "PolicyName": format!("{name}-policy"),
                "PolicyDocument": {
                    "Version": POLICY_DOCUMENT_VERSION,
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": policy.actions,
                        "Resource": policy.resources,
                    }],
                },
            }],
        }),
        Resource::Model {
            name,
            execution_role_arn,
            container,
        } => json!({
            "ModelName": name,
            "ExecutionRoleArn": execution_role_arn,
            "PrimaryContainer": {
                "Image": container.image,
                "Environment": container.environment,
            },
        }),
        Resource::EndpointConfig { name, variant } => json!({
            "EndpointConfigName": name,
            "ProductionVariants": [{
                "ModelName": variant.model_name,
                "VariantName": variant.variant_name,
                "InstanceType": variant.instance_type,
                "InitialInstanceCount": variant.initial_instance_count,
                "InitialVariantWeight": variant.initial_variant_weight,
            }],
        }),
        Resource::Endpoint {
            name,
            endpoint_config_name,
        } => json!({
            "EndpointName": name,
            "EndpointConfigName": endpoint_config_name,
        }),
        Resource::Function {
            name,
            asset_path,
            handler,
            runtime,
            timeout_secs,
            environment,
            policy,
        } => json!({
            "FunctionName": name,
            "Code": { "AssetPath": asset_path },
            "Handler": handler,
            "Runtime": runtime,
            "Timeout": timeout_secs,
            "Environment": { "Variables": environment },
            "Policies": policy
                .iter()
                .map(|statement| json!({
                    "Effect": "Allow",
                    "Action": statement.actions,
                    "Resource": statement.resources,
                }))
                .collect::<Vec<_>>(),
        }),
        Resource::RestApi {
            name,
            handler_function,
            proxy,
        } => json!({
            "Name": name,
            "Handler": handler_function,
            "ProxyAll": proxy,
        }),
    }
}

//! The stack assembler.
//!
//! One call declares the whole front door: execution role (minted or
//! reused), the endpoint triad, the proxy function, and the public REST
//! API. Construction is one-shot and synchronous; a failure aborts the
//! pass and leaves nothing to apply.

use crate::config::StackConfig;
use crate::endpoint::{EndpointError, EndpointHandle, EndpointSpec};
use crate::resource::{GraphError, PolicyStatement, Resource, ResourceGraph};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

/// Permissions granted to a freshly minted execution role.
///
/// Enumerated once, attached verbatim; callers supplying their own role
/// bring their own policy.
pub const EXECUTION_ROLE_ACTIONS: &[&str] = &[
    "sagemaker:*",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchGetImage",
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetAuthorizationToken",
    "cloudwatch:PutMetricData",
    "cloudwatch:GetMetricData",
    "cloudwatch:GetMetricStatistics",
    "cloudwatch:ListMetrics",
    "logs:CreateLogGroup",
    "logs:CreateLogStream",
    "logs:DescribeLogStreams",
    "logs:PutLogEvents",
    "logs:GetLogEvents",
    "s3:CreateBucket",
    "s3:ListBucket",
    "s3:GetBucketLocation",
    "s3:GetObject",
    "s3:PutObject",
];

/// Service principal allowed to assume a minted execution role
pub const SAGEMAKER_SERVICE_PRINCIPAL: &str = "sagemaker.amazonaws.com";

/// Environment variable the proxy function reads the endpoint name from
pub const ENDPOINT_NAME_ENV: &str = "ENDPOINT_NAME";

const EXECUTION_ROLE_NAME: &str = "hf-sagemaker-execution-role";
const FUNCTION_NAME: &str = "sm-invoke";
const FUNCTION_ASSET_PATH: &str = "lambda_src";
const FUNCTION_HANDLER: &str = "handler.proxy";
const FUNCTION_RUNTIME: &str = "python3.8";
const FUNCTION_TIMEOUT_SECS: u64 = 60;
const API_NAME: &str = "hf-api-gw";

#[derive(Error, Debug)]
pub enum StackError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type StackResult<T> = Result<T, StackError>;

/// A fully assembled stack: the resource graph plus its exported values
pub struct Stack {
    graph: ResourceGraph,
    endpoint: EndpointHandle,
    execution_role_arn: String,
}

impl Stack {
    /// Assemble the full resource graph for `config`.
    pub fn assemble(config: &StackConfig) -> StackResult<Self> {
        config
            .validate()
            .map_err(|message| StackError::InvalidConfig { message })?;

        let mut graph = ResourceGraph::new();

        // Reuse the supplied role untouched, or mint one scoped to the
        // fixed action list.
        let execution_role_arn = match &config.execution_role_arn {
            Some(arn) => arn.clone(),
            None => {
                graph.declare(Resource::ExecutionRole {
                    name: EXECUTION_ROLE_NAME.to_string(),
                    assumed_by: SAGEMAKER_SERVICE_PRINCIPAL.to_string(),
                    policy: PolicyStatement::new(EXECUTION_ROLE_ACTIONS.iter().copied(), ["*"]),
                })?;
                format!(
                    "arn:aws:iam::{}:role/{}",
                    config.account, EXECUTION_ROLE_NAME
                )
            }
        };

        let endpoint = EndpointSpec {
            model: config.model.clone(),
            task: config.task.clone(),
            instance_type: config.instance_type.clone(),
            execution_role_arn: execution_role_arn.clone(),
            region: config.region.clone(),
        }
        .declare(&mut graph)?;

        // The endpoint name in an ARN is canonicalized to lower case by
        // the provider, so the permission scope folds it as well. The
        // declared resource keeps its original case.
        let invoke_arn = format!(
            "arn:aws:sagemaker:{}:{}:endpoint/{}",
            config.region,
            config.account,
            endpoint.endpoint_name().to_lowercase()
        );

        let mut environment = BTreeMap::new();
        environment.insert(
            ENDPOINT_NAME_ENV.to_string(),
            endpoint.endpoint_name().to_string(),
        );

        graph.declare(Resource::Function {
            name: FUNCTION_NAME.to_string(),
            asset_path: FUNCTION_ASSET_PATH.to_string(),
            handler: FUNCTION_HANDLER.to_string(),
            runtime: FUNCTION_RUNTIME.to_string(),
            timeout_secs: FUNCTION_TIMEOUT_SECS,
            environment,
            policy: vec![PolicyStatement::new(
                ["sagemaker:InvokeEndpoint"],
                [invoke_arn],
            )],
        })?;

        graph.declare(Resource::RestApi {
            name: API_NAME.to_string(),
            handler_function: FUNCTION_NAME.to_string(),
            proxy: true,
        })?;
        graph.depends_on(API_NAME, FUNCTION_NAME)?;

        info!(
            endpoint = %endpoint.endpoint_name(),
            resources = graph.len(),
            "assembled stack"
        );

        Ok(Self {
            graph,
            endpoint,
            execution_role_arn,
        })
    }

    /// The declared resource graph
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// The declared endpoint's resource name
    pub fn endpoint_name(&self) -> &str {
        self.endpoint.endpoint_name()
    }

    /// ARN of the execution role the model runs under
    pub fn execution_role_arn(&self) -> &str {
        &self.execution_role_arn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StackConfig;

    #[test]
    fn test_mints_role_when_none_supplied() {
        let stack = Stack::assemble(&StackConfig::default()).unwrap();

        let roles = stack
            .graph()
            .query(|r| matches!(r, Resource::ExecutionRole { .. }));
        assert_eq!(roles.len(), 1);

        let Resource::ExecutionRole {
            assumed_by, policy, ..
        } = roles[0]
        else {
            unreachable!();
        };
        assert_eq!(assumed_by, SAGEMAKER_SERVICE_PRINCIPAL);
        assert_eq!(policy.actions, EXECUTION_ROLE_ACTIONS);
        assert_eq!(policy.resources, vec!["*".to_string()]);
        assert_eq!(
            stack.execution_role_arn(),
            "arn:aws:iam::123456789012:role/hf-sagemaker-execution-role"
        );
    }

    #[test]
    fn test_supplied_role_passes_through_unchanged() {
        let supplied = "arn:aws:iam::123456789012:role/prebuilt";
        let config = StackConfig::default().with_execution_role(supplied);
        let stack = Stack::assemble(&config).unwrap();

        let roles = stack
            .graph()
            .query(|r| matches!(r, Resource::ExecutionRole { .. }));
        assert!(roles.is_empty());
        assert_eq!(stack.execution_role_arn(), supplied);
    }

    #[test]
    fn test_function_carries_endpoint_binding() {
        let stack = Stack::assemble(&StackConfig::default()).unwrap();

        let function = stack.graph().get("sm-invoke").unwrap();
        let Resource::Function {
            timeout_secs,
            environment,
            policy,
            ..
        } = function
        else {
            panic!("expected the proxy function");
        };

        assert_eq!(*timeout_secs, 60);
        assert_eq!(
            environment.get(ENDPOINT_NAME_ENV).map(String::as_str),
            Some("endpoint-distilbert-base-uncased-finetuned-sst-2-english")
        );
        assert_eq!(policy.len(), 1);
        assert_eq!(policy[0].actions, vec!["sagemaker:InvokeEndpoint".to_string()]);
        assert_eq!(
            policy[0].resources,
            vec![
                "arn:aws:sagemaker:us-east-1:123456789012:endpoint/endpoint-distilbert-base-uncased-finetuned-sst-2-english"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_invoke_scope_folds_mixed_case_names() {
        let config = StackConfig::default().with_model("EleutherAI/gpt_neo");
        let stack = Stack::assemble(&config).unwrap();

        // Declared resource keeps its case, the permission scope does not.
        assert_eq!(stack.endpoint_name(), "endpoint-EleutherAI--gpt-neo");

        let Resource::Function { policy, .. } = stack.graph().get("sm-invoke").unwrap() else {
            panic!("expected the proxy function");
        };
        assert!(policy[0].resources[0].ends_with("endpoint/endpoint-eleutherai--gpt-neo"));
    }

    #[test]
    fn test_api_proxies_function() {
        let stack = Stack::assemble(&StackConfig::default()).unwrap();

        let api = stack.graph().get("hf-api-gw").unwrap();
        let Resource::RestApi {
            handler_function,
            proxy,
            ..
        } = api
        else {
            panic!("expected the rest api");
        };
        assert_eq!(handler_function, "sm-invoke");
        assert!(*proxy);

        let deps = stack.graph().dependencies_of("hf-api-gw").unwrap();
        assert_eq!(deps, vec!["sm-invoke".to_string()]);
    }

    #[test]
    fn test_invalid_config_rejected_before_declaration() {
        let mut config = StackConfig::default();
        config.model = String::new();

        let result = Stack::assemble(&config);
        assert!(matches!(result, Err(StackError::InvalidConfig { .. })));
    }

    #[test]
    fn test_default_stack_resource_count() {
        let stack = Stack::assemble(&StackConfig::default()).unwrap();
        // role + model + config + endpoint + function + api
        assert_eq!(stack.graph().len(), 6);
        assert_eq!(stack.graph().edge_count(), 3);
    }
}

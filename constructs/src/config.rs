use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";
pub const DEFAULT_TASK: &str = "text-classification";
pub const DEFAULT_INSTANCE_TYPE: &str = "ml.m5.xlarge";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_ACCOUNT: &str = "123456789012";

/// Everything one stack assembly needs, resolved once at the boundary.
///
/// Core construction never reads ambient state; callers fill this in
/// (CLI flags, context file, environment) and hand it over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackConfig {
    /// HuggingFace model identifier, e.g. `org/model-name`
    pub model: String,
    /// Inference task the container is configured for
    pub task: String,
    /// Instance type backing the endpoint
    pub instance_type: String,
    /// Deployment region
    pub region: String,
    /// Account the stack is deployed into
    pub account: String,
    /// Existing execution role ARN; a fresh role is minted when absent
    pub execution_role_arn: Option<String>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            task: DEFAULT_TASK.to_string(),
            instance_type: DEFAULT_INSTANCE_TYPE.to_string(),
            region: DEFAULT_REGION.to_string(),
            account: DEFAULT_ACCOUNT.to_string(),
            execution_role_arn: None,
        }
    }
}

impl StackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = task.into();
        self
    }

    pub fn with_instance_type(mut self, instance_type: impl Into<String>) -> Self {
        self.instance_type = instance_type.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_execution_role(mut self, arn: impl Into<String>) -> Self {
        self.execution_role_arn = Some(arn.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model.is_empty() {
            return Err("Model identifier cannot be empty".to_string());
        }

        if self.task.is_empty() {
            return Err("Task cannot be empty".to_string());
        }

        if self.instance_type.is_empty() {
            return Err("Instance type cannot be empty".to_string());
        }

        if self.region.is_empty() {
            return Err("Region cannot be empty".to_string());
        }

        if self.account.is_empty() {
            return Err("Account cannot be empty".to_string());
        }

        if let Some(arn) = &self.execution_role_arn {
            if arn.is_empty() {
                return Err("Execution role ARN cannot be empty when supplied".to_string());
            }
        }

        Ok(())
    }
}

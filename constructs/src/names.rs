//! Deterministic resource naming.
//!
//! Model identifiers such as `org/model_name` contain characters the
//! provisioning engine rejects in resource names; they are normalized
//! with `_` -> `-` and `/` -> `--` before the role prefix is applied.
//! Uniqueness within an account/region is the caller's responsibility.

use serde::{Deserialize, Serialize};

/// Names of the three endpoint-side resources, all derived from one
/// model identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNames {
    pub model_name: String,
    pub endpoint_config_name: String,
    pub endpoint_name: String,
}

impl ResourceNames {
    /// Derive all three names from a model identifier
    pub fn derive(model_id: &str) -> Self {
        let slug = sanitize(model_id);
        Self {
            model_name: format!("model-{slug}"),
            endpoint_config_name: format!("config-{slug}"),
            endpoint_name: format!("endpoint-{slug}"),
        }
    }
}

fn sanitize(model_id: &str) -> String {
    model_id.replace('_', "-").replace('/', "--")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_identifier() {
        let names = ResourceNames::derive("distilbert-base-uncased-finetuned-sst-2-english");
        assert_eq!(
            names.model_name,
            "model-distilbert-base-uncased-finetuned-sst-2-english"
        );
        assert_eq!(
            names.endpoint_config_name,
            "config-distilbert-base-uncased-finetuned-sst-2-english"
        );
        assert_eq!(
            names.endpoint_name,
            "endpoint-distilbert-base-uncased-finetuned-sst-2-english"
        );
    }

    #[test]
    fn test_namespaced_identifier_substitution() {
        let names = ResourceNames::derive("org/model_x");
        assert_eq!(names.model_name, "model-org--model-x");
        assert_eq!(names.endpoint_config_name, "config-org--model-x");
        assert_eq!(names.endpoint_name, "endpoint-org--model-x");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = ResourceNames::derive("EleutherAI/gpt_neo");
        let b = ResourceNames::derive("EleutherAI/gpt_neo");
        assert_eq!(a, b);
        assert_eq!(a.endpoint_name, "endpoint-EleutherAI--gpt-neo");
    }
}

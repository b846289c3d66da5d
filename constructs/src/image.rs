//! Inference container image resolution.
//!
//! The managed inference service pulls its container from a regional
//! registry. Which registry account publishes the HuggingFace inference
//! images differs per region, so the mapping is a fixed table; a region
//! absent from it cannot host the stack.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// PyTorch release baked into the inference image tag.
pub const PYTORCH_VERSION: &str = "1.10.2";

/// Transformers release baked into the inference image tag.
pub const TRANSFORMERS_VERSION: &str = "4.17.0";

/// Registry accounts publishing `huggingface-pytorch-inference` per region.
const REGISTRY_ACCOUNTS: &[(&str, &str)] = &[
    ("af-south-1", "626614931356"),
    ("ap-east-1", "871362719292"),
    ("ap-northeast-1", "763104351884"),
    ("ap-northeast-2", "763104351884"),
    ("ap-south-1", "763104351884"),
    ("ap-southeast-1", "763104351884"),
    ("ap-southeast-2", "763104351884"),
    ("ca-central-1", "763104351884"),
    ("cn-north-1", "727897471807"),
    ("cn-northwest-1", "727897471807"),
    ("eu-central-1", "763104351884"),
    ("eu-north-1", "763104351884"),
    ("eu-south-1", "692866216735"),
    ("eu-west-1", "763104351884"),
    ("eu-west-2", "763104351884"),
    ("eu-west-3", "763104351884"),
    ("me-south-1", "217643126080"),
    ("sa-east-1", "763104351884"),
    ("us-east-1", "763104351884"),
    ("us-east-2", "763104351884"),
    ("us-west-1", "763104351884"),
    ("us-west-2", "763104351884"),
];

/// Errors raised while resolving the inference image
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("No inference image registry is published for region '{region}'")]
    UnsupportedRegion { region: String },

    #[error("Malformed instance type '{instance_type}': expected the form ml.<family>.<size>")]
    MalformedInstanceType { instance_type: String },
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Accelerator class of an instance family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceleratorClass {
    Cpu,
    Gpu,
}

impl AcceleratorClass {
    /// Classify an instance type by its family token.
    ///
    /// The family is the second dot-delimited token; families starting
    /// with `p` or `g` (case-insensitive) carry GPUs, everything else is
    /// CPU-only. `ml.g4dn.xlarge` is GPU, `ml.m5.xlarge` is CPU.
    pub fn from_instance_type(instance_type: &str) -> ImageResult<Self> {
        let mut tokens = instance_type.split('.');
        let (Some(prefix), Some(family), Some(size)) =
            (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ImageError::MalformedInstanceType {
                instance_type: instance_type.to_string(),
            });
        };
        if prefix.is_empty() || size.is_empty() {
            return Err(ImageError::MalformedInstanceType {
                instance_type: instance_type.to_string(),
            });
        }
        let Some(family_code) = family.chars().next() else {
            return Err(ImageError::MalformedInstanceType {
                instance_type: instance_type.to_string(),
            });
        };
        match family_code.to_ascii_lowercase() {
            'p' | 'g' => Ok(AcceleratorClass::Gpu),
            _ => Ok(AcceleratorClass::Cpu),
        }
    }

    /// Image tag fragment for this accelerator class
    pub fn tag(&self) -> &'static str {
        match self {
            AcceleratorClass::Cpu => "cpu-py310",
            AcceleratorClass::Gpu => "gpu-py310-cu111",
        }
    }
}

/// Look up the registry account publishing inference images in `region`
pub fn registry_account(region: &str) -> ImageResult<&'static str> {
    REGISTRY_ACCOUNTS
        .iter()
        .find(|(candidate, _)| *candidate == region)
        .map(|(_, account)| *account)
        .ok_or_else(|| ImageError::UnsupportedRegion {
            region: region.to_string(),
        })
}

/// Regions with a published inference image registry
pub fn supported_regions() -> impl Iterator<Item = &'static str> {
    REGISTRY_ACCOUNTS.iter().map(|(region, _)| *region)
}

/// A fully resolved inference container image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceImage {
    region: String,
    registry_account: &'static str,
    accelerator: AcceleratorClass,
}

impl InferenceImage {
    /// Resolve the image serving `instance_type` in `region`.
    ///
    /// Fails before anything is declared if the region has no registry or
    /// the instance type cannot be classified.
    pub fn for_instance(region: &str, instance_type: &str) -> ImageResult<Self> {
        let accelerator = AcceleratorClass::from_instance_type(instance_type)?;
        let registry_account = registry_account(region)?;
        Ok(Self {
            region: region.to_string(),
            registry_account,
            accelerator,
        })
    }

    pub fn accelerator(&self) -> AcceleratorClass {
        self.accelerator
    }

    /// The full registry URI for this image
    pub fn uri(&self) -> String {
        format!(
            "{account}.dkr.ecr.{region}.amazonaws.com/huggingface-pytorch-inference:{pytorch}-transformers{transformers}-{tag}-ubuntu20.04",
            account = self.registry_account,
            region = self.region,
            pytorch = PYTORCH_VERSION,
            transformers = TRANSFORMERS_VERSION,
            tag = self.accelerator.tag(),
        )
    }
}

//! External semantic classifier.
//!
//! The pipeline only depends on [`SemanticClassifier`]: images plus
//! instructions plus a strict output schema in, a JSON object matching that
//! schema out. Model identity and transport live behind the trait.

pub mod openai;
pub mod prompts;
pub mod schema;

use async_trait::async_trait;
use image::DynamicImage;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use openai::OpenAiClassifier;
pub use schema::{OutputSchema, RestPoseOutput, SocialOutput};

#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Non-success response or the request never completed.
    #[error("{0}")]
    Transport(String),

    /// The response does not match the requested schema.
    #[error("{0}")]
    Contract(String),
}

pub struct ClassifierRequest {
    /// Ordered oldest first
    pub images: Vec<DynamicImage>,
    pub instructions: String,
    pub schema: OutputSchema,
}

#[async_trait]
pub trait SemanticClassifier: Send + Sync {
    async fn classify(
        &self,
        api_key: &str,
        request: &ClassifierRequest,
    ) -> Result<Value, ClassifierError>;
}

/// Decode a classifier payload into its typed shape. Any structural mismatch is
/// a contract violation, whatever its cause.
pub fn parse_output<T: DeserializeOwned>(value: Value) -> Result<T, ClassifierError> {
    serde_json::from_value(value)
        .map_err(|err| ClassifierError::Contract(format!("malformed classifier output: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_required_field_is_contract_violation() {
        let err = parse_output::<RestPoseOutput>(json!({ "confidence": 0.9, "notes": "" }))
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Contract(msg) if msg.contains("resting_pose")));
    }

    #[test]
    fn parses_rest_pose_probe() {
        let out: RestPoseOutput =
            parse_output(json!({ "resting_pose": true, "confidence": 0.7, "notes": "hands on hips" }))
                .unwrap();
        assert!(out.resting_pose);
        assert_eq!(out.confidence, 0.7);
    }
}

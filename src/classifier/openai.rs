//! OpenAI Responses API transport for [`SemanticClassifier`].

use async_trait::async_trait;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::ClassifierConfig;

use super::{ClassifierError, ClassifierRequest, SemanticClassifier};

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct OpenAiClassifier {
    client: Client,
    config: ClassifierConfig,
}

impl OpenAiClassifier {
    pub fn new(config: ClassifierConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }

    /// Scale down to the upload cap and encode as a JPEG data URL.
    fn encode_frame(&self, image: &DynamicImage) -> Result<String, ClassifierError> {
        let (w, h) = (image.width(), image.height());
        let scaled;
        let image = if w > self.config.max_width || h > self.config.max_height {
            scaled = image.resize(self.config.max_width, self.config.max_height, FilterType::Triangle);
            &scaled
        } else {
            image
        };

        let rgb = image.to_rgb8();
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.config.jpeg_quality)
            .encode_image(&rgb)
            .map_err(|err| ClassifierError::Transport(format!("frame encoding failed: {err}")))?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        Ok(format!("data:image/jpeg;base64,{encoded}"))
    }

    fn build_payload(&self, request: &ClassifierRequest) -> Result<Value, ClassifierError> {
        let mut content = vec![json!({ "type": "input_text", "text": request.instructions })];
        for image in &request.images {
            content.push(json!({ "type": "input_image", "image_url": self.encode_frame(image)? }));
        }

        Ok(json!({
            "model": self.config.model,
            "input": [{ "role": "user", "content": content }],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": request.schema.name,
                    "schema": request.schema.schema,
                    "strict": true,
                }
            }
        }))
    }
}

#[async_trait]
impl SemanticClassifier for OpenAiClassifier {
    async fn classify(
        &self,
        api_key: &str,
        request: &ClassifierRequest,
    ) -> Result<Value, ClassifierError> {
        let payload = self.build_payload(request)?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(format!("classifier request failed: {e}")))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            log::error!("Classifier error payload: {body}");
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ClassifierError::Transport(message));
        }

        let text = response_text(&body)
            .ok_or_else(|| ClassifierError::Contract("No output text in response.".into()))?;

        serde_json::from_str(text)
            .map_err(|_| ClassifierError::Contract("Model output was not valid JSON.".into()))
    }
}

/// Output text of a Responses API body: `output_text` when present, else the
/// first non-empty `output_text` part of a message item.
fn response_text(body: &Value) -> Option<&str> {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        let text = text.trim();
        if !text.is_empty() {
            return Some(text);
        }
    }

    body.get("output")?
        .as_array()?
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("message"))
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::schema::rest_pose_schema;
    use image::{Rgb, RgbImage};

    #[test]
    fn prefers_top_level_output_text() {
        let body = json!({ "output_text": "  {\"a\":1}  ", "output": [] });
        assert_eq!(response_text(&body), Some("{\"a\":1}"));
    }

    #[test]
    fn falls_back_to_message_parts() {
        let body = json!({
            "output": [
                { "type": "reasoning", "content": [] },
                { "type": "message", "content": [
                    { "type": "output_text", "text": "   " },
                    { "type": "output_text", "text": "{\"b\":2}" }
                ]}
            ]
        });
        assert_eq!(response_text(&body), Some("{\"b\":2}"));
        assert_eq!(response_text(&json!({})), None);
    }

    #[test]
    fn payload_carries_schema_and_downscaled_images() {
        let classifier = OpenAiClassifier::new(ClassifierConfig::default()).unwrap();
        let request = ClassifierRequest {
            images: vec![DynamicImage::ImageRgb8(RgbImage::from_pixel(1920, 1080, Rgb([9, 9, 9])))],
            instructions: "probe".into(),
            schema: rest_pose_schema(),
        };

        let payload = classifier.build_payload(&request).unwrap();
        assert_eq!(payload["text"]["format"]["name"], "rest_pose");
        assert_eq!(payload["text"]["format"]["strict"], true);

        let content = payload["input"][0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert!(content[1]["image_url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
    }
}

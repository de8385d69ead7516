use crate::error::{ErrorInfo, ErrorKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The JSON object the text model is instructed to return.
///
/// Only `prompt` is strict. The descriptive keys accept whatever scalar or
/// structure the model wrote and keep it as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredPrompt {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub resolution_target: Option<String>,
    pub prompt: String,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// One candidate that was tried and did not answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub model: String,
    pub kind: ErrorKind,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationResult {
    pub used_model: Option<String>,
    pub raw_text: Option<String>,
    pub structured_prompt: Option<StructuredPrompt>,
    #[serde(skip)]
    pub image_bytes: Option<Vec<u8>>,
    pub envelope: Option<serde_json::Value>,
    pub failures: Vec<AttemptFailure>,
    pub error: Option<ErrorInfo>,
}

impl GenerationResult {
    pub fn failed(error: ErrorInfo) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub prompt_stage: GenerationResult,
    pub image_stage: Option<GenerationResult>,
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        self.prompt_stage.is_success()
            && self
                .image_stage
                .as_ref()
                .map_or(true, GenerationResult::is_success)
    }

    /// The first terminal error, in stage order.
    pub fn failure(&self) -> Option<&ErrorInfo> {
        self.prompt_stage.error.as_ref().or_else(|| {
            self.image_stage
                .as_ref()
                .and_then(|stage| stage.error.as_ref())
        })
    }

    pub fn failure_summary(&self) -> Option<String> {
        self.failure().map(|error| {
            let mut summary = format!(
                "{}\nKind: {}\nDetail: {}",
                error.summary, error.kind, error.detail
            );
            if error.attempts > 0 {
                summary.push_str(&format!("\nAttempts: {}", error.attempts));
            }
            if let Some(raw) = &error.raw_payload {
                summary.push_str(&format!("\nRaw response:\n{}", raw));
            }
            summary
        })
    }
}

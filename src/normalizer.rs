use crate::{
    error::{AdaptError, Result},
    models::{ResponseEnvelope, StructuredPrompt},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

const FENCE: &str = "```";

/// Removes a leading ```` ```lang ```` or bare fence and a trailing fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(FENCE) {
        // Drop the language tag, if any, up to the end of the opening line.
        text = match rest.find('\n') {
            Some(newline) if is_fence_tag(&rest[..newline]) => &rest[newline + 1..],
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

fn is_fence_tag(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ' | '\r'))
}

pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn normalize(raw_text: &str) -> Result<StructuredPrompt> {
        let cleaned = strip_code_fences(raw_text);
        let malformed = |detail: String| AdaptError::MalformedResponse {
            detail,
            raw: cleaned.to_string(),
        };

        let value: Value = serde_json::from_str(cleaned)
            .map_err(|e| malformed(format!("response is not valid JSON: {}", e)))?;

        let object = value
            .as_object()
            .ok_or_else(|| malformed("expected a JSON object".to_string()))?;

        match object.get("prompt") {
            Some(Value::String(_)) => {}
            Some(_) => return Err(malformed("\"prompt\" must be a string".to_string())),
            None => return Err(malformed("missing required key \"prompt\"".to_string())),
        }

        serde_json::from_value(value.clone()).map_err(|e| malformed(e.to_string()))
    }

    pub fn decode_image(envelope: &ResponseEnvelope) -> Result<Vec<u8>> {
        let Some(data) = envelope.image_base64() else {
            return Err(AdaptError::NoImageProduced {
                reason: envelope.missing_image_reason(),
                envelope: envelope.raw().clone(),
            });
        };

        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| AdaptError::MalformedResponse {
                detail: format!("image payload is not valid base64: {}", e),
                raw: envelope.raw().to_string(),
            })?;
        log::debug!("Decoded {} image bytes", bytes.len());
        Ok(bytes)
    }
}

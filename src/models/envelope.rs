use crate::{
    error::{AdaptError, Result},
    models::{
        candidate::EndpointStyle,
        gemini::{GenerateContentResponse, PredictResponse},
    },
};
use serde_json::Value;

/// A successful response body from either endpoint style.
///
/// The raw JSON is kept next to the typed view so callers can show it when
/// extraction comes up empty.
#[derive(Debug, Clone)]
pub enum ResponseEnvelope {
    Content {
        response: GenerateContentResponse,
        raw: Value,
    },
    Prediction {
        response: PredictResponse,
        raw: Value,
    },
}

impl ResponseEnvelope {
    pub fn from_json(style: EndpointStyle, raw: Value) -> Result<Self> {
        let shape_error =
            |e: serde_json::Error| AdaptError::UnknownModel(format!("Unexpected response shape: {}", e));
        match style {
            EndpointStyle::GenerateContent => Ok(ResponseEnvelope::Content {
                response: serde_json::from_value(raw.clone()).map_err(shape_error)?,
                raw,
            }),
            EndpointStyle::Predict => Ok(ResponseEnvelope::Prediction {
                response: serde_json::from_value(raw.clone()).map_err(shape_error)?,
                raw,
            }),
        }
    }

    pub fn from_body(style: EndpointStyle, body: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(body)
            .map_err(|e| AdaptError::UnknownModel(format!("Response was not JSON: {}", e)))?;
        Self::from_json(style, raw)
    }

    pub fn raw(&self) -> &Value {
        match self {
            ResponseEnvelope::Content { raw, .. } | ResponseEnvelope::Prediction { raw, .. } => raw,
        }
    }

    /// Concatenated text parts of the first candidate that has any.
    pub fn text(&self) -> Option<String> {
        let ResponseEnvelope::Content { response, .. } = self else {
            return None;
        };
        response.candidates.iter().find_map(|candidate| {
            let text: String = candidate
                .content
                .as_ref()?
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect();
            (!text.is_empty()).then_some(text)
        })
    }

    /// First non-empty base64 image payload, whichever shape carried it.
    pub fn image_base64(&self) -> Option<&str> {
        match self {
            ResponseEnvelope::Content { response, .. } => response
                .parts()
                .filter_map(|part| part.inline_data.as_ref())
                .map(|inline| inline.data.as_str())
                .find(|data| !data.is_empty()),
            ResponseEnvelope::Prediction { response, .. } => response
                .predictions
                .iter()
                .filter_map(|prediction| prediction.bytes_base64_encoded.as_deref())
                .find(|data| !data.is_empty()),
        }
    }

    /// Best guess at why no image came back.
    pub fn missing_image_reason(&self) -> String {
        match self {
            ResponseEnvelope::Content { response, .. } => {
                if let Some(reason) = response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|feedback| feedback.block_reason.as_deref())
                {
                    return format!("prompt blocked upstream ({})", reason);
                }
                if response.candidates.is_empty() {
                    return "response contained no candidates".to_string();
                }
                if let Some(reason) = response
                    .candidates
                    .iter()
                    .filter_map(|candidate| candidate.finish_reason.as_deref())
                    .find(|reason| *reason != "STOP")
                {
                    return format!("generation stopped early ({})", reason);
                }
                if let Some(text) = self.text() {
                    return format!("model returned text instead of an image: {}", text.trim());
                }
                "no inline image data in response parts".to_string()
            }
            ResponseEnvelope::Prediction { response, .. } => {
                if response.predictions.is_empty() {
                    "prediction list was empty, likely filtered upstream".to_string()
                } else {
                    "predictions carried no image bytes".to_string()
                }
            }
        }
    }
}

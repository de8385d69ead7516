use crate::{
    error::{AdaptError, Result},
    models::{
        gemini::{Content, GenerateContentRequest, GenerationConfig, ImageConfig, Part},
        EndpointStyle, ResponseEnvelope,
    },
    transport::ModelCall,
};
use reqwest::Client;

/// `models/{model}:generateContent` adapter. Serves text models and
/// image-output Gemini models alike.
#[derive(Clone)]
pub struct ContentClient {
    client: Client,
    api_base: String,
    temperature: Option<f32>,
}

impl ContentClient {
    pub fn new(client: Client, api_base: impl Into<String>, temperature: Option<f32>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            temperature,
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        model_endpoint(&self.api_base, model, EndpointStyle::GenerateContent)
    }

    /// An aspect ratio on the call means image output is wanted.
    pub fn build_request(&self, call: &ModelCall<'_>) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        if let Some(image) = call.image {
            parts.push(Part::image(image.mime_type.clone(), image.to_base64()));
        }
        parts.push(Part::text(call.user_text.clone()));

        let mut generation_config = GenerationConfig {
            temperature: self.temperature,
            ..Default::default()
        };
        if let Some(ratio) = call.aspect_ratio {
            generation_config.response_modalities = Some(vec!["TEXT".into(), "IMAGE".into()]);
            generation_config.image_config = Some(ImageConfig {
                aspect_ratio: ratio.as_str().to_string(),
            });
        }

        GenerateContentRequest {
            system_instruction: call.system_instruction.map(|system| Content {
                role: None,
                parts: vec![Part::text(system)],
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config,
        }
    }

    pub async fn generate(&self, call: &ModelCall<'_>, api_key: &str) -> Result<ResponseEnvelope> {
        let body = self.build_request(call);
        log::debug!(
            "generateContent {} (system channel: {}, image attached: {})",
            call.model,
            body.system_instruction.is_some(),
            call.image.is_some()
        );
        let response_body = post_json(&self.client, &self.endpoint(call.model), api_key, &body).await?;
        ResponseEnvelope::from_body(EndpointStyle::GenerateContent, &response_body)
    }
}

pub(crate) fn model_endpoint(api_base: &str, model: &str, style: EndpointStyle) -> String {
    let trimmed = model.trim();
    let model_path = if trimmed.starts_with("models/") {
        trimmed.to_string()
    } else {
        format!("models/{}", trimmed)
    };
    format!(
        "{}/{}:{}",
        api_base.trim_end_matches('/'),
        model_path,
        style.method()
    )
}

/// POSTs a JSON body with the key as query parameter and returns the
/// success body, or the classified failure.
pub(crate) async fn post_json<B: serde::Serialize + ?Sized>(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<String> {
    let response = client
        .post(url)
        .query(&[("key", api_key)])
        .json(body)
        .send()
        .await
        .map_err(|e| {
            log::error!("Request to {} failed: {}", url, e);
            AdaptError::from(e)
        })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AdaptError::Transport(format!("Failed to read response body: {}", e)))?;

    if !status.is_success() {
        return Err(AdaptError::from_status(status.as_u16(), &text));
    }
    Ok(text)
}

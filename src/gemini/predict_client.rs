use crate::{
    error::Result,
    gemini::content_client::{model_endpoint, post_json},
    models::{
        gemini::{PredictInstance, PredictParameters, PredictRequest},
        EndpointStyle, ResponseEnvelope,
    },
    transport::ModelCall,
};
use reqwest::Client;

/// `models/{model}:predict` adapter for Imagen-style text-to-image models.
#[derive(Clone)]
pub struct PredictClient {
    client: Client,
    api_base: String,
}

impl PredictClient {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        model_endpoint(&self.api_base, model, EndpointStyle::Predict)
    }

    pub fn build_request(&self, call: &ModelCall<'_>) -> PredictRequest {
        PredictRequest {
            instances: vec![PredictInstance {
                prompt: call.user_text.clone(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                aspect_ratio: call.aspect_ratio.map(|ratio| ratio.as_str().to_string()),
            },
        }
    }

    pub async fn generate(&self, call: &ModelCall<'_>, api_key: &str) -> Result<ResponseEnvelope> {
        if call.image.is_some() || call.system_instruction.is_some() {
            log::debug!("predict endpoint takes the prompt only; other inputs are not sent");
        }
        let body = self.build_request(call);
        log::info!("Generating image with model: {}", call.model);
        let response_body = post_json(&self.client, &self.endpoint(call.model), api_key, &body).await?;
        ResponseEnvelope::from_body(EndpointStyle::Predict, &response_body)
    }
}

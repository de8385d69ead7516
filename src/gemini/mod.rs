pub mod content_client;
pub mod predict_client;

use crate::{
    config::AdaptConfig,
    error::{AdaptError, Result},
    models::{EndpointStyle, ResponseEnvelope},
    transport::{ModelCall, ModelTransport},
};
use async_trait::async_trait;
use reqwest::Client;

pub use content_client::ContentClient;
pub use predict_client::PredictClient;

/// HTTP transport for the Gemini REST API. Cheap to clone and safe to share
/// across concurrent pipeline runs; the API key travels with each call.
#[derive(Clone)]
pub struct GeminiClient {
    content_client: ContentClient,
    predict_client: PredictClient,
}

impl GeminiClient {
    pub fn new(config: &AdaptConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AdaptError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            content_client: ContentClient::new(
                client.clone(),
                config.api_base.clone(),
                config.temperature,
            ),
            predict_client: PredictClient::new(client, config.api_base.clone()),
        })
    }

    pub fn content(&self) -> &ContentClient {
        &self.content_client
    }

    pub fn predict(&self) -> &PredictClient {
        &self.predict_client
    }
}

#[async_trait]
impl ModelTransport for GeminiClient {
    async fn dispatch(&self, call: &ModelCall<'_>, api_key: &str) -> Result<ResponseEnvelope> {
        match call.endpoint {
            EndpointStyle::GenerateContent => self.content_client.generate(call, api_key).await,
            EndpointStyle::Predict => self.predict_client.generate(call, api_key).await,
        }
    }
}

use crate::{
    composer::PromptComposer,
    error::{ErrorInfo, ErrorKind},
    invoker::{GenerationInput, ModelInvoker},
    logger,
    models::{AdaptationRequest, GenerationResult, ModelCandidate, PipelineResult, StructuredPrompt},
    normalizer::ResponseNormalizer,
    transport::ModelTransport,
};
use std::time::Duration;

/// Prompt stage, then the optional render stage.
pub struct GenerationPipeline<T> {
    invoker: ModelInvoker<T>,
}

impl<T: ModelTransport> GenerationPipeline<T> {
    pub fn new(transport: T, retry_delay: Duration) -> Self {
        Self {
            invoker: ModelInvoker::new(transport, retry_delay),
        }
    }

    pub fn invoker(&self) -> &ModelInvoker<T> {
        &self.invoker
    }

    pub async fn run(
        &self,
        request: &AdaptationRequest,
        api_key: &str,
        text_candidates: &[ModelCandidate],
        image_candidates: Option<&[ModelCandidate]>,
    ) -> PipelineResult {
        if api_key.trim().is_empty() {
            log::error!("No API key supplied, skipping generation");
            return PipelineResult {
                prompt_stage: GenerationResult::failed(ErrorInfo::new(
                    ErrorKind::Auth,
                    "An API key is required",
                    "api key was empty",
                )),
                image_stage: None,
            };
        }

        let prompt_stage = self.prompt_stage(request, api_key, text_candidates).await;

        let image_stage = match (image_candidates, prompt_stage.structured_prompt.as_ref()) {
            (Some(candidates), Some(structured)) if prompt_stage.is_success() => {
                Some(self.image_stage(request, structured, api_key, candidates).await)
            }
            _ => None,
        };

        PipelineResult {
            prompt_stage,
            image_stage,
        }
    }

    async fn prompt_stage(
        &self,
        request: &AdaptationRequest,
        api_key: &str,
        candidates: &[ModelCandidate],
    ) -> GenerationResult {
        let _timer = logger::timer("prompt stage");
        let composed = PromptComposer::compose(request);
        let input = GenerationInput {
            system_instruction: Some(composed.system_instruction),
            user_instruction: composed.user_instruction,
            image: Some(request.source_image.clone()),
            aspect_ratio: None,
        };

        let mut result = self.invoker.invoke(api_key, &input, candidates).await;
        if !result.is_success() {
            return result;
        }

        let Some(raw_text) = result.raw_text.clone() else {
            let mut error = ErrorInfo::new(
                ErrorKind::MalformedResponse,
                "The model answered without any text",
                "response contained no text parts",
            );
            error.raw_payload = result.envelope.as_ref().map(|envelope| envelope.to_string());
            result.error = Some(error);
            return result;
        };

        match ResponseNormalizer::normalize(&raw_text) {
            Ok(structured) => {
                log::info!("Structured prompt ready ({} chars)", structured.prompt.len());
                result.structured_prompt = Some(structured);
            }
            Err(e) => {
                log::warn!("Could not parse prompt from {:?}: {}", result.used_model, e);
                result.error = Some(ErrorInfo::from_error(
                    "The model reply was not the expected JSON prompt",
                    &e,
                ));
            }
        }
        result
    }

    async fn image_stage(
        &self,
        request: &AdaptationRequest,
        structured: &StructuredPrompt,
        api_key: &str,
        candidates: &[ModelCandidate],
    ) -> GenerationResult {
        let _timer = logger::timer("image stage");
        let input = GenerationInput {
            system_instruction: None,
            user_instruction: structured.prompt.clone(),
            image: Some(request.source_image.clone()),
            aspect_ratio: Some(request.target_platform.aspect_ratio()),
        };

        let invocation = self
            .invoker
            .invoke_with_envelope(api_key, &input, candidates)
            .await;
        let mut result = invocation.result;
        let Some(envelope) = invocation.envelope else {
            return result;
        };
        // Image stages carry bytes, never a parsed prompt.
        result.raw_text = None;

        match ResponseNormalizer::decode_image(&envelope) {
            Ok(bytes) => {
                // The envelope only matters for diagnosing a missing image.
                result.envelope = None;
                result.image_bytes = Some(bytes);
            }
            Err(e) => {
                log::warn!("No usable image from {:?}: {}", result.used_model, e);
                result.error = Some(ErrorInfo::from_error("No image was produced", &e));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EndpointStyle, Platform, SourceImage, TargetResolution};
    use crate::transport::fake::{Reply, ScriptedTransport};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde_json::json;

    fn request(platform: Platform) -> AdaptationRequest {
        AdaptationRequest::new(SourceImage::new("poster.jpg", vec![9, 9]).unwrap(), platform)
    }

    fn text_list() -> Vec<ModelCandidate> {
        vec![ModelCandidate::new("flash", 0), ModelCandidate::new("pro", 1)]
    }

    #[tokio::test]
    async fn test_prompt_stage_falls_back_after_quota() {
        let transport = ScriptedTransport::new()
            .reply("flash", Reply::Status(429, "quota"))
            .reply(
                "pro",
                Reply::Text("```json\n{\"prompt\":\"a neon-lit figure, vertical composition\"}\n```".into()),
            );
        let pipeline = GenerationPipeline::new(transport, Duration::ZERO);
        let request = request(Platform::TikTok).with_instruction("cyberpunk background");

        let result = pipeline.run(&request, "key", &text_list(), None).await;

        assert!(result.is_success());
        assert!(result.image_stage.is_none());
        let stage = result.prompt_stage;
        assert_eq!(stage.used_model.as_deref(), Some("pro"));
        assert!(stage.structured_prompt.unwrap().prompt.contains("neon-lit figure"));

        let calls = pipeline.invoker().transport().recorded();
        assert!(calls.iter().all(|c| c.has_image));
        assert!(calls[1].user_text.contains("User Requirement: cyberpunk background."));
    }

    #[tokio::test]
    async fn test_malformed_prompt_stops_pipeline() {
        let transport = ScriptedTransport::new()
            .reply("flash", Reply::Text("I would move the title up.".into()))
            .reply("pro", Reply::Text("{\"prompt\":\"unused\"}".into()))
            .reply("render", Reply::Json(json!({})));
        let pipeline = GenerationPipeline::new(transport, Duration::ZERO);
        let images = vec![ModelCandidate::new("render", 0)];

        let result = pipeline
            .run(&request(Platform::YouTube), "key", &text_list(), Some(&images))
            .await;

        let error = result.prompt_stage.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::MalformedResponse);
        assert_eq!(error.raw_payload.as_deref(), Some("I would move the title up."));
        assert_eq!(
            result.prompt_stage.raw_text.as_deref(),
            Some("I would move the title up.")
        );
        assert!(result.image_stage.is_none());

        // Content problems are not retried on the next model.
        let models: Vec<String> = pipeline
            .invoker()
            .transport()
            .recorded()
            .into_iter()
            .map(|c| c.model)
            .collect();
        assert_eq!(models, vec!["flash"]);
    }

    #[tokio::test]
    async fn test_image_stage_uses_prompt_and_ratio() {
        let encoded = STANDARD.encode([1u8, 2, 3, 4]);
        let transport = ScriptedTransport::new()
            .reply("flash", Reply::Text("{\"prompt\":\"square album art\"}".into()))
            .reply("gemini-image", Reply::Status(403, "not entitled"))
            .reply(
                "imagen",
                Reply::Json(json!({"predictions": [{"bytesBase64Encoded": encoded}]})),
            );
        let pipeline = GenerationPipeline::new(transport, Duration::ZERO);
        let images = vec![
            ModelCandidate::new("gemini-image", 0),
            ModelCandidate::new("imagen", 1).with_endpoint(EndpointStyle::Predict),
        ];
        let request = request(Platform::AlbumCover)
            .with_resolution(TargetResolution::Distribution)
            .unwrap();

        let result = pipeline.run(&request, "key", &text_list(), Some(&images)).await;

        assert!(result.is_success(), "{:?}", result.failure_summary());
        let image_stage = result.image_stage.unwrap();
        assert_eq!(image_stage.used_model.as_deref(), Some("imagen"));
        assert_eq!(image_stage.image_bytes, Some(vec![1, 2, 3, 4]));
        assert!(image_stage.structured_prompt.is_none());
        assert!(image_stage.envelope.is_none());
        assert_eq!(image_stage.failures.len(), 1);

        let calls = pipeline.invoker().transport().recorded();
        let render_call = calls.last().unwrap();
        assert_eq!(render_call.user_text, "square album art");
        assert_eq!(render_call.system_instruction, None);
        assert_eq!(render_call.aspect_ratio, Some(Platform::AlbumCover.aspect_ratio()));
    }

    #[tokio::test]
    async fn test_safety_filtered_image_keeps_envelope() {
        let transport = ScriptedTransport::new()
            .reply("flash", Reply::Text("{\"prompt\":\"p\"}".into()))
            .reply(
                "gemini-image",
                Reply::Json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
            );
        let pipeline = GenerationPipeline::new(transport, Duration::ZERO);
        let images = vec![ModelCandidate::new("gemini-image", 0)];

        let result = pipeline
            .run(&request(Platform::RedNote), "key", &text_list(), Some(&images))
            .await;

        let error = result.failure().unwrap();
        assert_eq!(error.kind, ErrorKind::NoImageProduced);
        assert!(error.detail.contains("SAFETY"));
        assert!(error.raw_payload.as_ref().unwrap().contains("blockReason"));
    }

    #[tokio::test]
    async fn test_blank_key_makes_no_calls() {
        let pipeline = GenerationPipeline::new(ScriptedTransport::new(), Duration::ZERO);
        let result = pipeline
            .run(&request(Platform::Instagram), "  ", &text_list(), None)
            .await;
        assert_eq!(result.failure().unwrap().kind, ErrorKind::Auth);
        assert!(pipeline.invoker().transport().recorded().is_empty());
    }
}

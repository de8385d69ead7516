use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;
use std::time::Duration;
use visualadapt::{
    AdaptError, AdaptationRequest, EndpointStyle, ErrorKind, GenerationPipeline, ModelCall,
    ModelCandidate, ModelTransport, Platform, ResponseEnvelope, Result, SourceImage,
};

/// First model is rate limited, every other model answers with the prompt.
struct RateLimitedFirst {
    calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ModelTransport for RateLimitedFirst {
    async fn dispatch(&self, call: &ModelCall<'_>, api_key: &str) -> Result<ResponseEnvelope> {
        self.calls
            .lock()
            .unwrap()
            .push((call.model.to_string(), api_key.to_string()));

        if call.model == "gemini-2.5-flash" {
            return Err(AdaptError::from_status(
                429,
                r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#,
            ));
        }
        ResponseEnvelope::from_json(
            EndpointStyle::GenerateContent,
            json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"prompt\":\"a neon-lit figure, vertical composition\"}"}]},
                    "finishReason": "STOP"
                }]
            }),
        )
    }
}

fn tiktok_request() -> AdaptationRequest {
    let image = SourceImage::new("thumbnail.png", vec![0x89, b'P', b'N', b'G']).unwrap();
    AdaptationRequest::new(image, Platform::TikTok).with_instruction("cyberpunk background")
}

#[tokio::test]
async fn tiktok_request_survives_rate_limited_primary() {
    let transport = RateLimitedFirst {
        calls: Mutex::new(Vec::new()),
    };
    let pipeline = GenerationPipeline::new(transport, Duration::ZERO);
    let candidates = vec![
        ModelCandidate::new("gemini-2.5-flash", 0),
        ModelCandidate::new("gemini-1.5-flash", 1),
        ModelCandidate::new("gemini-1.5-pro", 2),
    ];

    let result = pipeline
        .run(&tiktok_request(), "test-key", &candidates, None)
        .await;

    assert!(result.is_success());
    let stage = &result.prompt_stage;
    assert_eq!(stage.used_model.as_deref(), Some("gemini-1.5-flash"));
    assert_eq!(stage.failures.len(), 1);
    assert_eq!(stage.failures[0].kind, ErrorKind::Quota);
    assert!(stage
        .structured_prompt
        .as_ref()
        .unwrap()
        .prompt
        .contains("neon-lit figure"));

    let calls = pipeline.invoker().transport().calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, key)| key == "test-key"));
}

#[tokio::test]
async fn exhausted_candidates_report_instead_of_panicking() {
    let transport = RateLimitedFirst {
        calls: Mutex::new(Vec::new()),
    };
    let pipeline = GenerationPipeline::new(transport, Duration::ZERO);
    let candidates = vec![ModelCandidate::new("gemini-2.5-flash", 0)];

    let result = pipeline
        .run(&tiktok_request(), "test-key", &candidates, None)
        .await;

    assert!(!result.is_success());
    let error = result.failure().unwrap();
    assert_eq!(error.kind, ErrorKind::Quota);
    assert_eq!(error.attempts, 1);
    assert!(result.failure_summary().unwrap().contains("RESOURCE_EXHAUSTED"));
}

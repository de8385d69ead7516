use crate::{
    error::{AdaptError, ErrorInfo, ErrorKind},
    models::{candidate, AspectRatio, AttemptFailure, GenerationResult, ModelCandidate, ResponseEnvelope, SourceImage},
    transport::{ModelCall, ModelTransport},
};
use std::time::Duration;

/// What a stage wants generated, independent of which model answers.
#[derive(Debug, Clone, Default)]
pub struct GenerationInput {
    pub system_instruction: Option<String>,
    pub user_instruction: String,
    pub image: Option<SourceImage>,
    pub aspect_ratio: Option<AspectRatio>,
}

/// Successful dispatch plus the bookkeeping the caller reports on.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub result: GenerationResult,
    pub envelope: Option<ResponseEnvelope>,
}

/// Tries candidates one at a time until one answers.
pub struct ModelInvoker<T> {
    transport: T,
    retry_delay: Duration,
}

impl<T: ModelTransport> ModelInvoker<T> {
    pub fn new(transport: T, retry_delay: Duration) -> Self {
        Self {
            transport,
            retry_delay,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn invoke(
        &self,
        api_key: &str,
        input: &GenerationInput,
        candidates: &[ModelCandidate],
    ) -> GenerationResult {
        self.invoke_with_envelope(api_key, input, candidates)
            .await
            .result
    }

    /// Same as [`invoke`](Self::invoke), but also hands back the typed envelope
    /// of the winning call so later stages can decode it.
    pub async fn invoke_with_envelope(
        &self,
        api_key: &str,
        input: &GenerationInput,
        candidates: &[ModelCandidate],
    ) -> Invocation {
        let ordered = candidate::ordered(candidates);
        if ordered.is_empty() {
            return Invocation {
                result: GenerationResult::failed(ErrorInfo::new(
                    ErrorKind::UnknownModel,
                    "No candidate models configured",
                    "candidate list was empty",
                )),
                envelope: None,
            };
        }

        let mut failures: Vec<AttemptFailure> = Vec::new();
        let mut last_error: Option<AdaptError> = None;

        for (index, candidate) in ordered.iter().enumerate() {
            if index > 0 && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }

            let call = build_call(candidate, input);
            log::info!(
                "Attempt {}/{} with model: {}",
                index + 1,
                ordered.len(),
                candidate.identifier
            );

            match self.transport.dispatch(&call, api_key).await {
                Ok(envelope) => {
                    log::info!("Model {} answered", candidate.identifier);
                    let raw_text = envelope.text();
                    return Invocation {
                        result: GenerationResult {
                            used_model: Some(candidate.identifier.clone()),
                            raw_text,
                            envelope: Some(envelope.raw().clone()),
                            failures,
                            ..Default::default()
                        },
                        envelope: Some(envelope),
                    };
                }
                Err(e) => {
                    log::warn!("Model {} failed ({}): {}", candidate.identifier, e.kind(), e);
                    failures.push(AttemptFailure {
                        model: candidate.identifier.clone(),
                        kind: e.kind(),
                        detail: e.to_string(),
                    });
                    if !e.is_retryable() {
                        // Content problems would repeat on the next model.
                        let error = ErrorInfo::from_error(
                            format!("Model {} returned an unusable reply", candidate.identifier),
                            &e,
                        )
                        .with_attempts(failures.len());
                        log::error!("{}", error);
                        return Invocation {
                            result: GenerationResult {
                                used_model: Some(candidate.identifier.clone()),
                                failures,
                                error: Some(error),
                                ..Default::default()
                            },
                            envelope: None,
                        };
                    }
                    last_error = Some(e);
                }
            }
        }

        let attempts = failures.len();
        let error = match last_error {
            Some(e) => ErrorInfo::from_error(format!("All {} candidate models failed", attempts), &e),
            None => ErrorInfo::new(ErrorKind::UnknownModel, "All candidate models failed", ""),
        }
        .with_attempts(attempts);
        log::error!("{}", error);

        Invocation {
            result: GenerationResult {
                failures,
                error: Some(error),
                ..Default::default()
            },
            envelope: None,
        }
    }
}

fn build_call<'a>(candidate: &'a ModelCandidate, input: &'a GenerationInput) -> ModelCall<'a> {
    let system = input
        .system_instruction
        .as_deref()
        .filter(|system| !system.trim().is_empty());

    let (system_instruction, user_text) = match system {
        Some(system) if !candidate.supports_system_instruction => (
            None,
            format!("{}\n\n{}", system, input.user_instruction),
        ),
        _ => (system, input.user_instruction.clone()),
    };

    ModelCall {
        model: &candidate.identifier,
        endpoint: candidate.endpoint,
        system_instruction,
        user_text,
        image: input.image.as_ref(),
        aspect_ratio: input.aspect_ratio,
    }
}

//! Recomposes creator artwork for a target platform through Gemini.
//!
//! A request flows through [`PromptComposer`], [`ModelInvoker`] and
//! [`ResponseNormalizer`], orchestrated by [`GenerationPipeline`]. Model
//! availability is handled by trying an ordered list of [`ModelCandidate`]s.

pub mod composer;
pub mod config;
pub mod error;
pub mod gemini;
pub mod invoker;
pub mod logger;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod transport;

pub use composer::{ComposedPrompt, PromptComposer, SYSTEM_INSTRUCTION};
pub use config::{default_image_candidates, default_text_candidates, AdaptConfig};
pub use error::{AdaptError, ErrorInfo, ErrorKind, Result};
pub use gemini::GeminiClient;
pub use invoker::{GenerationInput, ModelInvoker};
pub use models::{
    AdaptationRequest, AspectRatio, EndpointStyle, GenerationResult, ModelCandidate,
    PipelineResult, Platform, ResponseEnvelope, SourceImage, StructuredPrompt, TargetResolution,
};
pub use normalizer::ResponseNormalizer;
pub use pipeline::GenerationPipeline;
pub use transport::{ModelCall, ModelTransport};

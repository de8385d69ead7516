use crate::{
    error::Result,
    models::{AspectRatio, EndpointStyle, ResponseEnvelope, SourceImage},
};
use async_trait::async_trait;

/// A fully resolved call against one candidate model.
#[derive(Debug, Clone)]
pub struct ModelCall<'a> {
    pub model: &'a str,
    pub endpoint: EndpointStyle,
    /// `None` when the candidate takes its instruction inline.
    pub system_instruction: Option<&'a str>,
    pub user_text: String,
    pub image: Option<&'a SourceImage>,
    pub aspect_ratio: Option<AspectRatio>,
}

#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn dispatch(&self, call: &ModelCall<'_>, api_key: &str) -> Result<ResponseEnvelope>;
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::error::AdaptError;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub enum Reply {
        Status(u16, &'static str),
        Malformed(&'static str),
        Text(String),
        Json(Value),
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub model: String,
        pub system_instruction: Option<String>,
        pub user_text: String,
        pub has_image: bool,
        pub aspect_ratio: Option<AspectRatio>,
    }

    /// Answers each model with a fixed reply and records what it was asked.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: HashMap<String, Reply>,
        pub calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(mut self, model: &str, reply: Reply) -> Self {
            self.replies.insert(model.to_string(), reply);
            self
        }

        pub fn recorded(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelTransport for ScriptedTransport {
        async fn dispatch(&self, call: &ModelCall<'_>, _api_key: &str) -> Result<ResponseEnvelope> {
            self.calls.lock().unwrap().push(RecordedCall {
                model: call.model.to_string(),
                system_instruction: call.system_instruction.map(str::to_string),
                user_text: call.user_text.clone(),
                has_image: call.image.is_some(),
                aspect_ratio: call.aspect_ratio,
            });
            match self.replies.get(call.model) {
                Some(Reply::Status(status, body)) => Err(AdaptError::from_status(*status, body)),
                Some(Reply::Malformed(raw)) => Err(AdaptError::MalformedResponse {
                    detail: "reply was not JSON".to_string(),
                    raw: raw.to_string(),
                }),
                Some(Reply::Text(text)) => ResponseEnvelope::from_json(
                    call.endpoint,
                    json!({"candidates": [{"content": {"parts": [{"text": text}]}, "finishReason": "STOP"}]}),
                ),
                Some(Reply::Json(value)) => ResponseEnvelope::from_json(call.endpoint, value.clone()),
                None => Err(AdaptError::Transport(format!("no route to {}", call.model))),
            }
        }
    }
}

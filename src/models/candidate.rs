use serde::{Deserialize, Serialize};

/// Wire shape a candidate model is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointStyle {
    GenerateContent,
    Predict,
}

impl EndpointStyle {
    pub fn method(&self) -> &'static str {
        match self {
            EndpointStyle::GenerateContent => "generateContent",
            EndpointStyle::Predict => "predict",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub identifier: String,
    pub supports_system_instruction: bool,
    /// Lower values are tried first.
    pub priority: u32,
    pub endpoint: EndpointStyle,
}

impl ModelCandidate {
    pub fn new(identifier: impl Into<String>, priority: u32) -> Self {
        Self {
            identifier: identifier.into(),
            supports_system_instruction: true,
            priority,
            endpoint: EndpointStyle::GenerateContent,
        }
    }

    /// Older models reject a dedicated system instruction field.
    pub fn legacy(mut self) -> Self {
        self.supports_system_instruction = false;
        self
    }

    pub fn with_endpoint(mut self, endpoint: EndpointStyle) -> Self {
        self.endpoint = endpoint;
        self
    }
}

/// Returns the candidates in attempt order. Ties keep their list order.
pub fn ordered(candidates: &[ModelCandidate]) -> Vec<&ModelCandidate> {
    let mut ordered: Vec<&ModelCandidate> = candidates.iter().collect();
    ordered.sort_by_key(|candidate| candidate.priority);
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_is_stable_by_priority() {
        let list = vec![
            ModelCandidate::new("c", 2),
            ModelCandidate::new("a", 0),
            ModelCandidate::new("b1", 1),
            ModelCandidate::new("b2", 1),
        ];
        let ids: Vec<&str> = ordered(&list)
            .iter()
            .map(|c| c.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b1", "b2", "c"]);
    }

    #[test]
    fn test_builders() {
        let candidate = ModelCandidate::new("imagen", 0)
            .legacy()
            .with_endpoint(EndpointStyle::Predict);
        assert!(!candidate.supports_system_instruction);
        assert_eq!(candidate.endpoint.method(), "predict");
    }
}

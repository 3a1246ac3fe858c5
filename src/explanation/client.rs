use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prompt::{build_prompt, parse_explanation};
use super::{Explanation, ExplanationError, ExplanationProvider, ExplanationRequest};
use crate::config::ExplanationConfig;

const TEMPERATURE: f32 = 0.2;

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
///
/// Blocking: call from a worker thread, never from an async task.
pub struct ChatCompletionsExplainer {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ChatCompletionsExplainer {
    pub fn new(config: &ExplanationConfig, api_key: &str) -> Result<Self, ExplanationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExplanationError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.to_string(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }
}

/// Request body for `/chat/completions`
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response body from `/chat/completions`
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ExplanationProvider for ChatCompletionsExplainer {
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<Explanation, ExplanationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let prompt = build_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExplanationError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    ExplanationError::Timeout(self.timeout_secs)
                } else {
                    ExplanationError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExplanationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ExplanationError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExplanationError::Malformed("No completion content".into()))?;

        tracing::debug!(chars = content.len(), "Explanation received");
        parse_explanation(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskScore;

    fn config(base_url: &str, timeout_secs: u64) -> ExplanationConfig {
        ExplanationConfig {
            base_url: base_url.into(),
            model: "llama-3.1-8b-instant".into(),
            api_key: Some("test-key".into()),
            timeout_secs,
        }
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let client =
            ChatCompletionsExplainer::new(&config("https://api.groq.com/openai/v1/", 20), "k")
                .unwrap();
        assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(client.timeout_secs, 20);
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: [ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: TEMPERATURE,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["model"], "m");
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn unreachable_service_is_connection_error() {
        // Port 9 (discard) on loopback: nothing listens in test environments.
        let client = ChatCompletionsExplainer::new(&config("http://127.0.0.1:9", 2), "k").unwrap();
        let request = ExplanationRequest {
            symptoms: "itchy rash",
            risk_score: RiskScore::Points(1),
            urgency: "Routine",
            primary_condition: "Low Risk Condition",
            redness_ratio: 0.0,
        };
        assert!(matches!(
            client.explain(&request),
            Err(ExplanationError::Connection(_) | ExplanationError::Timeout(_))
        ));
    }
}

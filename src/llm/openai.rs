//! `OpenAI` and Azure `OpenAI` chat-completions provider

use super::types::{LlmMessage, LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on a single HTTP exchange; nodes apply their own, shorter timeout.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 5000;

/// Where chat completions are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAIEndpoint {
    /// `OpenAI` or any compatible server, bearer auth
    OpenAI { base_url: String, model: String },
    /// Azure deployment, `api-key` header auth
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

impl OpenAIEndpoint {
    fn url(&self) -> String {
        match self {
            OpenAIEndpoint::OpenAI { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
            OpenAIEndpoint::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
                endpoint.trim_end_matches('/')
            ),
        }
    }

    fn model_id(&self) -> &str {
        match self {
            OpenAIEndpoint::OpenAI { model, .. } => model,
            OpenAIEndpoint::Azure { deployment, .. } => deployment,
        }
    }
}

/// OpenAI-compatible service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    endpoint: OpenAIEndpoint,
    url: String,
    model_id: String,
}

impl OpenAIService {
    pub fn new(api_key: String, endpoint: OpenAIEndpoint) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            url: endpoint.url(),
            model_id: endpoint.model_id().to_string(),
            endpoint,
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if !request.system.is_empty() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(Self::translate_message));

        let model = match &self.endpoint {
            OpenAIEndpoint::OpenAI { model, .. } => Some(model.clone()),
            // Azure selects the model through the deployment in the URL
            OpenAIEndpoint::Azure { .. } => None,
        };

        OpenAIRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens.unwrap_or(DEFAULT_MAX_COMPLETION_TOKENS)),
            stream: false,
        }
    }

    fn translate_message(msg: &LlmMessage) -> OpenAIMessage {
        let role = match msg.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        OpenAIMessage {
            role: role.to_string(),
            content: msg.text.clone(),
        }
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        let usage = resp.usage.unwrap_or_default();
        Ok(LlmResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: Usage {
                input_tokens: u64::from(usage.prompt_tokens),
                output_tokens: u64::from(usage.completion_tokens),
            },
        })
    }

    fn classify_error(status: reqwest::StatusCode, body: &str) -> LlmError {
        let Ok(error_resp) = serde_json::from_str::<OpenAIErrorResponse>(body) else {
            return LlmError::unknown(format!("HTTP {status} error: {body}"));
        };
        let message = error_resp.error.message;
        match status.as_u16() {
            401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
            429 => LlmError::rate_limit(format!("Rate limit exceeded: {message}")),
            400 => LlmError::invalid_request(format!("Invalid request: {message}")),
            500..=599 => LlmError::server_error(format!("Server error: {message}")),
            _ => LlmError::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let openai_request = self.translate_request(request);

        let builder = self.client.post(&self.url).json(&openai_request);
        let builder = match &self.endpoint {
            OpenAIEndpoint::OpenAI { .. } => builder.bearer_auth(&self.api_key),
            OpenAIEndpoint::Azure { .. } => builder.header("api-key", &self.api_key),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                LlmError::network(format!("Connection failed: {e}"))
            } else {
                LlmError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_error(status, &body));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;

    fn azure() -> OpenAIEndpoint {
        OpenAIEndpoint::Azure {
            endpoint: "https://example.openai.azure.com/".to_string(),
            deployment: "gpt-4o".to_string(),
            api_version: "2023-12-01-preview".to_string(),
        }
    }

    #[test]
    fn test_endpoint_urls() {
        assert_eq!(
            azure().url(),
            "https://example.openai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2023-12-01-preview"
        );
        let openai = OpenAIEndpoint::OpenAI {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        };
        assert_eq!(openai.url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(openai.model_id(), "gpt-4o-mini");
    }

    #[test]
    fn test_translate_request_puts_system_first() {
        let service = OpenAIService::new("key".to_string(), azure()).unwrap();
        let request = LlmRequest::new(
            "You are an analyst.",
            vec![LlmMessage::user("hi"), LlmMessage::assistant("hello")],
        );
        let translated = service.translate_request(&request);

        assert!(translated.model.is_none());
        assert_eq!(translated.max_completion_tokens, Some(5000));
        let roles: Vec<_> = translated.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
    }

    #[test]
    fn test_normalize_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Done."}}],"usage":{"prompt_tokens":12,"completion_tokens":3}}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        let response = OpenAIService::normalize_response(parsed).unwrap();
        assert_eq!(response.text, "Done.");
        assert_eq!(response.usage.input_tokens, 12);
    }

    #[test]
    fn test_empty_choices_is_an_error() {
        let parsed: OpenAIResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(OpenAIService::normalize_response(parsed).is_err());
    }

    #[test]
    fn test_classify_error() {
        let body = r#"{"error":{"message":"slow down"}}"#;
        let err = OpenAIService::classify_error(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(err.kind, LlmErrorKind::RateLimit);

        let err = OpenAIService::classify_error(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.kind, LlmErrorKind::Unknown);
    }
}

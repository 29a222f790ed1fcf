//! Provider selection from configuration

use super::{LlmError, LlmRequest, LlmResponse, LlmService, LoggingService};
use super::{OpenAIEndpoint, OpenAIService};
use async_trait::async_trait;
use std::sync::Arc;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
const DEFAULT_AZURE_API_VERSION: &str = "2023-12-01-preview";

const DEV_RESPONSE: &str = "This is a mock response for development.";

/// Configuration for the completion provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_model: Option<String>,
    pub azure_api_key: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_api_version: Option<String>,
    pub azure_deployment: Option<String>,
}

impl LlmConfig {
    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            openai_model: get("OPENAI_MODEL"),
            azure_api_key: get("AZURE_OPENAI_API_KEY"),
            azure_endpoint: get("AZURE_OPENAI_ENDPOINT"),
            azure_api_version: get("AZURE_OPENAI_API_VERSION"),
            azure_deployment: get("AZURE_OPENAI_DEPLOYMENT_NAME"),
        }
    }

    /// The endpoint and key to use. Azure wins when fully configured.
    fn endpoint(&self) -> Option<(String, OpenAIEndpoint)> {
        if let (Some(key), Some(endpoint), Some(deployment)) = (
            &self.azure_api_key,
            &self.azure_endpoint,
            &self.azure_deployment,
        ) {
            return Some((
                key.clone(),
                OpenAIEndpoint::Azure {
                    endpoint: endpoint.clone(),
                    deployment: deployment.clone(),
                    api_version: self
                        .azure_api_version
                        .clone()
                        .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
                },
            ));
        }

        let key = self.openai_api_key.as_ref()?;
        Some((
            key.clone(),
            OpenAIEndpoint::OpenAI {
                base_url: self
                    .openai_base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                model: self
                    .openai_model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            },
        ))
    }
}

/// Build the completion service, wrapped with request logging.
///
/// Without credentials the development service is returned so the rest of
/// the system can still start.
pub fn build_service(config: &LlmConfig) -> Result<Arc<dyn LlmService>, LlmError> {
    let inner: Arc<dyn LlmService> = match config.endpoint() {
        Some((api_key, endpoint)) => {
            tracing::info!(endpoint = ?endpoint, "Initializing completion provider");
            Arc::new(OpenAIService::new(api_key, endpoint)?)
        }
        None => {
            tracing::warn!(
                "No provider credentials set (OPENAI_API_KEY or AZURE_OPENAI_*); using development responses"
            );
            Arc::new(DevService)
        }
    };
    Ok(Arc::new(LoggingService::new(inner)))
}

/// Canned provider for running without credentials
struct DevService;

#[async_trait]
impl LlmService for DevService {
    async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        Ok(LlmResponse::text(DEV_RESPONSE))
    }

    fn model_id(&self) -> &str {
        "development"
    }
}

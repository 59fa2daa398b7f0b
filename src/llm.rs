use crate::config::LLMConfig;
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    model: Option<String>,
}

impl ModelEntry {
    fn identifier(&self) -> &str {
        self.model.as_deref().unwrap_or(&self.name)
    }
}

/// Result of asking the backend whether a model is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelAvailability {
    Present { name: String },
    Missing { installed: Vec<String> },
}

impl ModelAvailability {
    /// A requested name matches any installed identifier it is a prefix of,
    /// so `llama3` finds `llama3:latest`.
    pub fn resolve(requested: &str, installed: Vec<String>) -> Self {
        match installed.iter().find(|id| id.starts_with(requested)) {
            Some(name) => Self::Present { name: name.clone() },
            None => Self::Missing { installed },
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }
}

/// The two operations the consultant needs from an inference service.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Identifiers of all locally installed models.
    async fn list_models(&self) -> Result<Vec<String>, BackendError>;

    /// One blocking round trip: send a single user message, get the full reply.
    async fn chat(&self, model: &str, prompt: &str) -> Result<String, BackendError>;

    async fn check_model(&self, model: &str) -> Result<ModelAvailability, BackendError> {
        let installed = self.list_models().await?;
        Ok(ModelAvailability::resolve(model, installed))
    }
}

pub struct OllamaClient {
    config: LLMConfig,
    client: Client,
}

impl OllamaClient {
    pub fn new(config: LLMConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| BackendError::Unexpected {
                context: "building HTTP client".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    async fn error_for_status(
        &self,
        context: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BackendError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Unexpected {
            context: context.to_string(),
            message: format!("HTTP {status}: {}", body.trim()),
        })
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let url = self.endpoint("/api/tags");
        tracing::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::from_listing(self.base_url(), "listing models", e))?;
        let response = self.error_for_status("listing models", response).await?;

        let tags: TagsResponse = response.json().await.map_err(|e| BackendError::Unexpected {
            context: "listing models".to_string(),
            message: e.to_string(),
        })?;

        let models: Vec<String> = tags
            .models
            .iter()
            .map(|m| m.identifier().to_string())
            .collect();
        tracing::debug!("Installed models: {}", models.join(", "));
        Ok(models)
    }

    async fn chat(&self, model: &str, prompt: &str) -> Result<String, BackendError> {
        let url = self.endpoint("/api/chat");
        let payload = ChatRequest {
            model,
            messages: vec![ChatMessage::user(prompt)],
            stream: false,
            options: self
                .config
                .temperature
                .map(|temperature| ChatOptions { temperature }),
        };

        tracing::debug!("POST {url} model={model} prompt_chars={}", prompt.len());

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BackendError::from_transport(self.base_url(), "chat completion", e))?;
        let response = self.error_for_status("chat completion", response).await?;

        let reply: ChatResponse = response.json().await.map_err(|e| BackendError::Unexpected {
            context: "chat completion".to_string(),
            message: format!("invalid response format from Ollama: {e}"),
        })?;

        tracing::debug!("Reply: {} chars", reply.message.content.len());
        Ok(reply.message.content)
    }
}

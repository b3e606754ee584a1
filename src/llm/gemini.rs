use super::{CompletionProvider, CompletionRequest};
use crate::config::{LlmConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::error::{EvalError, Result, Service};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::error;

pub struct GeminiClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl Default for GeminiClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: 0.7,
            max_output_tokens: 8192,
        }
    }
}

impl GeminiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn build(self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EvalError::Config("GEMINI_API_KEY is not set".to_string()))?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        Ok(GeminiClient {
            http: Client::builder()
                .user_agent(crate::version::get_useragent())
                .build()?,
            endpoint: format!(
                "{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                self.model
            ),
            api_key,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        })
    }
}

/// `generateContent` client using structured (schema-constrained) output.
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }],
            },
            "contents": [{
                "parts": [{ "text": request.prompt }],
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": self.max_output_tokens,
                "responseMimeType": "application/json",
                "responseSchema": request.schema,
            },
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete_json(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "gemini error: {}", body);
            return Err(EvalError::Upstream {
                service: Service::Completion,
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        Ok(payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

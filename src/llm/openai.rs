use super::{CompletionProvider, CompletionRequest};
use crate::config::LlmConfig;
use crate::error::{EvalError, Result, Service};
use async_openai::{
    config::OPENAI_API_BASE,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse, ResponseFormat,
        ResponseFormatJsonSchema,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use tracing::error;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const SCHEMA_NAME: &str = "evaluation_report";

pub struct OpenAiClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl Default for OpenAiClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 8192,
        }
    }
}

impl OpenAiClientBuilder {
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
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
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

    pub fn build(self) -> Result<OpenAiClient> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EvalError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let base_url = self.base_url.unwrap_or_else(|| OPENAI_API_BASE.to_string());

        Ok(OpenAiClient {
            http: Client::builder()
                .user_agent(crate::version::get_useragent())
                .build()?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

/// Chat-completions client; the schema is sent as a `json_schema` response format.
/// One POST per call, no client-side retry.
pub struct OpenAiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

fn invalid_request(e: OpenAIError) -> EvalError {
    EvalError::Config(format!("invalid completion request: {}", e))
}

impl OpenAiClient {
    fn chat_request(&self, request: &CompletionRequest) -> Result<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_instruction.as_str())
                .build()
                .map_err(invalid_request)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt.as_str())
                .build()
                .map_err(invalid_request)?
                .into(),
        ];

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: SCHEMA_NAME.to_string(),
                    schema: Some(request.schema.clone()),
                    strict: None,
                },
            })
            .build()
            .map_err(invalid_request)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete_json(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.chat_request(request)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, status = status.as_u16(), "openai error: {}", body);
            return Err(EvalError::Upstream {
                service: Service::Completion,
                status: status.as_u16(),
                body,
            });
        }

        let reply: CreateChatCompletionResponse = response.json().await?;
        Ok(reply
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default())
    }
}

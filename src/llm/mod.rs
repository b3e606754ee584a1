use crate::config::{LlmConfig, LlmProvider};
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub mod gemini;
pub mod openai;

pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use openai::{OpenAiClient, OpenAiClientBuilder};

/// Characters of a bad reply echoed back to the caller for diagnostics.
pub const RESPONSE_PREVIEW_CHARS: usize = 500;

/// One structured-output completion: a system framing, a single user
/// message, and the JSON schema the reply must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub prompt: String,
    pub schema: Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw reply text. Non-2xx answers surface as `EvalError::Upstream`.
    async fn complete_json(&self, request: &CompletionRequest) -> Result<String>;
}

pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn CompletionProvider>> {
    Ok(match config.provider {
        LlmProvider::Gemini => Arc::new(GeminiClientBuilder::from_config(config).build()?),
        LlmProvider::OpenAi => Arc::new(OpenAiClientBuilder::from_config(config).build()?),
    })
}

/// JSON document inside a reply: markdown fences are dropped, then the
/// outermost `{...}` span is taken when prose surrounds it.
pub fn json_body(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        body = rest.strip_suffix("```").unwrap_or(rest).trim();
    }
    if body.starts_with('{') || body.starts_with('[') {
        return body;
    }
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => &body[start..=end],
        _ => body,
    }
}

/// Single attempt, no retry: the caller is waiting on the result.
pub async fn request_evaluation(
    provider: &dyn CompletionProvider,
    request: &CompletionRequest,
) -> Result<Value> {
    let start_time = Instant::now();
    let text = provider.complete_json(request).await?;
    info!(
        provider = provider.name(),
        length = text.len(),
        elapsed = start_time.elapsed().as_millis() as u64,
        "completion received"
    );

    serde_json::from_str(json_body(&text)).map_err(|e| {
        error!(provider = provider.name(), "failed to parse completion: {}", e);
        EvalError::MalformedResponse {
            reason: e.to_string(),
            preview: crate::utils::preview(&text, RESPONSE_PREVIEW_CHARS).to_string(),
        }
    })
}

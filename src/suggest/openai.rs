//! OpenAI-compatible chat completions provider (OpenAI, Ollama, vLLM).

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};

use super::{schema, status_error, SuggestError, SuggestionContext, SuggestionProvider};
use crate::config::LlmConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You answer with a single JSON object and nothing else.";

pub struct OpenAiProvider {
    client: ClientWithMiddleware,
    base_url: String,
    model: String,
    /// Self-hosted endpoints usually run without a key.
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(cfg: &LlmConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::build_http_client(cfg)?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key: cfg
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from),
        })
    }

    fn endpoint(&self) -> String {
        // accept base URLs given with or without the /v1 suffix
        let base = self.base_url.strip_suffix("/v1").unwrap_or(&self.base_url);
        format!("{}/v1/chat/completions", base)
    }

    fn request_body(&self, ctx: &SuggestionContext) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": ctx.prompt() }
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7
        })
    }
}

#[async_trait]
impl SuggestionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn suggest(&self, ctx: &SuggestionContext) -> Result<Vec<String>, SuggestError> {
        let mut req = self
            .client
            .post(self.endpoint())
            .json(&self.request_body(ctx));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let body: Value = resp.json().await?;
        let content = body
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|a| a.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| SuggestError::Malformed("response has no message content".into()))?;

        schema::parse_model_output(content)
    }
}

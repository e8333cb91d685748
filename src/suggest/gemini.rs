//! Google Generative Language API (`generateContent`) provider.

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::{json, Value};

use super::{schema, status_error, SuggestError, SuggestionContext, SuggestionProvider};
use crate::config::LlmConfig;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub struct GeminiProvider {
    client: ClientWithMiddleware,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let api_key = cfg
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow::anyhow!("gemini provider needs CANTEEN_LLM_API_KEY"))?
            .to_string();

        Ok(Self {
            client: super::build_http_client(cfg)?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_body(ctx: &SuggestionContext) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": ctx.prompt() }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema::gemini_response_schema(),
                "temperature": 0.7
            }
        })
    }
}

#[async_trait]
impl SuggestionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn suggest(&self, ctx: &SuggestionContext) -> Result<Vec<String>, SuggestError> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(ctx))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let body: Value = resp.json().await?;
        let text = body["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .and_then(|c| c["content"]["parts"].as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
            .ok_or_else(|| SuggestError::Malformed("response has no candidate text".into()))?;

        schema::parse_model_output(&text)
    }
}

use std::str::FromStr;

use crate::suggest::{gemini, openai};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Load the sample counter orders at startup.
    pub seed_demo: bool,
    /// Extra CORS origin allowed next to localhost.
    pub dashboard_origin: String,
    pub log_format: LogFormat,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Gemini,
    OpenAi,
    Disabled,
}

impl FromStr for LlmProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" | "googleai" => Ok(LlmProviderKind::Gemini),
            "openai" | "ollama" | "openai-compatible" => Ok(LlmProviderKind::OpenAi),
            "disabled" | "none" | "off" => Ok(LlmProviderKind::Disabled),
            other => anyhow::bail!(
                "unknown CANTEEN_LLM_PROVIDER '{}'. Must be one of gemini, openai, disabled",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Wall-clock budget for one suggestion request.
    pub timeout_secs: u64,
    /// Transient-failure retries inside that budget.
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn disabled() -> Self {
        Self {
            provider: LlmProviderKind::Disabled,
            api_key: None,
            model: String::new(),
            base_url: String::new(),
            timeout_secs: 15,
            max_retries: 0,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Builds the config from any variable source; `load` passes the process env.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = ["CANTEEN_LLM_API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"]
        .iter()
        .find_map(|k| lookup(k).filter(|v| !v.trim().is_empty()));

    let provider = match lookup("CANTEEN_LLM_PROVIDER") {
        Some(raw) => raw.parse::<LlmProviderKind>()?,
        None if api_key.is_some() => LlmProviderKind::Gemini,
        None => LlmProviderKind::Disabled,
    };

    let (default_model, default_base) = match provider {
        LlmProviderKind::Gemini => (gemini::DEFAULT_MODEL, gemini::DEFAULT_BASE_URL),
        LlmProviderKind::OpenAi => (openai::DEFAULT_MODEL, openai::DEFAULT_BASE_URL),
        LlmProviderKind::Disabled => ("", ""),
    };

    let log_format = match lookup("CANTEEN_LOG_FORMAT").as_deref() {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    };

    Ok(Config {
        port: lookup("CANTEEN_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080),
        seed_demo: lookup("CANTEEN_SEED_DEMO")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false),
        dashboard_origin: lookup("CANTEEN_DASHBOARD_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".into()),
        log_format,
        llm: LlmConfig {
            provider,
            api_key,
            model: lookup("CANTEEN_LLM_MODEL").unwrap_or_else(|| default_model.into()),
            base_url: lookup("CANTEEN_LLM_BASE_URL").unwrap_or_else(|| default_base.into()),
            timeout_secs: lookup("CANTEEN_SUGGESTION_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(15),
            max_retries: lookup("CANTEEN_LLM_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
        },
    })
}

//! AI menu suggestions.
//!
//! A [`SuggestionProvider`] asks a generative model for popular items given
//! the time of day and weekday. [`SuggestionService`] wraps a provider with a
//! deadline and the fixed fallback list, so callers always get something to
//! show on the creation form.

pub mod gemini;
pub mod openai;
pub mod schema;
pub mod tracker;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Weekday};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};

use crate::config::{LlmConfig, LlmProviderKind};

pub use tracker::{PendingSuggestion, SuggestionState, SuggestionTracker};

/// Items offered when the model is unreachable or returns nothing usable.
pub const FALLBACK_ITEMS: [&str; 4] = ["Pizza", "Burger", "Salad", "Pasta"];

/// Upper bound on suggestions returned to the form.
pub const MAX_SUGGESTIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// [5,12) morning, [12,17) afternoon, everything else evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Prompt input: `{timeOfDay, dayOfWeek}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionContext {
    pub time_of_day: TimeOfDay,
    pub day_of_week: String,
}

impl SuggestionContext {
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self {
            time_of_day: TimeOfDay::from_hour(at.hour()),
            day_of_week: weekday_name(at.weekday()).to_string(),
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }

    pub fn prompt(&self) -> String {
        format!(
            "You are a canteen manager suggesting popular menu items for the counter.\n\n\
             Suggest menu items that are likely to be popular given the following information:\n\n\
             Time of Day: {}\n\
             Day of Week: {}\n\n\
             Consider breakfast, lunch and dinner items. Give four suggestions.\n\
             Respond with a JSON object of the form {{\"suggestedItems\": [\"...\"]}}.",
            self.time_of_day.as_str(),
            self.day_of_week
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SuggestError {
    #[error("suggestions are disabled")]
    Disabled,

    #[error("request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    #[error("could not read response body: {0}")]
    Body(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model output: {0}")]
    Malformed(String),

    #[error("model output failed schema validation: {0}")]
    Schema(String),

    #[error("model returned no suggestions")]
    Empty,

    #[error("timed out after {0}s")]
    Timeout(u64),
}

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn suggest(&self, ctx: &SuggestionContext) -> Result<Vec<String>, SuggestError>;
}

/// Provider used when no model is configured.
pub struct DisabledProvider;

#[async_trait]
impl SuggestionProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn suggest(&self, _ctx: &SuggestionContext) -> Result<Vec<String>, SuggestError> {
        Err(SuggestError::Disabled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionOutcome {
    pub suggested_items: Vec<String>,
    pub source: SuggestionSource,
    pub context: SuggestionContext,
    /// Informational notice for the user when the fallback was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl SuggestionOutcome {
    pub fn fallback(context: SuggestionContext, reason: &SuggestError) -> Self {
        Self {
            suggested_items: FALLBACK_ITEMS.iter().map(|s| s.to_string()).collect(),
            source: SuggestionSource::Fallback,
            context,
            notice: Some(format!("AI suggestions unavailable ({}); showing defaults.", reason)),
        }
    }
}

/// Provider plus deadline and fallback policy. Never fails.
#[derive(Clone)]
pub struct SuggestionService {
    provider: Arc<dyn SuggestionProvider>,
    timeout: Duration,
}

impl SuggestionService {
    pub fn new(provider: Arc<dyn SuggestionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn from_config(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let provider: Arc<dyn SuggestionProvider> = match cfg.provider {
            LlmProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(cfg)?),
            LlmProviderKind::OpenAi => Arc::new(openai::OpenAiProvider::new(cfg)?),
            LlmProviderKind::Disabled => Arc::new(DisabledProvider),
        };
        tracing::info!(provider = provider.name(), model = %cfg.model, "suggestion provider ready");
        Ok(Self::new(provider, Duration::from_secs(cfg.timeout_secs)))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn suggest_now(&self) -> SuggestionOutcome {
        self.suggest_for(SuggestionContext::now()).await
    }

    pub async fn suggest_for(&self, context: SuggestionContext) -> SuggestionOutcome {
        let result = tokio::time::timeout(self.timeout, self.provider.suggest(&context))
            .await
            .unwrap_or_else(|_| Err(SuggestError::Timeout(self.timeout.as_secs())))
            .and_then(|items| {
                let items = normalize_items(items);
                if items.is_empty() {
                    Err(SuggestError::Empty)
                } else {
                    Ok(items)
                }
            });

        match result {
            Ok(items) => {
                tracing::debug!(
                    provider = self.provider.name(),
                    count = items.len(),
                    time_of_day = context.time_of_day.as_str(),
                    day = %context.day_of_week,
                    "suggestions received"
                );
                SuggestionOutcome {
                    suggested_items: items,
                    source: SuggestionSource::Model,
                    context,
                    notice: None,
                }
            }
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "suggestion request failed, using fallback");
                SuggestionOutcome::fallback(context, &e)
            }
        }
    }
}

/// Trims, drops blanks and case-insensitive duplicates, caps the list.
pub fn normalize_items(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_SUGGESTIONS);
    for item in items {
        let item = item.trim();
        if item.is_empty() || out.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
            continue;
        }
        out.push(item.to_string());
        if out.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    out
}

/// Shared HTTP client for providers: bounded timeouts, transient retries.
pub(crate) fn build_http_client(cfg: &LlmConfig) -> anyhow::Result<ClientWithMiddleware> {
    let reqwest_client = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .connect_timeout(Duration::from_secs(5))
        .build()?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(Duration::from_millis(250), Duration::from_secs(5))
        .build_with_max_retries(cfg.max_retries);

    Ok(ClientBuilder::new(reqwest_client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Reads a failed response into a `Status` error.
pub(crate) async fn status_error(resp: reqwest::Response) -> SuggestError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    SuggestError::Status { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    /// Returns the scripted items, or a 503 when there are none.
    struct Scripted(Option<Vec<String>>);

    #[async_trait]
    impl SuggestionProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn suggest(&self, _ctx: &SuggestionContext) -> Result<Vec<String>, SuggestError> {
            match &self.0 {
                Some(items) => Ok(items.clone()),
                None => Err(SuggestError::Status {
                    status: 503,
                    body: "overloaded".into(),
                }),
            }
        }
    }

    struct Slow;

    #[async_trait]
    impl SuggestionProvider for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        async fn suggest(&self, _ctx: &SuggestionContext) -> Result<Vec<String>, SuggestError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec!["Too Late".into()])
        }
    }

    fn ctx() -> SuggestionContext {
        SuggestionContext {
            time_of_day: TimeOfDay::Morning,
            day_of_week: "Monday".into(),
        }
    }

    fn service(provider: impl SuggestionProvider + 'static) -> SuggestionService {
        SuggestionService::new(Arc::new(provider), Duration::from_secs(5))
    }

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Evening);
    }

    #[test]
    fn test_context_from_datetime() {
        // 2024-03-15 was a Friday
        let at = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(13, 30, 0)
            .unwrap()
            .and_utc();
        let ctx = SuggestionContext::from_datetime(&at);
        assert_eq!(ctx.time_of_day, TimeOfDay::Afternoon);
        assert_eq!(ctx.day_of_week, "Friday");
    }

    #[test]
    fn test_context_serializes_like_the_prompt_input() {
        let json = serde_json::to_value(ctx()).unwrap();
        assert_eq!(json, serde_json::json!({"timeOfDay": "morning", "dayOfWeek": "Monday"}));
    }

    #[test]
    fn test_prompt_mentions_inputs() {
        let prompt = ctx().prompt();
        assert!(prompt.contains("Time of Day: morning"));
        assert!(prompt.contains("Day of Week: Monday"));
        assert!(prompt.contains("suggestedItems"));
    }

    #[test]
    fn test_normalize_items() {
        let items = vec![
            " Idli ".to_string(),
            "".to_string(),
            "idli".to_string(),
            "Dosa".to_string(),
            "Vada".to_string(),
            "Upma".to_string(),
            "Poha".to_string(),
        ];
        assert_eq!(normalize_items(items), vec!["Idli", "Dosa", "Vada", "Upma"]);
    }

    #[tokio::test]
    async fn test_model_items_are_returned() {
        let svc = service(Scripted(Some(vec!["Masala Dosa".into(), "Filter Coffee".into()])));
        let outcome = svc.suggest_for(ctx()).await;
        assert_eq!(outcome.source, SuggestionSource::Model);
        assert_eq!(outcome.suggested_items, vec!["Masala Dosa", "Filter Coffee"]);
        assert!(outcome.notice.is_none());
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let svc = service(Scripted(None));
        let outcome = svc.suggest_for(ctx()).await;
        assert_eq!(outcome.source, SuggestionSource::Fallback);
        assert_eq!(outcome.suggested_items, vec!["Pizza", "Burger", "Salad", "Pasta"]);
        assert!(outcome.notice.is_some());
    }

    #[tokio::test]
    async fn test_empty_response_falls_back() {
        let svc = service(Scripted(Some(vec!["  ".into()])));
        let outcome = svc.suggest_for(ctx()).await;
        assert_eq!(outcome.source, SuggestionSource::Fallback);
        assert_eq!(outcome.suggested_items, FALLBACK_ITEMS.to_vec());
    }

    #[tokio::test]
    async fn test_disabled_provider_falls_back() {
        let outcome = service(DisabledProvider).suggest_for(ctx()).await;
        assert_eq!(outcome.source, SuggestionSource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        let svc = SuggestionService::new(Arc::new(Slow), Duration::from_secs(2));
        let outcome = svc.suggest_for(ctx()).await;
        assert_eq!(outcome.source, SuggestionSource::Fallback);
        assert!(outcome.notice.unwrap().contains("timed out"));
    }

    #[test]
    fn test_now_context_uses_a_known_weekday() {
        let ctx = SuggestionContext::from_datetime(&Utc::now());
        assert!(ctx.day_of_week.ends_with("day"));
    }
}

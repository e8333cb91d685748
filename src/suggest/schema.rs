//! Output contract for the suggestion model: `{"suggestedItems": [string]}`.

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use super::SuggestError;

static OUTPUT_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema = json!({
        "type": "object",
        "required": ["suggestedItems"],
        "properties": {
            "suggestedItems": {
                "type": "array",
                "items": { "type": "string" }
            }
        }
    });
    JSONSchema::compile(&schema).expect("suggestion output schema compiles")
});

/// Schema handed to providers that support constrained JSON output (Gemini's
/// OpenAPI subset).
pub fn gemini_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "suggestedItems": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": ["suggestedItems"]
    })
}

/// Parses the raw text a model produced into suggested items.
///
/// Tolerates markdown code fences and a bare JSON array; anything else must
/// match the output schema.
pub fn parse_model_output(text: &str) -> Result<Vec<String>, SuggestError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(SuggestError::Empty);
    }

    let mut value: Value =
        serde_json::from_str(body).map_err(|e| SuggestError::Malformed(e.to_string()))?;
    if value.is_array() {
        value = json!({ "suggestedItems": value });
    }

    if let Err(errors) = OUTPUT_SCHEMA.validate(&value) {
        let reasons: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(SuggestError::Schema(reasons.join("; ")));
    }

    let items = value["suggestedItems"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    Ok(items)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop an optional language tag on the opening fence
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

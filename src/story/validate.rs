use serde_json::Value;

use crate::{
    error::ValidationError,
    story::types::{Genre, GenerationRequest, RawGenerationRequest, StoryLength},
};

pub const DEFAULT_GENRE: Genre = Genre::Romance;
pub const DEFAULT_LENGTH: StoryLength = StoryLength::Medium;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.9;

/// Checks raw request fields and resolves defaults. Rules run in a fixed order
/// and stop at the first failure.
///
/// An omitted field takes its default. An explicit value, `null` included, must
/// be valid. The prompt is trimmed only for the emptiness check; the caller's
/// text is kept as sent.
pub fn validate(raw: &RawGenerationRequest) -> Result<GenerationRequest, ValidationError> {
    let prompt = match raw.prompt.as_ref() {
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        _ => return Err(ValidationError::MissingPrompt),
    };

    let genre = match raw.genre.as_ref() {
        None => DEFAULT_GENRE,
        Some(Value::String(name)) => {
            Genre::parse(name).ok_or_else(|| ValidationError::InvalidGenre(name.clone()))?
        }
        Some(other) => return Err(ValidationError::InvalidGenre(other.to_string())),
    };

    let length = match raw.length.as_ref() {
        None => DEFAULT_LENGTH,
        Some(Value::String(name)) => {
            StoryLength::parse(name).ok_or_else(|| ValidationError::InvalidLength(name.clone()))?
        }
        Some(other) => return Err(ValidationError::InvalidLength(other.to_string())),
    };

    let temperature = match raw.temperature.as_ref() {
        None => DEFAULT_TEMPERATURE,
        Some(value) => {
            unit_interval(value).ok_or_else(|| ValidationError::InvalidTemperature(render(value)))?
        }
    };

    let top_p = match raw.top_p.as_ref() {
        None => DEFAULT_TOP_P,
        Some(value) => unit_interval(value).ok_or_else(|| ValidationError::InvalidTopP(render(value)))?,
    };

    let max_tokens = match raw.max_tokens.as_ref() {
        None => length.default_max_tokens(),
        Some(value) => {
            positive_count(value).ok_or_else(|| ValidationError::InvalidMaxTokens(render(value)))?
        }
    };

    Ok(GenerationRequest {
        prompt,
        genre,
        length,
        temperature,
        top_p,
        max_tokens,
    })
}

fn unit_interval(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && (0.0..=1.0).contains(&number)).then_some(number)
}

fn positive_count(value: &Value) -> Option<u32> {
    let count = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(count).ok().filter(|&c| c > 0)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

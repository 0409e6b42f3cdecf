//! Turns free-form model completions into validated values.
//!
//! Model output is untrusted: it may be fenced in markdown, wrapped in prose,
//! truncated or simply wrong. Every public function here returns a usable
//! value and never an error; failures fall back to fixed defaults.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::models::{ArticleText, CommentAnalysis, Coordinates, LocationExtraction};
use crate::scoring::{clamp_score, MAX_SCORE, MIN_SCORE};

pub const COMMENT_FALLBACK_SUMMARY: &str = "This comment expresses a viewpoint on the topic.";
const UNKNOWN_LOCATION: &str = "Unknown Location";
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Why a completion was rejected; only ever logged.
#[derive(Debug, Error)]
enum InterpretError {
    #[error("no JSON object in response")]
    NoJson,
    #[error("field `{0}` is missing or has the wrong type")]
    Field(&'static str),
}

/// Parse a leading floating-point number the way a lenient reader would:
/// `"4.5"`, `"-3 (moderately liberal)"` and `"+2e0"` all succeed.
fn leading_number(text: &str) -> Option<f64> {
    let re = Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").ok()?;
    let number: f64 = re.find(text.trim())?.as_str().parse().ok()?;
    number.is_finite().then_some(number)
}

/// A political score, or `None` when the text is unusable or out of range.
pub fn parse_political_score(text: &str) -> Option<f64> {
    leading_number(text).filter(|score| (MIN_SCORE..=MAX_SCORE).contains(score))
}

/// Remove a surrounding ``` fence and its optional language hint.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let (Some(start), Some(end)) = (trimmed.find("```"), trimmed.rfind("```")) else {
        return trimmed;
    };
    if end < start + 3 {
        return trimmed;
    }

    let inner = trimmed[start + 3..end].trim();
    match inner.split_once('\n') {
        Some((first, rest)) if is_language_hint(first) => rest.trim(),
        _ => inner,
    }
}

fn is_language_hint(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse the completion as a JSON object, falling back to the widest `{...}` span.
fn extract_json(text: &str) -> Result<Value, InterpretError> {
    let stripped = strip_code_fence(text);

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(stripped) {
        return Ok(value);
    }

    let re = Regex::new(r"(?s)\{.*\}").map_err(|_| InterpretError::NoJson)?;
    let span = re.find(stripped).ok_or(InterpretError::NoJson)?;

    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(value @ Value::Object(_)) => Ok(value),
        _ => Err(InterpretError::NoJson),
    }
}

/// Numbers, or strings holding numbers.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => leading_number(s),
        _ => None,
    }
}

fn coerce_coordinates(value: &Value) -> Option<Coordinates> {
    let obj = value.as_object()?;
    let lat = obj.get("lat").and_then(coerce_number)?;
    let lng = obj.get("lng").and_then(coerce_number)?;
    Some(Coordinates { lat, lng })
}

pub fn fallback_comment_analysis() -> CommentAnalysis {
    CommentAnalysis {
        summary: COMMENT_FALLBACK_SUMMARY.to_string(),
        political_score: 0.0,
    }
}

fn comment_analysis(text: &str) -> Result<CommentAnalysis, InterpretError> {
    let value = extract_json(text)?;

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .ok_or(InterpretError::Field("summary"))?;
    let score = value
        .get("politicalScore")
        .and_then(Value::as_f64)
        .ok_or(InterpretError::Field("politicalScore"))?;

    Ok(CommentAnalysis {
        summary: summary.to_string(),
        political_score: clamp_score(score),
    })
}

pub fn interpret_comment_analysis(text: &str) -> CommentAnalysis {
    comment_analysis(text).unwrap_or_else(|e| {
        tracing::warn!("Unusable comment analysis ({}), raw response: {:?}", e, text);
        fallback_comment_analysis()
    })
}

fn location(text: &str) -> Result<LocationExtraction, InterpretError> {
    let value = extract_json(text)?;

    let location = value
        .get("location")
        .and_then(Value::as_str)
        .ok_or(InterpretError::Field("location"))?;
    let coordinates = value.get("coordinates").and_then(coerce_coordinates);

    let confidence = value
        .get("confidence")
        .and_then(coerce_number)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    Ok(LocationExtraction {
        location: location.to_string(),
        coordinates,
        confidence,
    })
}

/// A capitalised place named after "in" or "at", e.g. "Floods in New York City".
fn place_in_title(title: &str) -> Option<String> {
    let re = Regex::new(r"\b(?:in|at)\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)").ok()?;
    let place = re.captures(title)?.get(1)?.as_str().trim();
    Some(place.to_string())
}

pub fn fallback_location(article: &ArticleText<'_>) -> LocationExtraction {
    let location = place_in_title(article.title).unwrap_or_else(|| {
        if article.source.is_empty() {
            UNKNOWN_LOCATION.to_string()
        } else {
            article.source.to_string()
        }
    });

    LocationExtraction {
        location,
        coordinates: None,
        confidence: 0.0,
    }
}

pub fn interpret_location(text: &str, article: &ArticleText<'_>) -> LocationExtraction {
    location(text).unwrap_or_else(|e| {
        tracing::warn!("Unusable location response ({}), raw response: {:?}", e, text);
        fallback_location(article)
    })
}

pub fn fallback_summary(title: &str) -> String {
    format!(
        "This article discusses {}. Key points include policy implications, economic factors, and potential social impacts.",
        title.to_lowercase()
    )
}

pub fn interpret_summary(text: &str, title: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        fallback_summary(title)
    } else {
        trimmed.to_string()
    }
}

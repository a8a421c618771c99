//! Model response parsing and validation
//!
//! The reasoning service is asked for JSON only, but replies may still arrive
//! wrapped in Markdown fences or with fields missing. Everything that does not
//! match the action schema is a [`SchemaViolation`], never a panic.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{Action, ActionRecord, ActionValue, DecisionSource, Urgency};

/// Fields every model response must carry
pub const REQUIRED_FIELDS: [&str; 5] = [
    "action",
    "urgency",
    "notification_message",
    "confidence",
    "reasoning_summary",
];

/// Ways a model response can break the action contract
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("Response is not JSON: {0}")]
    NotJson(String),

    #[error("Response is not a JSON object")]
    NotAnObject,

    #[error("Missing: {0}")]
    MissingField(&'static str),

    #[error("Field {field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid urgency: {0}")]
    InvalidUrgency(String),

    #[error("Invalid confidence: {0}")]
    InvalidConfidence(f64),

    #[error("Notification message is empty")]
    EmptyMessage,
}

/// Remove enclosing Markdown code fences, if any
///
/// With fences present, returns the first fenced block whose body starts with
/// `{`, minus any language tag. Without fences, returns the trimmed input.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.contains("```") {
        return trimmed;
    }

    trimmed
        .split("```")
        .map(strip_language_tag)
        .find(|part| part.starts_with('{'))
        .unwrap_or(trimmed)
}

fn strip_language_tag(part: &str) -> &str {
    let part = part.trim();
    let tag_len = part
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(part.len());
    if tag_len > 0 && part[tag_len..].trim_start().starts_with('{') {
        part[tag_len..].trim_start()
    } else {
        part
    }
}

/// Parse and validate raw model text into a MODEL-sourced action record
pub fn parse_model_response(raw: &str) -> Result<ActionRecord, SchemaViolation> {
    let body = strip_code_fences(raw);
    let value: Value =
        serde_json::from_str(body).map_err(|e| SchemaViolation::NotJson(e.to_string()))?;
    let object = value.as_object().ok_or(SchemaViolation::NotAnObject)?;

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(SchemaViolation::MissingField(field));
        }
    }

    let action_name = string_field(object, "action")?;
    let action: Action = action_name
        .parse()
        .map_err(SchemaViolation::InvalidAction)?;

    let urgency_name = string_field(object, "urgency")?;
    let urgency: Urgency = urgency_name
        .parse()
        .map_err(SchemaViolation::InvalidUrgency)?;

    let confidence = object
        .get("confidence")
        .and_then(Value::as_f64)
        .ok_or(SchemaViolation::WrongType {
            field: "confidence",
            expected: "a number",
        })?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(SchemaViolation::InvalidConfidence(confidence));
    }

    let notification_message = string_field(object, "notification_message")?.trim();
    if notification_message.is_empty() {
        return Err(SchemaViolation::EmptyMessage);
    }

    let reasoning_summary = string_field(object, "reasoning_summary")?;
    let value = parse_value(object.get("value"))?;

    Ok(ActionRecord {
        action,
        urgency,
        value,
        notification_message: notification_message.to_string(),
        confidence,
        reasoning_summary: reasoning_summary.to_string(),
        source: DecisionSource::Model,
    })
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, SchemaViolation> {
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or(SchemaViolation::WrongType {
            field,
            expected: "a string",
        })
}

/// Scalars map directly; a list of strings is joined with commas
fn parse_value(value: Option<&Value>) -> Result<Option<ActionValue>, SchemaViolation> {
    let wrong_type = SchemaViolation::WrongType {
        field: "value",
        expected: "a scalar, a list of strings or null",
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(ActionValue::Flag(*flag))),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(|n| Some(ActionValue::Number(n)))
            .ok_or(wrong_type),
        Some(Value::String(s)) => Ok(Some(ActionValue::Text(s.clone()))),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(|parts| Some(ActionValue::Text(parts.join(","))))
            .ok_or(wrong_type),
        Some(Value::Object(_)) => Err(wrong_type),
    }
}

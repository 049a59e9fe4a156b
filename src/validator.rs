//!
//! Request validation and model-tier resolution for incoming `/v1/messages` bodies.
//!
//! Validation runs against the raw JSON body before it is parsed into a typed
//! [`crate::model::anthropic::MessageRequest`], mirroring how the original gateway
//! validates the wire payload directly so a malformed field produces a precise
//! `field: message` error rather than an opaque deserialization failure.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::config::ModelConfig;
use serde_json::Value;

/* --- types ----------------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/* --- validation ---------------------------------------------------------------------------- */

/// Validate an incoming `/v1/messages` request body.
///
/// Returns an empty vec when the body is valid. Checks, in order: body is an object;
/// `model` is present and a string; `max_tokens` is present, a number, and strictly
/// positive; `messages` is present, a list, and non-empty; `temperature` (if present)
/// is in `[0, 1]`; `top_p` (if present) is in `[0, 1]`; `stream` (if present) is a bool.
pub fn validate_request(body: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let Some(obj) = body.as_object() else {
        errors.push(ValidationError {
            field: "body".to_string(),
            message: "request body must be a JSON object".to_string(),
        });
        return errors;
    };

    match obj.get("model") {
        Some(Value::String(s)) if !s.is_empty() => {}
        Some(Value::String(_)) => {
            errors.push(ValidationError {
                field: "model".to_string(),
                message: "model must not be empty".to_string(),
            });
        }
        Some(_) => {
            errors.push(ValidationError {
                field: "model".to_string(),
                message: "model must be a string".to_string(),
            });
        }
        None => {
            errors.push(ValidationError {
                field: "model".to_string(),
                message: "model is required".to_string(),
            });
        }
    }

    match obj.get("max_tokens") {
        Some(v) if v.is_number() => {
            let n = v.as_f64().unwrap_or(0.0);
            if n <= 0.0 {
                errors.push(ValidationError {
                    field: "max_tokens".to_string(),
                    message: "max_tokens must be a positive number".to_string(),
                });
            }
        }
        Some(_) => {
            errors.push(ValidationError {
                field: "max_tokens".to_string(),
                message: "max_tokens must be a number".to_string(),
            });
        }
        None => {
            errors.push(ValidationError {
                field: "max_tokens".to_string(),
                message: "max_tokens is required".to_string(),
            });
        }
    }

    match obj.get("messages") {
        Some(Value::Array(arr)) if !arr.is_empty() => {}
        Some(Value::Array(_)) => {
            errors.push(ValidationError {
                field: "messages".to_string(),
                message: "messages must not be empty".to_string(),
            });
        }
        Some(_) => {
            errors.push(ValidationError {
                field: "messages".to_string(),
                message: "messages must be a list".to_string(),
            });
        }
        None => {
            errors.push(ValidationError {
                field: "messages".to_string(),
                message: "messages is required".to_string(),
            });
        }
    }

    if let Some(v) = obj.get("temperature") {
        if !v.is_number() || !in_unit_range(v) {
            errors.push(ValidationError {
                field: "temperature".to_string(),
                message: "temperature must be a number between 0 and 1".to_string(),
            });
        }
    }

    if let Some(v) = obj.get("top_p") {
        if !v.is_number() || !in_unit_range(v) {
            errors.push(ValidationError {
                field: "top_p".to_string(),
                message: "top_p must be a number between 0 and 1".to_string(),
            });
        }
    }

    if let Some(v) = obj.get("stream") {
        if !v.is_boolean() {
            errors.push(ValidationError {
                field: "stream".to_string(),
                message: "stream must be a boolean".to_string(),
            });
        }
    }

    errors
}

fn in_unit_range(v: &Value) -> bool {
    v.as_f64().map(|n| (0.0..=1.0).contains(&n)).unwrap_or(false)
}

/// Join validation errors into a single `"field: message; field: message"` string.
pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| format!("{}: {}", e.field, e.message)).collect::<Vec<_>>().join("; ")
}

/* --- model tier resolution ------------------------------------------------------------------ */

/// Resolve the requested Claude model name to a configured upstream model.
///
/// Substrings `opus`/`sonnet`/`haiku` appearing anywhere in the requested name (matched
/// case-insensitively) select the corresponding tier, regardless of the exact dated model
/// string a client sends. A name matching none of the three is passed through unchanged,
/// so a client naming an upstream model directly still works.
pub fn resolve_model(requested: &str, models: &ModelConfig) -> String {
    let lower = requested.to_lowercase();
    if lower.contains("opus") {
        models.opus.clone()
    } else if lower.contains("sonnet") {
        models.sonnet.clone()
    } else if lower.contains("haiku") {
        models.haiku.clone()
    } else {
        requested.to_string()
    }
}

/* --- tests ------------------------------------------------------------------------------------ */

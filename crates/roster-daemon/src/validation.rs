//! Shape and content checks for request bodies and path ids.
//!
//! Checks run in a fixed order and the first failure decides the message:
//! unknown keys, then email, then name, then age.

use std::sync::OnceLock;

use regex::Regex;
use roster_types::{
    UserPayload, ERR_BODY_NOT_OBJECT, ERR_INVALID_AGE, ERR_INVALID_EMAIL, ERR_INVALID_FIELDS,
    ERR_INVALID_NAME, ERR_MISSING_ID,
};
use serde_json::{Map, Value};
use thiserror::Error;

const ALLOWED_FIELDS: [&str; 3] = ["email", "name", "age"];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

/// Decodes a request body into a JSON object. An empty body counts as `{}`.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ValidationError(ERR_BODY_NOT_OBJECT)),
    }
}

pub fn validate_user_payload(body: &Map<String, Value>) -> Result<UserPayload, ValidationError> {
    if body.keys().any(|k| !ALLOWED_FIELDS.contains(&k.as_str())) {
        return Err(ValidationError(ERR_INVALID_FIELDS));
    }

    let email = body
        .get("email")
        .and_then(Value::as_str)
        .filter(|e| email_regex().is_match(e))
        .ok_or(ValidationError(ERR_INVALID_EMAIL))?;

    let name = body
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .ok_or(ValidationError(ERR_INVALID_NAME))?;

    let age = body
        .get("age")
        .and_then(positive_integer)
        .ok_or(ValidationError(ERR_INVALID_AGE))?;

    Ok(UserPayload {
        email: email.to_string(),
        name: name.to_string(),
        age,
    })
}

/// Accepts JSON integers and integral floats (`30.0`) that are at least 1.
fn positive_integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return (n >= 1).then_some(n);
    }
    let f = value.as_f64()?;
    (f >= 1.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

pub fn validate_id(id: &str) -> Result<&str, ValidationError> {
    if id.is_empty() {
        return Err(ValidationError(ERR_MISSING_ID));
    }
    Ok(id)
}

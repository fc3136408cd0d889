//! # Validation — Request Schema Checks
//!
//! Turns an untyped JSON body into a validated request, or a
//! [`ValidationError`] listing every failing field. Nothing reaches the store
//! unless the whole body passes.
//!
//! | Field | Rule |
//! |-------|------|
//! | `name` | string, 2–50 characters |
//! | `goal` | string, 10–200 characters |
//! | `color` | optional string, 1–32 characters, defaults to the configured color |
//! | `windowId` | integer in `1..=total_windows`, or a non-numeric string key of 3–100 characters |
//!
//! Lengths count Unicode scalar values. Unknown fields are ignored.

use crate::model::{LightDraft, WindowId};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::ops::RangeInclusive;

pub const NAME_LEN: RangeInclusive<usize> = 2..=50;
pub const GOAL_LEN: RangeInclusive<usize> = 10..=200;
pub const COLOR_LEN: RangeInclusive<usize> = 1..=32;
pub const WINDOW_KEY_LEN: RangeInclusive<usize> = 3..=100;

/// One failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Every field that failed validation, in body order of checking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// A body that could not be parsed as JSON at all.
    pub fn malformed_body(reason: impl Into<String>) -> Self {
        ValidationError {
            issues: vec![FieldIssue {
                field: String::new(),
                message: reason.into(),
            }],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validation error: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            if issue.field.is_empty() {
                f.write_str(&issue.message)?;
            } else {
                write!(f, "{} at \"{}\"", issue.message, issue.field)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validated body of a building illumination request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IlluminateRequest {
    pub name: String,
    pub goal: String,
}

/// Validate a `POST /api/lights` body.
pub fn validate_light(
    body: &Value,
    total_windows: u32,
    default_color: &str,
) -> Result<LightDraft, ValidationError> {
    let mut checker = Checker::for_body(body)?;
    let window_id = checker.window_id("windowId", total_windows);
    let name = checker.required_string("name", NAME_LEN);
    let goal = checker.required_string("goal", GOAL_LEN);
    let color = checker.optional_string("color", COLOR_LEN);
    checker.finish()?;

    // finish() returned Ok, so every required field was present and valid
    match (window_id, name, goal, color) {
        (Some(window_id), Some(name), Some(goal), Some(color)) => Ok(LightDraft {
            window_id,
            name,
            goal,
            color: color.unwrap_or_else(|| default_color.to_string()),
        }),
        _ => Err(ValidationError::malformed_body("Invalid light request")),
    }
}

/// Validate a `{name, goal}` body used by the building endpoints.
pub fn validate_illuminate(body: &Value) -> Result<IlluminateRequest, ValidationError> {
    let mut checker = Checker::for_body(body)?;
    let name = checker.required_string("name", NAME_LEN);
    let goal = checker.required_string("goal", GOAL_LEN);
    checker.finish()?;

    match (name, goal) {
        (Some(name), Some(goal)) => Ok(IlluminateRequest { name, goal }),
        _ => Err(ValidationError::malformed_body("Invalid illumination request")),
    }
}

/// Accumulates issues across all fields instead of stopping at the first.
struct Checker<'a> {
    obj: &'a Map<String, Value>,
    issues: Vec<FieldIssue>,
}

impl<'a> Checker<'a> {
    fn for_body(body: &'a Value) -> Result<Self, ValidationError> {
        match body {
            Value::Object(obj) => Ok(Checker {
                obj,
                issues: Vec::new(),
            }),
            other => Err(ValidationError::malformed_body(format!(
                "Expected object, received {}",
                type_name(other)
            ))),
        }
    }

    fn push(&mut self, field: &str, message: String) {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            message,
        });
    }

    fn required_string(&mut self, field: &str, len: RangeInclusive<usize>) -> Option<String> {
        match self.obj.get(field) {
            None | Some(Value::Null) => {
                self.push(field, "Required".to_string());
                None
            }
            Some(Value::String(s)) => self.check_len(field, s, len),
            Some(other) => {
                self.push(
                    field,
                    format!("Expected string, received {}", type_name(other)),
                );
                None
            }
        }
    }

    /// `Some(None)` means absent (use the default), `None` means invalid.
    fn optional_string(
        &mut self,
        field: &str,
        len: RangeInclusive<usize>,
    ) -> Option<Option<String>> {
        match self.obj.get(field) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => self.check_len(field, s, len).map(Some),
            Some(other) => {
                self.push(
                    field,
                    format!("Expected string, received {}", type_name(other)),
                );
                None
            }
        }
    }

    fn check_len(&mut self, field: &str, s: &str, len: RangeInclusive<usize>) -> Option<String> {
        let count = s.chars().count();
        if count < *len.start() {
            self.push(
                field,
                format!("String must contain at least {} character(s)", len.start()),
            );
            None
        } else if count > *len.end() {
            self.push(
                field,
                format!("String must contain at most {} character(s)", len.end()),
            );
            None
        } else {
            Some(s.to_string())
        }
    }

    fn window_id(&mut self, field: &str, total_windows: u32) -> Option<WindowId> {
        let range_msg = || {
            format!(
                "Window id must be an integer between 1 and {}",
                total_windows
            )
        };
        match self.obj.get(field) {
            None | Some(Value::Null) => {
                self.push(field, "Required".to_string());
                None
            }
            Some(Value::Number(n)) => match n.as_u64() {
                Some(v) if v >= 1 && v <= u64::from(total_windows) => {
                    Some(WindowId::Number(v as u32))
                }
                _ => {
                    self.push(field, range_msg());
                    None
                }
            },
            Some(Value::String(s)) => {
                let key = self.check_len(field, s, WINDOW_KEY_LEN)?;
                if key.bytes().all(|b| b.is_ascii_digit()) {
                    self.push(
                        field,
                        "Numeric window ids must be sent as numbers".to_string(),
                    );
                    return None;
                }
                Some(WindowId::Key(key))
            }
            Some(other) => {
                self.push(
                    field,
                    format!("Expected number or string, received {}", type_name(other)),
                );
                None
            }
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                issues: self.issues,
            })
        }
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn light(body: Value) -> Result<LightDraft, ValidationError> {
        validate_light(&body, 5000, "yellow")
    }

    #[test]
    fn accepts_minimal_light_and_defaults_color() {
        let draft = light(json!({"windowId": 42, "name": "Al", "goal": "Become a doctor one day"}))
            .unwrap();
        assert_eq!(draft.window_id, WindowId::Number(42));
        assert_eq!(draft.color, "yellow");
    }

    #[test]
    fn null_color_uses_default() {
        let draft = validate_light(
            &json!({"windowId": 1, "name": "Al", "goal": "0123456789", "color": null}),
            10,
            "amber",
        )
        .unwrap();
        assert_eq!(draft.color, "amber");
    }

    #[test]
    fn explicit_color_is_kept() {
        let draft = light(json!({"windowId": 1, "name": "Al", "goal": "0123456789", "color": "teal"}))
            .unwrap();
        assert_eq!(draft.color, "teal");
    }

    #[test]
    fn name_length_boundaries() {
        let goal = "g".repeat(10);
        for (len, ok) in [(1, false), (2, true), (50, true), (51, false)] {
            let body = json!({"name": "n".repeat(len), "goal": goal});
            assert_eq!(validate_illuminate(&body).is_ok(), ok, "name length {}", len);
        }
    }

    #[test]
    fn goal_length_boundaries() {
        for (len, ok) in [(9, false), (10, true), (200, true), (201, false)] {
            let body = json!({"name": "Al", "goal": "g".repeat(len)});
            assert_eq!(validate_illuminate(&body).is_ok(), ok, "goal length {}", len);
        }
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // Two scalar values, six bytes
        let body = json!({"name": "日本", "goal": "é".repeat(10)});
        assert!(validate_illuminate(&body).is_ok());
    }

    #[test]
    fn reports_every_failing_field() {
        let err = light(json!({"windowId": 0, "name": "A", "goal": 7, "color": ""})).unwrap_err();
        assert_eq!(err.issues.len(), 4);
        for field in ["windowId", "name", "goal", "color"] {
            assert!(err.has_field(field), "missing issue for {}", field);
        }
    }

    #[test]
    fn missing_fields_are_required() {
        let err = validate_illuminate(&json!({})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Required at \"name\"; Required at \"goal\""
        );
    }

    #[test]
    fn window_id_range_is_enforced() {
        let ok = |id: Value| light(json!({"windowId": id, "name": "Al", "goal": "0123456789"}));
        assert!(ok(json!(1)).is_ok());
        assert!(ok(json!(5000)).is_ok());
        assert!(ok(json!(5001)).is_err());
        assert!(ok(json!(-3)).is_err());
        assert!(ok(json!(4.5)).is_err());
        assert!(ok(json!(true)).is_err());
    }

    #[test]
    fn window_keys_must_be_non_numeric_strings() {
        let ok = |id: &str| light(json!({"windowId": id, "name": "Al", "goal": "0123456789"}));
        assert_eq!(
            ok("b4-3-2").unwrap().window_id,
            WindowId::Key("b4-3-2".into())
        );
        assert!(ok("b1").is_err());
        assert!(ok("123").is_err());
        assert!(ok(&"k".repeat(101)).is_err());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        let err = validate_illuminate(&json!(["Al", "goal"])).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Expected object, received array");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let body = json!({"name": "Al", "goal": "0123456789", "timestamp": "1999-01-01"});
        assert!(validate_illuminate(&body).is_ok());
    }
}

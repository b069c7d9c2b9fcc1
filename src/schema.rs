//! Helpers for loading request payloads through explicit field allow-lists.
//! Complaints accumulate per field instead of failing on the first problem.

use serde_json::{Map, Value};

use crate::error::{push_field_error, FieldErrors};

pub const MISSING: &str = "Missing data for required field.";
pub const NOT_NULL: &str = "Field may not be null.";
pub const NOT_STRING: &str = "Not a valid string.";
pub const NOT_BOOLEAN: &str = "Not a valid boolean.";
pub const NOT_INTEGER: &str = "Not a valid integer.";
pub const UNKNOWN_FIELD: &str = "Unknown field.";
pub const INVALID_INPUT: &str = "Invalid input type.";

/// The payload itself must be a JSON object.
pub fn as_object(value: &Value) -> Result<&Map<String, Value>, FieldErrors> {
    value.as_object().ok_or_else(|| {
        let mut errors = FieldErrors::new();
        push_field_error(&mut errors, "_schema", INVALID_INPUT);
        errors
    })
}

/// Complain about every field outside the allow-list.
pub fn check_unknown(obj: &Map<String, Value>, allowed: &[&str], errors: &mut FieldErrors) {
    for key in obj.keys() {
        if !allowed.contains(&key.as_str()) {
            push_field_error(errors, key, UNKNOWN_FIELD);
        }
    }
}

pub fn req_string(obj: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<String> {
    match obj.get(field) {
        None => {
            push_field_error(errors, field, MISSING);
            None
        }
        Some(Value::Null) => {
            push_field_error(errors, field, NOT_NULL);
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            push_field_error(errors, field, NOT_STRING);
            None
        }
    }
}

/// Optional string. Outer `None` means the field was absent; `Some(None)`
/// means an explicit null (clear the column).
pub fn opt_string(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<Option<String>> {
    match obj.get(field) {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(_) => {
            push_field_error(errors, field, NOT_STRING);
            None
        }
    }
}

/// Optional string for a non-nullable column: absent is fine, an explicit
/// null is a complaint.
pub fn opt_string_not_null(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match obj.get(field) {
        None => None,
        Some(Value::Null) => {
            push_field_error(errors, field, NOT_NULL);
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            push_field_error(errors, field, NOT_STRING);
            None
        }
    }
}

pub fn opt_bool(obj: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<bool> {
    match obj.get(field) {
        None => None,
        Some(Value::Null) => {
            push_field_error(errors, field, NOT_NULL);
            None
        }
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            push_field_error(errors, field, NOT_BOOLEAN);
            None
        }
    }
}

pub fn req_int(obj: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<i32> {
    match obj.get(field) {
        None => {
            push_field_error(errors, field, MISSING);
            None
        }
        Some(Value::Null) => {
            push_field_error(errors, field, NOT_NULL);
            None
        }
        Some(value) => coerce_int(value).or_else(|| {
            push_field_error(errors, field, NOT_INTEGER);
            None
        }),
    }
}

/// Optional integer; `Some(None)` is an explicit null.
pub fn opt_int(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<Option<i32>> {
    match obj.get(field) {
        None => None,
        Some(Value::Null) => Some(None),
        Some(value) => match coerce_int(value) {
            Some(n) => Some(Some(n)),
            None => {
                push_field_error(errors, field, NOT_INTEGER);
                None
            }
        },
    }
}

/// Optional integer for a non-nullable column: null is a complaint.
pub fn opt_int_not_null(
    obj: &Map<String, Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<i32> {
    match obj.get(field) {
        None => None,
        Some(Value::Null) => {
            push_field_error(errors, field, NOT_NULL);
            None
        }
        Some(value) => coerce_int(value).or_else(|| {
            push_field_error(errors, field, NOT_INTEGER);
            None
        }),
    }
}

fn coerce_int(value: &Value) -> Option<i32> {
    value.as_i64().and_then(|n| i32::try_from(n).ok())
}

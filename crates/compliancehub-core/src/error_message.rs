//! Human-readable messages from API error bodies.
//!
//! The backend reports failures in several shapes depending on where the
//! error was raised:
//!
//! - hand-written views: `{"error": "Rejection reason is required"}` or
//!   `{"error": ["This password is too short.", "..."]}`
//! - framework errors: `{"detail": "Authentication credentials were not provided."}`
//! - informational bodies: `{"message": "..."}`
//! - serializer validation: `{"non_field_errors": ["..."]}` or
//!   `{"email": ["A user with this email already exists."]}`
//!
//! `extract` picks the first usable message in that order.

use serde_json::Value;

/// Keys checked before falling back to per-field validation errors.
const PRIORITY_KEYS: [&str; 4] = ["error", "detail", "message", "non_field_errors"];

/// Derive a message from an error body, or `None` if nothing usable is found.
pub fn extract(body: &Value) -> Option<String> {
    match body {
        Value::String(s) => non_blank(s),
        Value::Array(items) => items.iter().find_map(first_text),
        Value::Object(map) => {
            if let Some(msg) = map.get("error").and_then(joined_text) {
                return Some(msg);
            }
            for key in &PRIORITY_KEYS[1..] {
                if let Some(msg) = map.get(*key).and_then(first_text) {
                    return Some(msg);
                }
            }

            let mut fields: Vec<&String> = map
                .keys()
                .filter(|k| !PRIORITY_KEYS.contains(&k.as_str()))
                .collect();
            fields.sort();

            fields.into_iter().find_map(|field| {
                map.get(field)
                    .and_then(first_text)
                    .map(|msg| format!("{}: {}", field, msg))
            })
        }
        _ => None,
    }
}

/// Like `extract`, falling back to the HTTP reason phrase for `status`.
pub fn describe(status: u16, body: Option<&Value>) -> String {
    body.and_then(extract)
        .unwrap_or_else(|| match reason_phrase(status) {
            Some(phrase) => format!("{} ({})", phrase, status),
            None => format!("Request failed with status {}", status),
        })
}

/// Canonical reason phrase for the statuses the API returns.
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    let phrase = match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => return None,
    };
    Some(phrase)
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First non-blank string in a value, descending into arrays and nested
/// field-error objects.
fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_blank(s),
        Value::Array(items) => items.iter().find_map(first_text),
        Value::Object(_) => extract(value),
        _ => None,
    }
}

/// All strings of a list joined with a space; a single string as-is.
fn joined_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|v| v.as_str().and_then(non_blank))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" "))
            }
        }
        other => first_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_error_string() {
        let body = json!({"error": "Rejection reason is required"});
        assert_eq!(extract(&body).as_deref(), Some("Rejection reason is required"));
    }

    #[test]
    fn test_error_list_is_joined() {
        let body = json!({"error": ["This password is too short.", "This password is too common."]});
        assert_eq!(
            extract(&body).as_deref(),
            Some("This password is too short. This password is too common.")
        );
    }

    #[test]
    fn test_detail_before_message() {
        let body = json!({"message": "ignored", "detail": "Given token not valid for any token type"});
        assert_eq!(
            extract(&body).as_deref(),
            Some("Given token not valid for any token type")
        );
    }

    #[test]
    fn test_non_field_errors_first_entry() {
        let body = json!({"non_field_errors": ["Invalid credentials", "second"]});
        assert_eq!(extract(&body).as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn test_field_errors_in_key_order() {
        let body = json!({
            "username": ["A user with this username already exists."],
            "email": ["A user with this email already exists."]
        });
        assert_eq!(
            extract(&body).as_deref(),
            Some("email: A user with this email already exists.")
        );
    }

    #[test]
    fn test_nothing_usable() {
        assert_eq!(extract(&json!({})), None);
        assert_eq!(extract(&json!({"error": ""})), None);
        assert_eq!(extract(&json!(42)), None);
        assert_eq!(extract(&Value::Null), None);
    }

    #[test]
    fn test_describe_falls_back_to_reason() {
        assert_eq!(describe(404, None), "Not Found (404)");
        assert_eq!(describe(500, Some(&json!({}))), "Internal Server Error (500)");
        assert_eq!(describe(418, None), "Request failed with status 418");
        assert_eq!(
            describe(400, Some(&json!({"error": "Token is required."}))),
            "Token is required."
        );
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            ".{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 32, 6, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                proptest::collection::btree_map("[a-z_]{1,10}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_extract_never_panics(body in arb_json()) {
            if let Some(msg) = extract(&body) {
                prop_assert!(!msg.trim().is_empty());
            }
            let described = describe(400, Some(&body));
            prop_assert!(!described.is_empty());
        }

        #[test]
        fn prop_error_string_always_surfaces(msg in "[A-Za-z][A-Za-z .]{0,30}", other in arb_json()) {
            let body = json!({"error": msg.clone(), "zzz": other});
            prop_assert_eq!(extract(&body), Some(msg.trim().to_string()));
        }
    }
}

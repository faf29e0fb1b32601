//! Primitive Validators
//!
//! Pure predicates over untrusted JSON values. The request parser and the
//! hang-risk estimator build on these; nothing here allocates or fails.

use serde_json::Value;

/// True for a string with at least one character.
pub fn is_non_empty_string(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.is_empty())
}

/// True for a finite number (or numeric string) greater than zero.
pub fn is_positive_numeric(value: Option<&Value>) -> bool {
    positive_number(value).is_some()
}

/// The numeric value of `value` if it passes [`is_positive_numeric`].
pub fn positive_number(value: Option<&Value>) -> Option<f64> {
    numeric(value?).filter(|n| *n > 0.0)
}

/// True for a structured record: not an array, not null, not a scalar.
pub fn is_plain_object(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Object(_)))
}

/// Strict numeric reading: numbers and non-blank numeric strings, finite only.
fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Loose numeric coercion used by trace flags such as `alphahull`.
///
/// Mirrors how a browser script coerces: null, false and blank strings are
/// zero, true is one, anything unparseable is NaN.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

/// Script-style truthiness: null, false, zero, NaN and "" are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_empty_string() {
        assert!(is_non_empty_string(Some(&json!("fig-1"))));
        assert!(!is_non_empty_string(Some(&json!(""))));
        assert!(!is_non_empty_string(Some(&json!(12))));
        assert!(!is_non_empty_string(None));
    }

    #[test]
    fn test_positive_numeric_accepts_numeric_strings() {
        assert_eq!(positive_number(Some(&json!(2.5))), Some(2.5));
        assert_eq!(positive_number(Some(&json!(" 300 "))), Some(300.0));
        assert!(!is_positive_numeric(Some(&json!(0))));
        assert!(!is_positive_numeric(Some(&json!(-4))));
        assert!(!is_positive_numeric(Some(&json!("abc"))));
        assert!(!is_positive_numeric(Some(&json!("inf"))));
        assert!(!is_positive_numeric(Some(&json!("   "))));
        assert!(!is_positive_numeric(Some(&json!(true))));
    }

    #[test]
    fn test_plain_object() {
        assert!(is_plain_object(Some(&json!({}))));
        assert!(!is_plain_object(Some(&json!([]))));
        assert!(!is_plain_object(Some(&Value::Null)));
        assert!(!is_plain_object(None));
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&Value::Null), 0.0);
        assert_eq!(coerce_number(&json!(true)), 1.0);
        assert_eq!(coerce_number(&json!("")), 0.0);
        assert_eq!(coerce_number(&json!("-1")), -1.0);
        assert!(coerce_number(&json!("x")).is_nan());
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&Value::Null)));
        assert!(!is_truthy(None));
    }
}

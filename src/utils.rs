//! Best-effort value coercion shared by the ledger and consumption folds.

use serde_json::Value;

use crate::types::Quantity;

/// Coerce a JSON value into a quantity, falling back to `0.0`.
///
/// Numbers pass through; strings are trimmed and parsed. Anything else,
/// including non-finite results, yields `0.0`.
pub fn coerce_quantity(value: Option<&Value>) -> Quantity {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|number| number.is_finite()).unwrap_or(0.0)
}

/// Coerce a JSON value into epoch milliseconds.
pub fn coerce_epoch_millis(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        Some(Value::String(raw)) => {
            let raw = raw.trim();
            raw.parse::<i64>().ok().or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v as i64)
            })
        }
        _ => None,
    }
}

/// Render a JSON scalar as text for flag comparisons.
pub fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(raw)) => Some(raw.trim().to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerce_quantity_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_quantity(Some(&json!(12))), 12.0);
        assert_eq!(coerce_quantity(Some(&json!(2.5))), 2.5);
        assert_eq!(coerce_quantity(Some(&json!(" 7 "))), 7.0);
        assert_eq!(coerce_quantity(Some(&json!("-3"))), -3.0);
    }

    #[test]
    fn coerce_quantity_falls_back_to_zero() {
        assert_eq!(coerce_quantity(None), 0.0);
        assert_eq!(coerce_quantity(Some(&Value::Null)), 0.0);
        assert_eq!(coerce_quantity(Some(&json!(""))), 0.0);
        assert_eq!(coerce_quantity(Some(&json!("twelve"))), 0.0);
        assert_eq!(coerce_quantity(Some(&json!("NaN"))), 0.0);
        assert_eq!(coerce_quantity(Some(&json!("inf"))), 0.0);
        assert_eq!(coerce_quantity(Some(&json!({"n": 1}))), 0.0);
        assert_eq!(coerce_quantity(Some(&json!(true))), 0.0);
    }

    #[test]
    fn coerce_epoch_millis_handles_strings_and_floats() {
        assert_eq!(coerce_epoch_millis(Some(&json!(1700000000000_i64))), Some(1700000000000));
        assert_eq!(coerce_epoch_millis(Some(&json!("1700000000000"))), Some(1700000000000));
        assert_eq!(coerce_epoch_millis(Some(&json!(1.5e12))), Some(1500000000000));
        assert_eq!(coerce_epoch_millis(Some(&json!("yesterday"))), None);
        assert_eq!(coerce_epoch_millis(None), None);
    }

    #[test]
    fn scalar_text_renders_flags() {
        assert_eq!(scalar_text(Some(&json!(" no "))).as_deref(), Some("no"));
        assert_eq!(scalar_text(Some(&json!(false))).as_deref(), Some("false"));
        assert_eq!(scalar_text(Some(&json!(0))).as_deref(), Some("0"));
        assert_eq!(scalar_text(Some(&json!([]))), None);
    }
}

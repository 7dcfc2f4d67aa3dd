//! Request validation
//!
//! Turns an arbitrary request body into a [`FeatureVector`], or reports the
//! first rule the body breaks. Checks run in a fixed order and stop at the
//! first failure:
//! 1. the body is a JSON object
//! 2. the object has a `features` key
//! 3. `features` is an array of exactly four elements
//! 4. every element converts to a float

use crate::models::{FeatureVector, NUM_FEATURES};
use serde_json::Value;
use thiserror::Error;

/// Name of the required request field
pub const FEATURES_FIELD: &str = "features";

/// Reason a prediction request was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("No JSON data provided or invalid JSON format")]
    MalformedJson,

    #[error("Missing 'features' field")]
    MissingField,

    #[error("Features must be a list of 4 numeric values")]
    WrongArity { provided: Value },

    #[error("All features must be numeric")]
    NonNumeric { provided: Value },
}

impl ValidationError {
    /// Machine-readable name of the violated rule
    pub fn rule(&self) -> &'static str {
        match self {
            ValidationError::MalformedJson => "malformed_json",
            ValidationError::MissingField => "missing_field",
            ValidationError::WrongArity { .. } => "wrong_arity",
            ValidationError::NonNumeric { .. } => "non_numeric_value",
        }
    }

    /// The offending input, when there is one worth echoing back
    pub fn provided(&self) -> Option<&Value> {
        match self {
            ValidationError::WrongArity { provided } | ValidationError::NonNumeric { provided } => {
                Some(provided)
            }
            _ => None,
        }
    }
}

/// Parse a raw request body and validate it
pub fn parse_body(body: &[u8]) -> Result<FeatureVector, ValidationError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidationError::MalformedJson)?;
    validate(&value)
}

/// Validate an already-parsed JSON value
pub fn validate(value: &Value) -> Result<FeatureVector, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::MalformedJson)?;
    let features = object
        .get(FEATURES_FIELD)
        .ok_or(ValidationError::MissingField)?;

    let items = match features.as_array() {
        Some(items) if items.len() == NUM_FEATURES => items,
        _ => {
            return Err(ValidationError::WrongArity {
                provided: features.clone(),
            })
        }
    };

    let mut values = [0.0; NUM_FEATURES];
    for (slot, item) in values.iter_mut().zip(items) {
        *slot = to_float(item).ok_or_else(|| ValidationError::NonNumeric {
            provided: features.clone(),
        })?;
    }

    Ok(FeatureVector::new(values))
}

/// Numbers convert as-is, booleans to 1 or 0, strings when they parse as a float.
fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_features() {
        let features = validate(&json!({"features": [5.1, 3.5, 1.4, 0.2]})).unwrap();
        assert_eq!(features.values(), &[5.1, 3.5, 1.4, 0.2]);
    }

    #[test]
    fn test_integer_and_string_features_convert() {
        let features = validate(&json!({"features": [1, "2.5", " 3 ", 4]})).unwrap();
        assert_eq!(features.values(), &[1.0, 2.5, 3.0, 4.0]);
    }

    #[test]
    fn test_booleans_convert() {
        let features = validate(&json!({"features": [1, true, 3, false]})).unwrap();
        assert_eq!(features.values(), &[1.0, 1.0, 3.0, 0.0]);
    }

    #[test]
    fn test_out_of_domain_values_pass() {
        let features = validate(&json!({"features": [-100.0, 0.0, 1e6, 42]})).unwrap();
        assert_eq!(features.values()[2], 1e6);
    }

    #[test]
    fn test_unparsable_body() {
        assert_eq!(parse_body(b"{not json"), Err(ValidationError::MalformedJson));
        assert_eq!(parse_body(b""), Err(ValidationError::MalformedJson));
    }

    #[test]
    fn test_non_object_body() {
        assert_eq!(
            validate(&json!([5.1, 3.5, 1.4, 0.2])),
            Err(ValidationError::MalformedJson)
        );
        assert_eq!(validate(&json!("features")), Err(ValidationError::MalformedJson));
    }

    #[test]
    fn test_missing_features_field() {
        let err = validate(&json!({"wrong_field": [1, 2, 3, 4]})).unwrap_err();
        assert_eq!(err, ValidationError::MissingField);
        assert!(err.to_string().contains("features"));
        assert_eq!(err.rule(), "missing_field");
    }

    #[test]
    fn test_empty_object_is_missing_field() {
        assert_eq!(validate(&json!({})), Err(ValidationError::MissingField));
    }

    #[test]
    fn test_wrong_arity() {
        for features in [json!([1, 2, 3]), json!([1, 2, 3, 4, 5]), json!([]), json!("1,2,3,4")] {
            let err = validate(&json!({ "features": features.clone() })).unwrap_err();
            assert_eq!(err.rule(), "wrong_arity");
            assert_eq!(err.provided(), Some(&features));
        }
    }

    #[test]
    fn test_non_numeric_values() {
        for features in [
            json!(["a", "b", "c", "d"]),
            json!([1, 2, 3, null]),
            json!([1, 2, {"v": 3}, 4]),
            json!([1, [2], 3, 4]),
        ] {
            let err = validate(&json!({ "features": features })).unwrap_err();
            assert_eq!(err.rule(), "non_numeric_value");
        }
    }

    #[test]
    fn test_arity_checked_before_numeric() {
        let err = validate(&json!({"features": ["a", "b", "c"]})).unwrap_err();
        assert_eq!(err.rule(), "wrong_arity");
    }
}

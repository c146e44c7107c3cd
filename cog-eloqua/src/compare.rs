//! Small operator set used by validation steps to compare a contact field
//! against an expected value.

use serde_json::Value;
use thiserror::Error;

pub const OPERATORS: &[&str] = &[
    "be",
    "not be",
    "contain",
    "not contain",
    "be greater than",
    "be less than",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompareError {
    #[error("Unknown check {0}. Please use one of: be, not be, contain, not contain, be greater than, be less than")]
    UnknownOperator(String),
    #[error("Couldn't check that {0} {1} {2}: both values must be numeric")]
    InvalidOperand(String, String, String),
}

/// Applies `operator` to an actual and an expected value. Equality and
/// containment compare case-insensitively on the stringified values;
/// ordering operators require both operands to parse as numbers.
pub fn compare(operator: &str, actual: &Value, expected: &Value) -> Result<bool, CompareError> {
    let op = operator.trim().to_lowercase();
    let a = stringify(actual);
    let e = stringify(expected);

    match op.as_str() {
        "be" => Ok(a.eq_ignore_ascii_case(&e)),
        "not be" => Ok(!a.eq_ignore_ascii_case(&e)),
        "contain" => Ok(a.to_lowercase().contains(&e.to_lowercase())),
        "not contain" => Ok(!a.to_lowercase().contains(&e.to_lowercase())),
        "be greater than" | "be less than" => match (as_number(actual), as_number(expected)) {
            (Some(x), Some(y)) => Ok(if op == "be greater than" { x > y } else { x < y }),
            _ => Err(CompareError::InvalidOperand(a, op, e)),
        },
        _ => Err(CompareError::UnknownOperator(operator.to_owned())),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equality_is_case_insensitive() {
        assert_eq!(compare("be", &json!("Atommy"), &json!("atommy")), Ok(true));
        assert_eq!(compare("not be", &json!("a"), &json!("b")), Ok(true));
        assert_eq!(compare("be", &json!(5), &json!("5")), Ok(true));
    }

    #[test]
    fn containment() {
        assert_eq!(compare("contain", &json!("hello world"), &json!("World")), Ok(true));
        assert_eq!(compare("not contain", &json!("hello"), &json!("x")), Ok(true));
    }

    #[test]
    fn numeric_ordering() {
        assert_eq!(compare("be greater than", &json!(5), &json!("3")), Ok(true));
        assert_eq!(compare("be less than", &json!("2"), &json!(3)), Ok(true));
        assert_eq!(compare("be greater than", &json!(1), &json!(3)), Ok(false));
    }

    #[test]
    fn non_numeric_operand_is_an_error() {
        let result = compare("be greater than", &json!("abc"), &json!(3));
        assert!(matches!(result, Err(CompareError::InvalidOperand(..))));
    }

    #[test]
    fn unknown_operator_is_an_error() {
        let result = compare("be approximately", &json!(1), &json!(1));
        assert!(matches!(result, Err(CompareError::UnknownOperator(..))));
    }
}

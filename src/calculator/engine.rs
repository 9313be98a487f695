use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Arithmetic operation kinds, stored in history rows as the Postgres enum
/// `calc_operation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "calc_operation", rename_all = "snake_case")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Exponentiation,
    SquareRoot,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Addition => "addition",
            Operation::Subtraction => "subtraction",
            Operation::Multiplication => "multiplication",
            Operation::Division => "division",
            Operation::Exponentiation => "exponentiation",
            Operation::SquareRoot => "square_root",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared operand parse: accepts JSON numbers and numeric strings, rejects
/// everything else (including strings that parse to inf/NaN).
pub fn parse_operand(field: &'static str, value: &serde_json::Value) -> Result<f64, ApiError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or(ApiError::InvalidOperand(field))
}

pub fn add(a: f64, b: f64) -> f64 {
    a + b
}

pub fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

pub fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

pub fn divide(a: f64, b: f64) -> Result<f64, ApiError> {
    if b == 0.0 {
        return Err(ApiError::DivisionByZero);
    }
    Ok(a / b)
}

pub fn power(a: f64, b: f64) -> Result<f64, ApiError> {
    let result = a.powf(b);
    if !result.is_finite() {
        return Err(ApiError::NonFiniteResult);
    }
    Ok(result)
}

pub fn sqrt(a: f64) -> Result<f64, ApiError> {
    if a < 0.0 {
        return Err(ApiError::NegativeOperand);
    }
    Ok(a.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_subtract_multiply_follow_native_float_semantics() {
        for (a, b) in [(10.0, 5.0), (-3.5, 2.25), (0.1, 0.2), (1e15, -1e15)] {
            assert_eq!(add(a, b), a + b);
            assert_eq!(subtract(a, b), a - b);
            assert_eq!(multiply(a, b), a * b);
        }
    }

    #[test]
    fn divide_rejects_zero_divisor_for_any_dividend() {
        for a in [0.0, 1.0, -42.0, 1e300] {
            assert!(matches!(divide(a, 0.0), Err(ApiError::DivisionByZero)));
            // -0 compares equal to 0 and is rejected the same way.
            assert!(matches!(divide(a, -0.0), Err(ApiError::DivisionByZero)));
        }
        assert_eq!(divide(10.0, 4.0).unwrap(), 2.5);
    }

    #[test]
    fn power_rejects_non_finite_results() {
        assert!(matches!(
            power(10.0, 1000.0),
            Err(ApiError::NonFiniteResult)
        ));
        assert!(matches!(power(-1.0, 0.5), Err(ApiError::NonFiniteResult)));
        assert_eq!(power(2.0, 10.0).unwrap(), 1024.0);
        assert!((power(10.0, -2.0).unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn sqrt_rejects_negative_operands_only() {
        assert!(matches!(sqrt(-1.0), Err(ApiError::NegativeOperand)));
        assert!(matches!(sqrt(-1e-9), Err(ApiError::NegativeOperand)));
        assert_eq!(sqrt(0.0).unwrap(), 0.0);
        assert_eq!(sqrt(-0.0).unwrap(), 0.0);
        for a in [1.5, -3.5, 42.0, -42.0, 1e10] {
            assert_eq!(sqrt(a * a).unwrap(), a.abs());
        }
    }

    #[test]
    fn parse_operand_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_operand("a", &json!(10)).unwrap(), 10.0);
        assert_eq!(parse_operand("a", &json!(-2.5)).unwrap(), -2.5);
        assert_eq!(parse_operand("a", &json!("3.25")).unwrap(), 3.25);
        assert_eq!(parse_operand("a", &json!(" 7 ")).unwrap(), 7.0);
    }

    #[test]
    fn parse_operand_rejects_everything_else() {
        for value in [
            json!("abc"),
            json!(""),
            json!("inf"),
            json!("NaN"),
            json!(null),
            json!(true),
            json!([1]),
            json!({"n": 1}),
        ] {
            assert!(matches!(
                parse_operand("b", &value),
                Err(ApiError::InvalidOperand("b"))
            ));
        }
    }

    #[test]
    fn operation_names_match_the_stored_enum() {
        assert_eq!(Operation::Addition.to_string(), "addition");
        assert_eq!(Operation::SquareRoot.to_string(), "square_root");
        let parsed: Operation = serde_json::from_str("\"exponentiation\"").unwrap();
        assert_eq!(parsed, Operation::Exponentiation);
    }
}

//! Numeric coercion for PlanetLang field values.
//!
//! Coordinates never fail: anything that does not coerce becomes 0.
//! Gravity follows float-prefix parsing and reports an unparsable value as
//! [`Gravity::NotANumber`].

use std::sync::OnceLock;

use regex::Regex;

use crate::config::NumericMode;
use crate::scene_model::Gravity;

static INTEGER: OnceLock<Regex> = OnceLock::new();
static FLOAT_PREFIX: OnceLock<Regex> = OnceLock::new();

fn integer_pattern() -> &'static Regex {
    INTEGER.get_or_init(|| Regex::new(r"^[+-]?\d+$").expect("valid integer pattern"))
}

fn float_prefix_pattern() -> &'static Regex {
    FLOAT_PREFIX.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|\d+\.?\d*(?:[eE][+-]?\d+)?|\.\d+(?:[eE][+-]?\d+)?)")
            .expect("valid float pattern")
    })
}

/// The value part of a field, cut at the first `,` or `;` and trimmed.
fn field_value(raw: &str) -> &str {
    raw.split([',', ';']).next().unwrap_or("").trim()
}

/// Coerce a coordinate field (`x:` / `y:` payload) to a number.
pub fn coerce_coordinate(raw: &str, mode: NumericMode) -> f64 {
    let value = field_value(raw);
    match mode {
        NumericMode::StrictInteger => {
            if integer_pattern().is_match(value) {
                value.parse::<f64>().unwrap_or(0.0)
            } else {
                0.0
            }
        }
        NumericMode::Lenient => {
            if value.is_empty() {
                return 0.0;
            }
            match value.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => 0.0,
            }
        }
    }
}

/// Parse the longest leading float literal, ignoring leading whitespace.
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let literal = float_prefix_pattern().find(text)?.as_str();
    match literal.trim_start_matches(['+', '-']) {
        "Infinity" if literal.starts_with('-') => Some(f64::NEG_INFINITY),
        "Infinity" => Some(f64::INFINITY),
        _ => literal.parse::<f64>().ok(),
    }
}

/// Gravity field coercion.
pub fn parse_gravity(raw: &str) -> Gravity {
    match parse_float_prefix(raw) {
        Some(v) => Gravity::Value(v),
        None => Gravity::NotANumber,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_integer_coordinates() {
        let strict = NumericMode::StrictInteger;
        assert_eq!(coerce_coordinate(" 5,", strict), 5.0);
        assert_eq!(coerce_coordinate(" -3;", strict), -3.0);
        assert_eq!(coerce_coordinate("+12", strict), 12.0);
        assert_eq!(coerce_coordinate(" 5.5", strict), 0.0);
        assert_eq!(coerce_coordinate("abc", strict), 0.0);
        assert_eq!(coerce_coordinate("", strict), 0.0);
    }

    #[test]
    fn test_lenient_coordinates() {
        let lenient = NumericMode::Lenient;
        assert_eq!(coerce_coordinate(" 5.5,", lenient), 5.5);
        assert_eq!(coerce_coordinate("-0.25;", lenient), -0.25);
        assert_eq!(coerce_coordinate("  ", lenient), 0.0);
        assert_eq!(coerce_coordinate("NaN", lenient), 0.0);
        assert_eq!(coerce_coordinate("ten", lenient), 0.0);
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(parse_float_prefix(" 9.8;"), Some(9.8));
        assert_eq!(parse_float_prefix("-1.5e2 m/s"), Some(-150.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("3."), Some(3.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_prefix("heavy"), None);
        assert_eq!(parse_float_prefix(""), None);
    }

    #[test]
    fn test_parse_gravity() {
        assert_eq!(parse_gravity(" 9.8;"), Gravity::Value(9.8));
        assert_eq!(parse_gravity(" lots"), Gravity::NotANumber);
    }
}

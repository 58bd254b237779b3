//! Lenient numeric coercion for loosely typed quantity and price columns

use bigdecimal::BigDecimal;
use serde_json::Value;
use std::str::FromStr;

/// Read a decimal out of a JSON number or numeric string
///
/// Null, blanks, booleans, containers and strings that do not parse as a
/// number all yield `None`.
pub fn coerce_decimal(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(number) => BigDecimal::from_str(&number.to_string()).ok(),
        Value::String(text) => parse_decimal(text),
        _ => None,
    }
}

/// Parse a trimmed numeric string, `None` when blank or not a number
pub fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    BigDecimal::from_str(trimmed).ok()
}

/// Serde adapter for `Option<BigDecimal>` fields fed by loosely typed JSON
pub mod lenient {
    use bigdecimal::BigDecimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(super::coerce_decimal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_and_numeric_strings() {
        assert_eq!(coerce_decimal(&json!(10)), Some(BigDecimal::from(10)));
        assert_eq!(
            coerce_decimal(&json!(2.5)),
            Some(BigDecimal::from_str("2.5").unwrap())
        );
        assert_eq!(
            coerce_decimal(&json!(" 7.25 ")),
            Some(BigDecimal::from_str("7.25").unwrap())
        );
    }

    #[test]
    fn test_non_numeric_values_are_absent() {
        assert_eq!(coerce_decimal(&json!(null)), None);
        assert_eq!(coerce_decimal(&json!("")), None);
        assert_eq!(coerce_decimal(&json!("twelve")), None);
        assert_eq!(coerce_decimal(&json!(true)), None);
        assert_eq!(coerce_decimal(&json!({ "qty": 1 })), None);
    }
}

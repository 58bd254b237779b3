//! Validation utilities for request parameters

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::types::*;

/// Fail with `MissingField` when a required identifier is blank
pub fn require_field(name: &str, value: &str) -> ProcurementResult<()> {
    if value.trim().is_empty() {
        return Err(ProcurementError::MissingField(name.to_string()));
    }
    Ok(())
}

/// Fetch a required, non-blank query parameter
pub fn require_param(params: &HashMap<String, String>, name: &str) -> ProcurementResult<String> {
    match params.get(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ProcurementError::MissingField(name.to_string())),
    }
}

/// Parse a `YYYY-MM-DD` date parameter
pub fn parse_date(name: &str, value: &str) -> ProcurementResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ProcurementError::Validation(format!(
            "{} must be a date in YYYY-MM-DD format, got '{}'",
            name, value
        ))
    })
}

/// Check that an inclusive date range is not inverted
pub fn validate_date_range(start_date: NaiveDate, end_date: NaiveDate) -> ProcurementResult<()> {
    if start_date > end_date {
        return Err(ProcurementError::Validation(format!(
            "start_date {} is after end_date {}",
            start_date, end_date
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_param() {
        let mut params = HashMap::new();
        params.insert("corporation_uuid".to_string(), " corp-1 ".to_string());
        params.insert("project_uuid".to_string(), "".to_string());

        assert_eq!(require_param(&params, "corporation_uuid").unwrap(), "corp-1");
        assert!(matches!(
            require_param(&params, "project_uuid"),
            Err(ProcurementError::MissingField(_))
        ));
        assert!(matches!(
            require_param(&params, "start_date"),
            Err(ProcurementError::MissingField(_))
        ));
    }

    #[test]
    fn test_parse_date_and_range() {
        let start = parse_date("start_date", "2024-01-01").unwrap();
        let end = parse_date("end_date", "2024-01-31").unwrap();
        assert!(validate_date_range(start, end).is_ok());
        assert!(validate_date_range(end, start).is_err());
        assert!(parse_date("start_date", "01/31/2024").is_err());
    }
}

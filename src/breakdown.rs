//! Parser for the semi-structured `financial_breakdown` column
//!
//! Breakdowns arrive either as a JSON object or as a string holding one, and
//! the same total is stored under different keys depending on which screen
//! saved the record. All key fallbacks live here.

use bigdecimal::BigDecimal;
use serde_json::{Map, Value};
use tracing::warn;

use crate::quantity::coerce_decimal;
use crate::types::OrderKind;

/// Fallbacks tried after the order kind's own total key
const ORDER_TOTAL_FALLBACKS: [&str; 2] = ["totalAmount", "total"];
const INVOICE_TOTAL_KEYS: [&str; 3] = ["total_invoice_amount", "totalAmount", "total"];
const TAX_TOTAL_KEYS: [&str; 3] = ["tax_total", "totalTax", "tax"];
const CHARGES_TOTAL_KEYS: [&str; 3] = ["charges_total", "totalCharges", "charges"];

/// Breakdown parsing errors
#[derive(Debug, thiserror::Error)]
pub enum BreakdownError {
    #[error("Malformed financial breakdown: {0}")]
    Malformed(String),
    #[error("Financial breakdown {0} is not a JSON object")]
    NotAnObject(String),
}

/// The `totals` section of a financial breakdown
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FinancialBreakdown {
    totals: Map<String, Value>,
}

impl FinancialBreakdown {
    /// Parse a raw breakdown value; `null` parses to an empty breakdown
    pub fn parse(raw: &Value) -> Result<Self, BreakdownError> {
        match raw {
            Value::Null => Ok(Self::default()),
            Value::String(text) => {
                let decoded: Value = serde_json::from_str(text)
                    .map_err(|err| BreakdownError::Malformed(err.to_string()))?;
                match decoded {
                    Value::Object(_) | Value::Null => Self::parse(&decoded),
                    _ => Err(BreakdownError::NotAnObject(text.clone())),
                }
            }
            Value::Object(section) => match section.get("totals") {
                None | Some(Value::Null) => Ok(Self::default()),
                Some(Value::Object(totals)) => Ok(Self {
                    totals: totals.clone(),
                }),
                Some(other) => Err(BreakdownError::NotAnObject(format!("totals {}", other))),
            },
            other => Err(BreakdownError::NotAnObject(other.to_string())),
        }
    }

    /// Parse a record's breakdown, logging and falling back to empty on failure
    pub fn parse_or_empty(raw: Option<&Value>, record_uuid: &str) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        Self::parse(raw).unwrap_or_else(|err| {
            warn!(record_uuid, error = %err, "ignoring unreadable financial breakdown");
            Self::default()
        })
    }

    /// First key holding a numeric value
    fn first_amount<'a, I>(&self, keys: I) -> Option<BigDecimal>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter().find_map(|key| self.totals.get(key).and_then(coerce_decimal))
    }

    /// Order total: `total_po_amount` / `total_co_amount`, then `totalAmount`, then `total`
    pub fn order_total(&self, kind: OrderKind) -> BigDecimal {
        let keys = std::iter::once(kind.total_key()).chain(ORDER_TOTAL_FALLBACKS);
        self.first_amount(keys).unwrap_or_else(|| BigDecimal::from(0))
    }

    pub fn invoice_total(&self) -> Option<BigDecimal> {
        self.first_amount(INVOICE_TOTAL_KEYS)
    }

    pub fn tax_total(&self) -> BigDecimal {
        self.first_amount(TAX_TOTAL_KEYS).unwrap_or_else(|| BigDecimal::from(0))
    }

    pub fn charges_total(&self) -> BigDecimal {
        self.first_amount(CHARGES_TOTAL_KEYS).unwrap_or_else(|| BigDecimal::from(0))
    }
}

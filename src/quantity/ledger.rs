//! Used-quantity tracking and over-receipt detection

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::filters::id_key;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::require_field;

/// Scope of a used-quantity lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsedQuantityQuery {
    pub corporation_uuid: String,
    pub project_uuid: String,
    /// Estimate (or order) whose lines are being consumed
    pub estimate_uuid: String,
    /// Document currently being edited, left out so it does not count itself
    #[serde(default)]
    pub exclude_document_uuid: Option<String>,
}

impl UsedQuantityQuery {
    pub fn new(corporation_uuid: String, project_uuid: String, estimate_uuid: String) -> Self {
        Self {
            corporation_uuid,
            project_uuid,
            estimate_uuid,
            exclude_document_uuid: None,
        }
    }

    pub fn excluding(mut self, document_uuid: impl Into<String>) -> Self {
        self.exclude_document_uuid = Some(document_uuid.into());
        self
    }

    pub fn validate(&self) -> ProcurementResult<()> {
        require_field("corporation_uuid", &self.corporation_uuid)?;
        require_field("project_uuid", &self.project_uuid)?;
        require_field("estimate_uuid", &self.estimate_uuid)?;
        Ok(())
    }
}

/// Over-receipt verdict for one receipt line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptCheck {
    pub item_uuid: Option<String>,
    pub ordered_quantity: Option<BigDecimal>,
    /// Quantity already consumed by other documents
    pub used_quantity: BigDecimal,
    pub received_quantity: Option<BigDecimal>,
    /// Quantity still open before this receipt, `None` without an ordered quantity
    pub remaining_quantity: Option<BigDecimal>,
    pub is_over_received: bool,
}

/// Whether more was received than ordered
///
/// Missing quantities and a zero (or negative) ordered quantity never count as
/// over-received.
pub fn is_over_received(ordered: Option<&BigDecimal>, received: Option<&BigDecimal>) -> bool {
    match (ordered, received) {
        (Some(ordered), Some(received)) => {
            *ordered > BigDecimal::from(0) && received > ordered
        }
        _ => false,
    }
}

/// Open quantity on a line, floored at zero
pub fn remaining_quantity(ordered: &BigDecimal, used: &BigDecimal) -> BigDecimal {
    let remaining = ordered - used;
    if remaining < BigDecimal::from(0) {
        BigDecimal::from(0)
    } else {
        remaining
    }
}

/// Sum consumed quantity per source line
///
/// Keys are lowercased line identifiers. Rows from `exclude_document` and rows
/// without a usable non-negative quantity are skipped.
pub fn sum_consumptions<I>(rows: I, exclude_document: Option<&str>) -> HashMap<String, BigDecimal>
where
    I: IntoIterator<Item = QuantityConsumption>,
{
    let exclude = exclude_document.map(id_key);
    let mut used: HashMap<String, BigDecimal> = HashMap::new();

    for row in rows {
        if exclude.as_deref() == Some(id_key(&row.document_uuid).as_str()) {
            continue;
        }
        let quantity = match row.quantity {
            Some(quantity) if quantity >= BigDecimal::from(0) => quantity,
            other => {
                debug!(
                    document_uuid = %row.document_uuid,
                    source_item_uuid = %row.source_item_uuid,
                    quantity = ?other,
                    "skipping consumption without usable quantity"
                );
                continue;
            }
        };
        *used
            .entry(id_key(&row.source_item_uuid))
            .or_insert_with(|| BigDecimal::from(0)) += quantity;
    }

    used
}

/// Check a receipt line against the quantity other documents already used
pub fn check_receipt_line(
    item: &ReceiptNoteItem,
    used_quantities: &HashMap<String, BigDecimal>,
) -> ReceiptCheck {
    let used_quantity = item
        .item_uuid
        .as_ref()
        .and_then(|uuid| used_quantities.get(&id_key(uuid)))
        .cloned()
        .unwrap_or_else(|| BigDecimal::from(0));

    let remaining = item
        .ordered_quantity
        .as_ref()
        .map(|ordered| remaining_quantity(ordered, &used_quantity));

    let is_over = match (&item.ordered_quantity, &item.received_quantity) {
        (Some(ordered), Some(received)) => {
            let consumed = received + &used_quantity;
            is_over_received(Some(ordered), Some(&consumed))
        }
        _ => false,
    };

    ReceiptCheck {
        item_uuid: item.item_uuid.clone(),
        ordered_quantity: item.ordered_quantity.clone(),
        used_quantity,
        received_quantity: item.received_quantity.clone(),
        remaining_quantity: remaining,
        is_over_received: is_over,
    }
}

/// Tracks how much of each source line downstream documents have consumed
pub struct QuantityLedger<S> {
    storage: S,
}

impl<S> QuantityLedger<S>
where
    S: OrderRepository + ReceiptNoteRepository + VendorInvoiceRepository,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Quantity consumed per source line by every document except the excluded one
    #[instrument(skip(self), fields(estimate_uuid = %query.estimate_uuid))]
    pub async fn used_quantities(
        &self,
        query: &UsedQuantityQuery,
    ) -> ProcurementResult<HashMap<String, BigDecimal>> {
        query.validate()?;

        let (orders, receipts, invoices) = futures::join!(
            self.storage.order_consumptions(query),
            self.storage.receipt_consumptions(query),
            self.storage.invoice_consumptions(query),
        );

        let rows = orders?.into_iter().chain(receipts?).chain(invoices?);
        Ok(sum_consumptions(rows, query.exclude_document_uuid.as_deref()))
    }

    /// Over-receipt verdicts for a set of receipt lines
    pub async fn check_receipt(
        &self,
        query: &UsedQuantityQuery,
        items: &[ReceiptNoteItem],
    ) -> ProcurementResult<Vec<ReceiptCheck>> {
        let used = self.used_quantities(query).await?;
        Ok(items
            .iter()
            .map(|item| check_receipt_line(item, &used))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn consumption(document: &str, item: &str, quantity: Option<&str>) -> QuantityConsumption {
        QuantityConsumption {
            document_uuid: document.to_string(),
            source_document_uuid: "est-1".to_string(),
            source_item_uuid: item.to_string(),
            quantity: quantity.map(dec),
        }
    }

    #[test]
    fn test_is_over_received() {
        assert!(is_over_received(Some(&dec("10")), Some(&dec("15"))));
        assert!(!is_over_received(Some(&dec("10")), Some(&dec("10"))));
        assert!(!is_over_received(Some(&dec("0")), Some(&dec("5"))));
        assert!(!is_over_received(None, Some(&dec("5"))));
        assert!(!is_over_received(Some(&dec("10")), None));
    }

    #[test]
    fn test_sum_consumptions_excludes_current_document() {
        let rows = vec![
            consumption("po-1", "LINE-A", Some("4")),
            consumption("po-2", "line-a", Some("2.5")),
            consumption("PO-3", "line-b", Some("1")),
            consumption("po-2", "line-b", None),
            consumption("po-4", "line-b", Some("-3")),
        ];

        let used = sum_consumptions(rows, Some("po-3"));

        assert_eq!(used.get("line-a"), Some(&dec("6.5")));
        assert_eq!(used.get("line-b"), None);
    }

    #[test]
    fn test_check_receipt_line_counts_other_documents() {
        let mut used = HashMap::new();
        used.insert("line-a".to_string(), dec("6"));

        let item = ReceiptNoteItem {
            item_uuid: Some("LINE-A".to_string()),
            ordered_quantity: Some(dec("10")),
            received_quantity: Some(dec("5")),
            ..Default::default()
        };
        let check = check_receipt_line(&item, &used);
        assert_eq!(check.used_quantity, dec("6"));
        assert_eq!(check.remaining_quantity, Some(dec("4")));
        assert!(check.is_over_received);

        let within = ReceiptNoteItem {
            received_quantity: Some(dec("4")),
            ..item.clone()
        };
        assert!(!check_receipt_line(&within, &used).is_over_received);
    }

    #[test]
    fn test_check_receipt_line_with_incomplete_data() {
        let used = HashMap::new();
        let item = ReceiptNoteItem {
            item_uuid: None,
            ordered_quantity: None,
            received_quantity: Some(dec("50")),
            ..Default::default()
        };
        let check = check_receipt_line(&item, &used);
        assert!(!check.is_over_received);
        assert_eq!(check.remaining_quantity, None);
    }

    #[test]
    fn test_query_validation_names_missing_field() {
        let query = UsedQuantityQuery::new("corp".to_string(), " ".to_string(), "est".to_string());
        let err = query.validate().unwrap_err();
        assert!(matches!(err, ProcurementError::MissingField(ref f) if f == "project_uuid"));
    }
}

//! Core records for orders, receipt notes, vendor invoices and payables reporting

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::allocation::round_currency;
use crate::quantity::coerce::lenient;

fn default_true() -> bool {
    true
}

fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Whether an order is an original purchase order or a change order against one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    #[serde(rename = "PURCHASE_ORDER")]
    PurchaseOrder,
    #[serde(rename = "CHANGE_ORDER")]
    ChangeOrder,
}

impl OrderKind {
    /// Breakdown key holding this kind's own total (`total_po_amount` / `total_co_amount`)
    pub fn total_key(&self) -> &'static str {
        match self {
            OrderKind::PurchaseOrder => "total_po_amount",
            OrderKind::ChangeOrder => "total_co_amount",
        }
    }
}

/// Workflow status of a purchase order or change order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Draft,
    Ready,
    Pending,
    Approved,
    Rejected,
    Completed,
    #[serde(rename = "Partially_Received")]
    PartiallyReceived,
    /// Any status this crate does not interpret
    #[serde(other)]
    Other,
}

/// A line on a purchase order or change order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderLineItem {
    /// Line identifier, also used by receipt notes and the removed-items manifest
    #[serde(default)]
    pub item_uuid: Option<String>,
    /// Cost code the line is charged to
    #[serde(default)]
    pub cost_code_uuid: Option<String>,
    /// Estimate line this order line draws quantity from
    #[serde(default)]
    pub estimate_item_uuid: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered quantity
    #[serde(default, with = "lenient")]
    pub quantity: Option<BigDecimal>,
    #[serde(default, with = "lenient")]
    pub unit_price: Option<BigDecimal>,
    /// Running line total as last saved
    #[serde(default, with = "lenient")]
    pub total: Option<BigDecimal>,
}

impl OrderLineItem {
    /// Create a line with a fresh identifier
    pub fn new(quantity: BigDecimal, unit_price: BigDecimal) -> Self {
        let total = round_currency(&(&quantity * &unit_price));
        Self {
            item_uuid: Some(new_uuid()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
            total: Some(total),
            ..Default::default()
        }
    }

    /// Saved total, or `unit_price * quantity` when no total was stored
    pub fn line_total(&self) -> BigDecimal {
        if let Some(total) = &self.total {
            return total.clone();
        }
        match (&self.unit_price, &self.quantity) {
            (Some(price), Some(quantity)) => round_currency(&(price * quantity)),
            _ => BigDecimal::from(0),
        }
    }
}

/// Entry in a document's removed-items manifest
///
/// Keys other than `item_uuid` and `removed_at` are carried in `extra` so the
/// manifest serializes back exactly as it was read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemovedItem {
    #[serde(default)]
    pub item_uuid: Option<String>,
    #[serde(default)]
    pub removed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemovedItem {
    /// Manifest entry for an item removed now
    pub fn now(item_uuid: impl Into<String>) -> Self {
        Self {
            item_uuid: Some(item_uuid.into()),
            removed_at: Some(Utc::now()),
            extra: Map::new(),
        }
    }
}

/// Purchase order or change order header with its materialized lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub uuid: String,
    pub kind: OrderKind,
    pub corporation_uuid: String,
    pub project_uuid: String,
    #[serde(default)]
    pub vendor_uuid: Option<String>,
    /// Estimate the order's lines draw quantity from
    #[serde(default)]
    pub estimate_uuid: Option<String>,
    pub status: OrderStatus,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Semi-structured totals, either a JSON object or a string holding one
    #[serde(default)]
    pub financial_breakdown: Option<Value>,
    #[serde(default)]
    pub items: Vec<OrderLineItem>,
    #[serde(default)]
    pub removed_items: Vec<RemovedItem>,
}

impl Order {
    /// Create an active draft order with a fresh identifier
    pub fn new(kind: OrderKind, corporation_uuid: String, project_uuid: String) -> Self {
        Self {
            uuid: new_uuid(),
            kind,
            corporation_uuid,
            project_uuid,
            vendor_uuid: None,
            estimate_uuid: None,
            status: OrderStatus::Draft,
            is_active: true,
            financial_breakdown: None,
            items: Vec::new(),
            removed_items: Vec::new(),
        }
    }

    pub fn with_vendor(mut self, vendor_uuid: impl Into<String>) -> Self {
        self.vendor_uuid = Some(vendor_uuid.into());
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_breakdown(mut self, breakdown: Value) -> Self {
        self.financial_breakdown = Some(breakdown);
        self
    }

    pub fn with_items(mut self, items: Vec<OrderLineItem>) -> Self {
        self.items = items;
        self
    }
}

/// A goods receipt note against a purchase order or change order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptNote {
    pub uuid: String,
    pub corporation_uuid: String,
    pub project_uuid: String,
    #[serde(default)]
    pub purchase_order_uuid: Option<String>,
    #[serde(default)]
    pub change_order_uuid: Option<String>,
    #[serde(default)]
    pub items: Vec<ReceiptNoteItem>,
    #[serde(default)]
    pub removed_items: Vec<RemovedItem>,
}

/// Goods received against one order line
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReceiptNoteItem {
    #[serde(default)]
    pub uuid: Option<String>,
    /// Order line the goods were received against
    #[serde(default)]
    pub item_uuid: Option<String>,
    #[serde(default, with = "lenient")]
    pub ordered_quantity: Option<BigDecimal>,
    #[serde(default, with = "lenient")]
    pub received_quantity: Option<BigDecimal>,
    #[serde(default, with = "lenient")]
    pub unit_price: Option<BigDecimal>,
    /// `received_quantity * unit_price`
    #[serde(default, with = "lenient")]
    pub received_total: Option<BigDecimal>,
    /// Received total plus the allocated share of charges
    #[serde(default, with = "lenient")]
    pub grn_total: Option<BigDecimal>,
    /// GRN total plus the allocated share of tax
    #[serde(default, with = "lenient")]
    pub grn_total_with_charges_taxes: Option<BigDecimal>,
}

/// How a vendor invoice relates to an order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceType {
    AgainstPo,
    AgainstCo,
    AgainstAdvancePayment,
    EnterDirectInvoice,
    #[serde(other)]
    Other,
}

/// Line on a vendor invoice
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    #[serde(default)]
    pub item_uuid: Option<String>,
    #[serde(default)]
    pub cost_code_uuid: Option<String>,
    #[serde(default, with = "lenient")]
    pub quantity: Option<BigDecimal>,
    #[serde(default, with = "lenient")]
    pub unit_price: Option<BigDecimal>,
    #[serde(default, with = "lenient")]
    pub total: Option<BigDecimal>,
}

impl InvoiceLineItem {
    /// Saved total, or `unit_price * quantity` when no total was stored
    pub fn subtotal(&self) -> BigDecimal {
        if let Some(total) = &self.total {
            return total.clone();
        }
        match (&self.unit_price, &self.quantity) {
            (Some(price), Some(quantity)) => round_currency(&(price * quantity)),
            _ => BigDecimal::from(0),
        }
    }
}

/// Bill received from a vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorInvoice {
    pub uuid: String,
    pub corporation_uuid: String,
    pub project_uuid: String,
    pub vendor_uuid: String,
    #[serde(default)]
    pub purchase_order_uuid: Option<String>,
    #[serde(default)]
    pub change_order_uuid: Option<String>,
    pub invoice_type: InvoiceType,
    pub bill_date: NaiveDate,
    #[serde(default, with = "lenient")]
    pub amount: Option<BigDecimal>,
    /// Holdback percentage, e.g. 10 for 10%
    #[serde(default, with = "lenient")]
    pub holdback: Option<BigDecimal>,
    pub status: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub financial_breakdown: Option<Value>,
    /// Set once an advance payment has been adjusted against a later invoice
    #[serde(default)]
    pub adjusted_against_vendor_invoice_uuid: Option<String>,
    #[serde(default)]
    pub items: Vec<InvoiceLineItem>,
}

impl VendorInvoice {
    /// Create an active, pending direct invoice with a fresh identifier
    pub fn new(
        corporation_uuid: String,
        project_uuid: String,
        vendor_uuid: String,
        bill_date: NaiveDate,
    ) -> Self {
        Self {
            uuid: new_uuid(),
            corporation_uuid,
            project_uuid,
            vendor_uuid,
            purchase_order_uuid: None,
            change_order_uuid: None,
            invoice_type: InvoiceType::EnterDirectInvoice,
            bill_date,
            amount: None,
            holdback: None,
            status: "Pending".to_string(),
            is_active: true,
            financial_breakdown: None,
            adjusted_against_vendor_invoice_uuid: None,
            items: Vec::new(),
        }
    }

    pub fn with_amount(mut self, amount: BigDecimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_holdback(mut self, percentage: BigDecimal) -> Self {
        self.holdback = Some(percentage);
        self
    }

    pub fn with_breakdown(mut self, breakdown: Value) -> Self {
        self.financial_breakdown = Some(breakdown);
        self
    }

    /// Point the invoice at an order, picking the matching invoice type
    pub fn against_order(mut self, kind: OrderKind, order_uuid: impl Into<String>) -> Self {
        match kind {
            OrderKind::PurchaseOrder => {
                self.purchase_order_uuid = Some(order_uuid.into());
                self.invoice_type = InvoiceType::AgainstPo;
            }
            OrderKind::ChangeOrder => {
                self.change_order_uuid = Some(order_uuid.into());
                self.invoice_type = InvoiceType::AgainstCo;
            }
        }
        self
    }

    /// Turn the invoice into an advance payment on the order it references
    pub fn as_advance_payment(mut self) -> Self {
        self.invoice_type = InvoiceType::AgainstAdvancePayment;
        self
    }

    /// Order this invoice is billed against, purchase order first
    pub fn order_uuid(&self) -> Option<&str> {
        self.purchase_order_uuid
            .as_deref()
            .or(self.change_order_uuid.as_deref())
    }
}

/// Vendor master record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub uuid: String,
    pub corporation_uuid: String,
    pub vendor_name: String,
}

impl Vendor {
    pub fn new(corporation_uuid: String, vendor_name: String) -> Self {
        Self {
            uuid: new_uuid(),
            corporation_uuid,
            vendor_name,
        }
    }
}

/// Amount of an invoice charged to one cost code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCodeAmount {
    pub cost_code_uuid: String,
    #[serde(default)]
    pub cost_code_label: Option<String>,
    pub amount: BigDecimal,
}

/// Quantity of a source line consumed by some downstream document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityConsumption {
    /// Document doing the consuming (order, receipt note or invoice)
    pub document_uuid: String,
    /// Estimate or order the consumed line belongs to
    pub source_document_uuid: String,
    pub source_item_uuid: String,
    #[serde(default, with = "lenient")]
    pub quantity: Option<BigDecimal>,
}

/// Coarse classification used by callers to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
}

/// Errors raised by the procurement core
#[derive(Debug, thiserror::Error)]
pub enum ProcurementError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Record {parent_uuid} was saved but its line items were not: {message}")]
    PartialWrite {
        parent_uuid: String,
        message: String,
    },
}

impl ProcurementError {
    pub fn classification(&self) -> ErrorClass {
        match self {
            ProcurementError::MissingField(_)
            | ProcurementError::Validation(_)
            | ProcurementError::NotFound(_) => ErrorClass::Client,
            ProcurementError::Storage(_) | ProcurementError::PartialWrite { .. } => {
                ErrorClass::Server
            }
        }
    }

    /// HTTP status a web layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ProcurementError::NotFound(_) => 404,
            ProcurementError::MissingField(_) | ProcurementError::Validation(_) => 400,
            ProcurementError::Storage(_) | ProcurementError::PartialWrite { .. } => 500,
        }
    }
}

/// Result type for procurement operations
pub type ProcurementResult<T> = Result<T, ProcurementError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_line_total_prefers_saved_total() {
        let mut line = OrderLineItem::new(BigDecimal::from(3), BigDecimal::from(100));
        assert_eq!(line.line_total(), BigDecimal::from(300));

        line.total = Some(BigDecimal::from(250));
        assert_eq!(line.line_total(), BigDecimal::from(250));

        line.total = None;
        line.unit_price = None;
        assert_eq!(line.line_total(), BigDecimal::from(0));
    }

    #[test]
    fn test_order_deserializes_loose_columns() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "uuid": "po-1",
            "kind": "PURCHASE_ORDER",
            "corporation_uuid": "corp",
            "project_uuid": "proj",
            "status": "Partially_Received",
            "items": [
                { "item_uuid": "a", "quantity": "12.5", "unit_price": 4 },
                { "item_uuid": "b", "quantity": "n/a", "unit_price": null }
            ]
        }))
        .unwrap();

        assert!(order.is_active);
        assert_eq!(order.status, OrderStatus::PartiallyReceived);
        assert_eq!(
            order.items[0].quantity,
            Some(BigDecimal::from_str("12.5").unwrap())
        );
        assert_eq!(order.items[1].quantity, None);
        assert_eq!(order.items[1].unit_price, None);
    }

    #[test]
    fn test_unknown_status_and_invoice_type() {
        let status: OrderStatus = serde_json::from_str("\"Archived\"").unwrap();
        assert_eq!(status, OrderStatus::Other);

        let kind: InvoiceType = serde_json::from_str("\"AGAINST_ADVANCE_PAYMENT\"").unwrap();
        assert_eq!(kind, InvoiceType::AgainstAdvancePayment);
    }

    #[test]
    fn test_removed_item_keeps_unknown_keys() {
        let raw = serde_json::json!({
            "item_uuid": "ITEM-1",
            "removed_at": "2024-03-01T10:00:00Z",
            "removed_by": "user-7"
        });
        let entry: RemovedItem = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.extra.get("removed_by"), Some(&Value::from("user-7")));
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn test_error_classification() {
        let missing = ProcurementError::MissingField("project_uuid".to_string());
        assert_eq!(missing.classification(), ErrorClass::Client);
        assert_eq!(missing.status_code(), 400);
        assert!(missing.to_string().contains("project_uuid"));

        let partial = ProcurementError::PartialWrite {
            parent_uuid: "po-1".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(partial.classification(), ErrorClass::Server);
        assert_eq!(partial.status_code(), 500);
    }
}

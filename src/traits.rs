//! Repository traits isolating the reconciliation logic from persistence
//!
//! Each entity gets its own typed repository. Any backend (PostgreSQL, a
//! hosted REST database, in-memory, ...) plugs in by implementing these
//! methods; the algorithms never see rows or query builders.

use async_trait::async_trait;

use crate::quantity::UsedQuantityQuery;
use crate::types::*;

/// Purchase orders and change orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Save an order header; its `items` are ignored
    async fn insert_order(&self, order: &Order) -> ProcurementResult<()>;

    /// Append line items to an existing order
    async fn insert_order_items(
        &self,
        order_uuid: &str,
        items: &[OrderLineItem],
    ) -> ProcurementResult<()>;

    /// Overwrite an order header and its removed-items manifest
    async fn update_order(&self, order: &Order) -> ProcurementResult<()>;

    /// Get an order with its materialized lines
    async fn get_order(&self, order_uuid: &str) -> ProcurementResult<Option<Order>>;

    /// List orders of one kind for a project
    async fn list_orders(
        &self,
        corporation_uuid: &str,
        project_uuid: &str,
        kind: OrderKind,
    ) -> ProcurementResult<Vec<Order>>;

    /// Order lines drawing quantity from the queried estimate
    async fn order_consumptions(
        &self,
        query: &UsedQuantityQuery,
    ) -> ProcurementResult<Vec<QuantityConsumption>>;
}

/// Goods receipt notes
#[async_trait]
pub trait ReceiptNoteRepository: Send + Sync {
    async fn save_receipt_note(&self, note: &ReceiptNote) -> ProcurementResult<()>;

    async fn get_receipt_note(&self, note_uuid: &str) -> ProcurementResult<Option<ReceiptNote>>;

    /// Replace the receipt fields of the given lines
    ///
    /// Rows match on `uuid`, or on `item_uuid` when the incoming row has no
    /// `uuid`. Unmatched rows are appended.
    async fn update_receipt_items(
        &self,
        note_uuid: &str,
        items: &[ReceiptNoteItem],
    ) -> ProcurementResult<()>;

    /// Received quantities against lines of the queried order
    async fn receipt_consumptions(
        &self,
        query: &UsedQuantityQuery,
    ) -> ProcurementResult<Vec<QuantityConsumption>>;
}

/// Vendor invoices
#[async_trait]
pub trait VendorInvoiceRepository: Send + Sync {
    async fn save_invoice(&self, invoice: &VendorInvoice) -> ProcurementResult<()>;

    async fn get_invoice(&self, invoice_uuid: &str) -> ProcurementResult<Option<VendorInvoice>>;

    /// Overwrite an existing invoice
    async fn update_invoice(&self, invoice: &VendorInvoice) -> ProcurementResult<()>;

    /// All invoices for a project, active or not
    async fn list_invoices(
        &self,
        corporation_uuid: &str,
        project_uuid: &str,
    ) -> ProcurementResult<Vec<VendorInvoice>>;

    /// Quantities on open advance payments against lines of the queried order
    ///
    /// Regular invoices bill goods already counted by receipt notes and are
    /// left out.
    async fn invoice_consumptions(
        &self,
        query: &UsedQuantityQuery,
    ) -> ProcurementResult<Vec<QuantityConsumption>>;
}

/// Vendor master data
#[async_trait]
pub trait VendorRepository: Send + Sync {
    async fn save_vendor(&self, vendor: &Vendor) -> ProcurementResult<()>;

    async fn list_vendors(&self, corporation_uuid: &str) -> ProcurementResult<Vec<Vendor>>;
}

/// Cost-code breakdown of invoices
#[async_trait]
pub trait CostCodeRepository: Send + Sync {
    async fn invoice_cost_codes(&self, invoice_uuid: &str)
        -> ProcurementResult<Vec<CostCodeAmount>>;
}

/// Everything the procurement services need from one backend
pub trait ProcurementStorage:
    OrderRepository
    + ReceiptNoteRepository
    + VendorInvoiceRepository
    + VendorRepository
    + CostCodeRepository
{
}

impl<T> ProcurementStorage for T where
    T: OrderRepository
        + ReceiptNoteRepository
        + VendorInvoiceRepository
        + VendorRepository
        + CostCodeRepository
{
}

/// Per-corporation cache of list data
pub trait ListCache<T>: Send + Sync {
    /// Cached value, `None` when absent or stale
    fn get(&self, corporation_uuid: &str) -> Option<T>;

    fn set(&self, corporation_uuid: &str, value: T);

    fn invalidate(&self, corporation_uuid: &str);
}

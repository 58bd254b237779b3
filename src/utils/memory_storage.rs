//! In-memory storage implementation for testing

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::filters::{same_id, without_removed};
use crate::quantity::UsedQuantityQuery;
use crate::traits::*;
use crate::types::*;

fn read<T>(lock: &RwLock<T>) -> ProcurementResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| ProcurementError::Storage("memory storage lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> ProcurementResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| ProcurementError::Storage("memory storage lock poisoned".to_string()))
}

fn matches_id(left: Option<&str>, right: &str) -> bool {
    left.is_some_and(|left| same_id(left, right))
}

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    orders: Arc<RwLock<HashMap<String, Order>>>,
    receipt_notes: Arc<RwLock<HashMap<String, ReceiptNote>>>,
    invoices: Arc<RwLock<HashMap<String, VendorInvoice>>>,
    vendors: Arc<RwLock<HashMap<String, Vendor>>>,
    cost_codes: Arc<RwLock<HashMap<String, Vec<CostCodeAmount>>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an explicit cost-code split for an invoice
    pub fn set_invoice_cost_codes(
        &self,
        invoice_uuid: &str,
        cost_codes: Vec<CostCodeAmount>,
    ) -> ProcurementResult<()> {
        write(&self.cost_codes)?.insert(invoice_uuid.to_string(), cost_codes);
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStorage {
    async fn insert_order(&self, order: &Order) -> ProcurementResult<()> {
        let mut orders = write(&self.orders)?;
        if orders.contains_key(&order.uuid) {
            return Err(ProcurementError::Validation(format!(
                "order {} already exists",
                order.uuid
            )));
        }
        let header = Order {
            items: Vec::new(),
            ..order.clone()
        };
        orders.insert(order.uuid.clone(), header);
        Ok(())
    }

    async fn insert_order_items(
        &self,
        order_uuid: &str,
        items: &[OrderLineItem],
    ) -> ProcurementResult<()> {
        let mut orders = write(&self.orders)?;
        let order = orders
            .get_mut(order_uuid)
            .ok_or_else(|| ProcurementError::NotFound(order_uuid.to_string()))?;
        order.items.extend_from_slice(items);
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> ProcurementResult<()> {
        let mut orders = write(&self.orders)?;
        let existing = orders
            .get_mut(&order.uuid)
            .ok_or_else(|| ProcurementError::NotFound(order.uuid.clone()))?;
        let items = std::mem::take(&mut existing.items);
        *existing = Order {
            items,
            ..order.clone()
        };
        Ok(())
    }

    async fn get_order(&self, order_uuid: &str) -> ProcurementResult<Option<Order>> {
        Ok(read(&self.orders)?.get(order_uuid).cloned())
    }

    async fn list_orders(
        &self,
        corporation_uuid: &str,
        project_uuid: &str,
        kind: OrderKind,
    ) -> ProcurementResult<Vec<Order>> {
        let orders = read(&self.orders)?;
        Ok(orders
            .values()
            .filter(|order| {
                order.kind == kind
                    && order.corporation_uuid == corporation_uuid
                    && order.project_uuid == project_uuid
            })
            .cloned()
            .collect())
    }

    async fn order_consumptions(
        &self,
        query: &UsedQuantityQuery,
    ) -> ProcurementResult<Vec<QuantityConsumption>> {
        let orders = read(&self.orders)?;
        let mut rows = Vec::new();
        for order in orders.values().filter(|order| {
            order.is_active
                && order.corporation_uuid == query.corporation_uuid
                && order.project_uuid == query.project_uuid
                && matches_id(order.estimate_uuid.as_deref(), &query.estimate_uuid)
        }) {
            let order = without_removed(order.clone());
            for item in order.items {
                if let Some(source_item_uuid) = item.estimate_item_uuid {
                    rows.push(QuantityConsumption {
                        document_uuid: order.uuid.clone(),
                        source_document_uuid: query.estimate_uuid.clone(),
                        source_item_uuid,
                        quantity: item.quantity,
                    });
                }
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl ReceiptNoteRepository for MemoryStorage {
    async fn save_receipt_note(&self, note: &ReceiptNote) -> ProcurementResult<()> {
        write(&self.receipt_notes)?.insert(note.uuid.clone(), note.clone());
        Ok(())
    }

    async fn get_receipt_note(&self, note_uuid: &str) -> ProcurementResult<Option<ReceiptNote>> {
        Ok(read(&self.receipt_notes)?.get(note_uuid).cloned())
    }

    async fn update_receipt_items(
        &self,
        note_uuid: &str,
        items: &[ReceiptNoteItem],
    ) -> ProcurementResult<()> {
        let mut notes = write(&self.receipt_notes)?;
        let note = notes
            .get_mut(note_uuid)
            .ok_or_else(|| ProcurementError::NotFound(note_uuid.to_string()))?;

        for item in items {
            let existing = match (item.uuid.as_deref(), item.item_uuid.as_deref()) {
                (Some(uuid), _) => note
                    .items
                    .iter_mut()
                    .find(|stored| matches_id(stored.uuid.as_deref(), uuid)),
                (None, Some(item_uuid)) => note
                    .items
                    .iter_mut()
                    .find(|stored| matches_id(stored.item_uuid.as_deref(), item_uuid)),
                (None, None) => None,
            };
            match existing {
                Some(stored) => {
                    *stored = ReceiptNoteItem {
                        uuid: item.uuid.clone().or_else(|| stored.uuid.clone()),
                        ..item.clone()
                    };
                }
                None => {
                    let mut item = item.clone();
                    item.uuid.get_or_insert_with(|| uuid::Uuid::new_v4().to_string());
                    note.items.push(item);
                }
            }
        }
        Ok(())
    }

    async fn receipt_consumptions(
        &self,
        query: &UsedQuantityQuery,
    ) -> ProcurementResult<Vec<QuantityConsumption>> {
        let notes = read(&self.receipt_notes)?;
        let mut rows = Vec::new();
        for note in notes.values().filter(|note| {
            note.corporation_uuid == query.corporation_uuid
                && note.project_uuid == query.project_uuid
                && (matches_id(note.purchase_order_uuid.as_deref(), &query.estimate_uuid)
                    || matches_id(note.change_order_uuid.as_deref(), &query.estimate_uuid))
        }) {
            let note = without_removed(note.clone());
            for item in note.items {
                if let Some(source_item_uuid) = item.item_uuid {
                    rows.push(QuantityConsumption {
                        document_uuid: note.uuid.clone(),
                        source_document_uuid: query.estimate_uuid.clone(),
                        source_item_uuid,
                        quantity: item.received_quantity,
                    });
                }
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl VendorInvoiceRepository for MemoryStorage {
    async fn save_invoice(&self, invoice: &VendorInvoice) -> ProcurementResult<()> {
        write(&self.invoices)?.insert(invoice.uuid.clone(), invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, invoice_uuid: &str) -> ProcurementResult<Option<VendorInvoice>> {
        Ok(read(&self.invoices)?.get(invoice_uuid).cloned())
    }

    async fn update_invoice(&self, invoice: &VendorInvoice) -> ProcurementResult<()> {
        let mut invoices = write(&self.invoices)?;
        match invoices.get_mut(&invoice.uuid) {
            Some(existing) => {
                *existing = invoice.clone();
                Ok(())
            }
            None => Err(ProcurementError::NotFound(invoice.uuid.clone())),
        }
    }

    async fn list_invoices(
        &self,
        corporation_uuid: &str,
        project_uuid: &str,
    ) -> ProcurementResult<Vec<VendorInvoice>> {
        let invoices = read(&self.invoices)?;
        Ok(invoices
            .values()
            .filter(|invoice| {
                invoice.corporation_uuid == corporation_uuid
                    && invoice.project_uuid == project_uuid
            })
            .cloned()
            .collect())
    }

    async fn invoice_consumptions(
        &self,
        query: &UsedQuantityQuery,
    ) -> ProcurementResult<Vec<QuantityConsumption>> {
        let invoices = read(&self.invoices)?;
        let rows = invoices
            .values()
            .filter(|invoice| {
                invoice.is_active
                    && invoice.invoice_type == InvoiceType::AgainstAdvancePayment
                    && invoice.adjusted_against_vendor_invoice_uuid.is_none()
                    && invoice.corporation_uuid == query.corporation_uuid
                    && invoice.project_uuid == query.project_uuid
                    && matches_id(invoice.order_uuid(), &query.estimate_uuid)
            })
            .flat_map(|invoice| {
                invoice.items.iter().filter_map(|item| {
                    Some(QuantityConsumption {
                        document_uuid: invoice.uuid.clone(),
                        source_document_uuid: query.estimate_uuid.clone(),
                        source_item_uuid: item.item_uuid.clone()?,
                        quantity: item.quantity.clone(),
                    })
                })
            })
            .collect();
        Ok(rows)
    }
}

#[async_trait]
impl VendorRepository for MemoryStorage {
    async fn save_vendor(&self, vendor: &Vendor) -> ProcurementResult<()> {
        write(&self.vendors)?.insert(vendor.uuid.clone(), vendor.clone());
        Ok(())
    }

    async fn list_vendors(&self, corporation_uuid: &str) -> ProcurementResult<Vec<Vendor>> {
        let vendors = read(&self.vendors)?;
        Ok(vendors
            .values()
            .filter(|vendor| vendor.corporation_uuid == corporation_uuid)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CostCodeRepository for MemoryStorage {
    /// Explicit split when one was recorded, otherwise the invoice lines grouped by cost code
    async fn invoice_cost_codes(
        &self,
        invoice_uuid: &str,
    ) -> ProcurementResult<Vec<CostCodeAmount>> {
        if let Some(cost_codes) = read(&self.cost_codes)?.get(invoice_uuid) {
            return Ok(cost_codes.clone());
        }

        let invoices = read(&self.invoices)?;
        let invoice = invoices
            .get(invoice_uuid)
            .ok_or_else(|| ProcurementError::NotFound(invoice_uuid.to_string()))?;

        let mut grouped: BTreeMap<String, BigDecimal> = BTreeMap::new();
        for item in &invoice.items {
            if let Some(cost_code_uuid) = &item.cost_code_uuid {
                *grouped
                    .entry(cost_code_uuid.clone())
                    .or_insert_with(|| BigDecimal::from(0)) += item.subtotal();
            }
        }

        Ok(grouped
            .into_iter()
            .map(|(cost_code_uuid, amount)| CostCodeAmount {
                cost_code_uuid,
                cost_code_label: None,
                amount,
            })
            .collect())
    }
}

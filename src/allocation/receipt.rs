//! GRN totals for receipt lines and the receipt-field update operation

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{instrument, warn};

use crate::allocation::{allocate_balanced, round_currency};
use crate::filters::{filter_removed, id_key, without_removed};
use crate::quantity::coerce::lenient;
use crate::quantity::{QuantityLedger, ReceiptCheck, UsedQuantityQuery};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::require_field;

/// Body of `POST /api/purchase-order-items/update-receipt-fields`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReceiptFieldsRequest {
    pub corporation_uuid: String,
    pub project_uuid: String,
    pub receipt_note_uuid: String,
    /// Document-level charges to spread over the received lines
    #[serde(default, with = "lenient")]
    pub charges_total: Option<BigDecimal>,
    /// Document-level tax to spread over the received lines
    #[serde(default, with = "lenient")]
    pub tax_total: Option<BigDecimal>,
    pub items: Vec<ReceiptNoteItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateReceiptFieldsResponse {
    pub receipt_note_uuid: String,
    pub items: Vec<ReceiptNoteItem>,
    pub checks: Vec<ReceiptCheck>,
    /// True when any line received more than remains open; a warning, not a rejection
    pub has_over_received: bool,
}

/// Received total for a line: `received_quantity * unit_price` when both are known
fn received_total(item: &ReceiptNoteItem) -> BigDecimal {
    match (&item.received_quantity, &item.unit_price) {
        (Some(quantity), Some(price)) => round_currency(&(quantity * price)),
        _ => item
            .received_total
            .clone()
            .unwrap_or_else(|| BigDecimal::from(0)),
    }
}

/// Fill `received_total`, `grn_total` and `grn_total_with_charges_taxes`
///
/// Charges and tax are spread by each line's share of the summed received
/// totals.
pub fn compute_receipt_fields(
    items: &[ReceiptNoteItem],
    charges_total: &BigDecimal,
    tax_total: &BigDecimal,
) -> Vec<ReceiptNoteItem> {
    let received: Vec<BigDecimal> = items.iter().map(received_total).collect();
    let charge_shares = allocate_balanced(charges_total, &received);
    let tax_shares = allocate_balanced(tax_total, &received);

    items
        .iter()
        .zip(received)
        .zip(charge_shares.into_iter().zip(tax_shares))
        .map(|((item, received_total), (charges, tax))| {
            let grn_total = &received_total + &charges;
            let grn_total_with_charges_taxes = &grn_total + &tax;
            ReceiptNoteItem {
                received_total: Some(received_total),
                grn_total: Some(grn_total),
                grn_total_with_charges_taxes: Some(grn_total_with_charges_taxes),
                ..item.clone()
            }
        })
        .collect()
}

/// Recomputes and saves receipt fields, warning on over-receipt
pub struct ReceiptFieldUpdater<S> {
    storage: S,
    ledger: QuantityLedger<S>,
}

impl<S> ReceiptFieldUpdater<S>
where
    S: OrderRepository + ReceiptNoteRepository + VendorInvoiceRepository + Clone,
{
    pub fn new(storage: S) -> Self {
        Self {
            ledger: QuantityLedger::new(storage.clone()),
            storage,
        }
    }

    #[instrument(skip(self, request), fields(receipt_note_uuid = %request.receipt_note_uuid))]
    pub async fn update_receipt_fields(
        &self,
        request: UpdateReceiptFieldsRequest,
    ) -> ProcurementResult<UpdateReceiptFieldsResponse> {
        require_field("corporation_uuid", &request.corporation_uuid)?;
        require_field("project_uuid", &request.project_uuid)?;
        require_field("receipt_note_uuid", &request.receipt_note_uuid)?;

        let note = self
            .storage
            .get_receipt_note(&request.receipt_note_uuid)
            .await?
            .ok_or_else(|| ProcurementError::NotFound(request.receipt_note_uuid.clone()))?;

        let order_uuid = note
            .purchase_order_uuid
            .clone()
            .or_else(|| note.change_order_uuid.clone())
            .ok_or_else(|| {
                ProcurementError::Validation(format!(
                    "receipt note {} is not linked to a purchase order or change order",
                    note.uuid
                ))
            })?;

        let mut items = filter_removed(request.items, &note.removed_items);
        if let Some(order) = self.storage.get_order(&order_uuid).await? {
            fill_ordered_quantities(&mut items, &without_removed(order));
        }

        let zero = BigDecimal::from(0);
        let items = compute_receipt_fields(
            &items,
            request.charges_total.as_ref().unwrap_or(&zero),
            request.tax_total.as_ref().unwrap_or(&zero),
        );

        let query = UsedQuantityQuery::new(
            request.corporation_uuid,
            request.project_uuid,
            order_uuid,
        )
        .excluding(note.uuid.clone());
        let checks = self.ledger.check_receipt(&query, &items).await?;

        for check in checks.iter().filter(|check| check.is_over_received) {
            warn!(
                item_uuid = ?check.item_uuid,
                received = ?check.received_quantity,
                remaining = ?check.remaining_quantity,
                "receipt exceeds open quantity"
            );
        }

        self.storage.update_receipt_items(&note.uuid, &items).await?;

        let has_over_received = checks.iter().any(|check| check.is_over_received);
        Ok(UpdateReceiptFieldsResponse {
            receipt_note_uuid: note.uuid,
            items,
            checks,
            has_over_received,
        })
    }
}

/// Copy ordered quantities from the order onto receipt lines that lack one
fn fill_ordered_quantities(items: &mut [ReceiptNoteItem], order: &Order) {
    let ordered: HashMap<String, &BigDecimal> = order
        .items
        .iter()
        .filter_map(|line| {
            let uuid = line.item_uuid.as_ref()?;
            let quantity = line.quantity.as_ref()?;
            Some((id_key(uuid), quantity))
        })
        .collect();

    for item in items.iter_mut().filter(|item| item.ordered_quantity.is_none()) {
        if let Some(quantity) = item
            .item_uuid
            .as_ref()
            .and_then(|uuid| ordered.get(&id_key(uuid)))
        {
            item.ordered_quantity = Some((*quantity).clone());
        }
    }
}

//! Advance payments and their adjustment against later invoices

use tracing::{info, instrument};

use crate::filters::same_id;
use crate::traits::VendorInvoiceRepository;
use crate::types::*;
use crate::utils::validation::require_field;

fn is_open_advance(invoice: &VendorInvoice, order_uuid: &str) -> bool {
    invoice.is_active
        && invoice.invoice_type == InvoiceType::AgainstAdvancePayment
        && invoice.adjusted_against_vendor_invoice_uuid.is_none()
        && invoice
            .order_uuid()
            .is_some_and(|uuid| same_id(uuid, order_uuid))
}

/// Advance payments on an order not yet adjusted against another invoice
pub fn available_advance_payments<'a>(
    order_uuid: &str,
    invoices: &'a [VendorInvoice],
) -> Vec<&'a VendorInvoice> {
    invoices
        .iter()
        .filter(|invoice| is_open_advance(invoice, order_uuid))
        .collect()
}

/// Advance-payment pool for orders
pub struct AdvancePayments<S> {
    storage: S,
}

impl<S: VendorInvoiceRepository> AdvancePayments<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Open advance payments for an order
    pub async fn available(
        &self,
        corporation_uuid: &str,
        project_uuid: &str,
        order_uuid: &str,
    ) -> ProcurementResult<Vec<VendorInvoice>> {
        require_field("corporation_uuid", corporation_uuid)?;
        require_field("project_uuid", project_uuid)?;
        require_field("order_uuid", order_uuid)?;

        let invoices = self
            .storage
            .list_invoices(corporation_uuid, project_uuid)
            .await?;
        Ok(invoices
            .into_iter()
            .filter(|invoice| is_open_advance(invoice, order_uuid))
            .collect())
    }

    /// Adjust an advance payment against a later invoice, taking it out of the pool
    #[instrument(skip(self))]
    pub async fn adjust(
        &self,
        advance_uuid: &str,
        against_invoice_uuid: &str,
    ) -> ProcurementResult<VendorInvoice> {
        require_field("advance_uuid", advance_uuid)?;
        require_field("adjusted_against_vendor_invoice_uuid", against_invoice_uuid)?;
        if same_id(advance_uuid, against_invoice_uuid) {
            return Err(ProcurementError::Validation(
                "an advance payment cannot be adjusted against itself".to_string(),
            ));
        }

        let mut advance = self
            .storage
            .get_invoice(advance_uuid)
            .await?
            .ok_or_else(|| ProcurementError::NotFound(advance_uuid.to_string()))?;

        if advance.invoice_type != InvoiceType::AgainstAdvancePayment {
            return Err(ProcurementError::Validation(format!(
                "invoice {} is not an advance payment",
                advance_uuid
            )));
        }
        if let Some(existing) = &advance.adjusted_against_vendor_invoice_uuid {
            return Err(ProcurementError::Validation(format!(
                "advance payment {} is already adjusted against {}",
                advance_uuid, existing
            )));
        }

        if self.storage.get_invoice(against_invoice_uuid).await?.is_none() {
            return Err(ProcurementError::NotFound(against_invoice_uuid.to_string()));
        }

        advance.adjusted_against_vendor_invoice_uuid = Some(against_invoice_uuid.to_string());
        self.storage.update_invoice(&advance).await?;

        info!(advance_uuid, against_invoice_uuid, "advance payment adjusted");
        Ok(advance)
    }
}

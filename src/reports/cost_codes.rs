//! Concurrent cost-code lookups for invoice lists

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::traits::CostCodeRepository;
use crate::types::*;

/// Cost-code split of one invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCostBreakdown {
    pub invoice_uuid: String,
    pub vendor_uuid: String,
    /// `None` when the lookup failed
    pub cost_codes: Option<Vec<CostCodeAmount>>,
}

/// Look up cost codes for every invoice at once and wait for all of them
///
/// Results keep the order of `invoices`. A failed lookup is logged and
/// reported as `None` for that invoice only.
pub async fn fetch_invoice_cost_codes<C>(
    repository: &C,
    invoices: &[VendorInvoice],
) -> Vec<InvoiceCostBreakdown>
where
    C: CostCodeRepository + ?Sized,
{
    let lookups = invoices.iter().map(|invoice| async move {
        let result = repository.invoice_cost_codes(&invoice.uuid).await;
        (invoice, result)
    });

    join_all(lookups)
        .await
        .into_iter()
        .map(|(invoice, result)| {
            let cost_codes = match result {
                Ok(cost_codes) => Some(cost_codes),
                Err(err) => {
                    warn!(invoice_uuid = %invoice.uuid, error = %err, "cost code lookup failed");
                    None
                }
            };
            InvoiceCostBreakdown {
                invoice_uuid: invoice.uuid.clone(),
                vendor_uuid: invoice.vendor_uuid.clone(),
                cost_codes,
            }
        })
        .collect()
}

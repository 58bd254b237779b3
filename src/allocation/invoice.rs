//! Spreading invoice-level tax, charges and holdback over invoice lines

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::allocation::{allocate, holdback_amount};
use crate::breakdown::FinancialBreakdown;
use crate::types::*;

/// One invoice line with its share of the invoice-level adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineAllocation {
    pub item_uuid: Option<String>,
    pub cost_code_uuid: Option<String>,
    pub subtotal: BigDecimal,
    pub tax: BigDecimal,
    pub charges: BigDecimal,
    pub holdback: BigDecimal,
    /// `subtotal + tax + charges - holdback`
    pub net_payable: BigDecimal,
}

/// Invoice total: the `amount` column, else the breakdown's invoice total
pub fn invoice_total(invoice: &VendorInvoice, breakdown: &FinancialBreakdown) -> BigDecimal {
    invoice
        .amount
        .clone()
        .or_else(|| breakdown.invoice_total())
        .unwrap_or_else(|| BigDecimal::from(0))
}

/// Holdback withheld on an invoice at its holdback percentage
pub fn invoice_holdback(invoice: &VendorInvoice, breakdown: &FinancialBreakdown) -> BigDecimal {
    match &invoice.holdback {
        Some(percentage) => holdback_amount(&invoice_total(invoice, breakdown), percentage),
        None => BigDecimal::from(0),
    }
}

/// Allocate the invoice's tax, charges and holdback to its lines by subtotal share
pub fn allocate_invoice(
    invoice: &VendorInvoice,
    breakdown: &FinancialBreakdown,
) -> Vec<InvoiceLineAllocation> {
    let subtotals: Vec<BigDecimal> = invoice.items.iter().map(|item| item.subtotal()).collect();

    let taxes = allocate(&breakdown.tax_total(), &subtotals);
    let charges = allocate(&breakdown.charges_total(), &subtotals);
    let holdbacks = allocate(&invoice_holdback(invoice, breakdown), &subtotals);

    invoice
        .items
        .iter()
        .zip(subtotals)
        .zip(taxes.into_iter().zip(charges).zip(holdbacks))
        .map(|((item, subtotal), ((tax, charges), holdback))| {
            let net_payable = &subtotal + &tax + &charges - &holdback;
            InvoiceLineAllocation {
                item_uuid: item.item_uuid.clone(),
                cost_code_uuid: item.cost_code_uuid.clone(),
                subtotal,
                tax,
                charges,
                holdback,
                net_payable,
            }
        })
        .collect()
}

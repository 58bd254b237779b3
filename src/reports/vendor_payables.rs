//! Vendor accounts-payable summary
//!
//! Backs `GET /api/reports/vendor-accounts-payable-summary`: one row per
//! vendor with purchase-order and change-order commitments, invoiced value,
//! holdback, tax and paid-to-date for a project and bill-date range.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::allocation::{invoice_holdback, invoice_total, round_currency};
use crate::breakdown::FinancialBreakdown;
use crate::config::ReportSettings;
use crate::reports::cost_codes::{fetch_invoice_cost_codes, InvoiceCostBreakdown};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{parse_date, require_field, require_param, validate_date_range};

/// Parameters of a payables summary request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorPayablesQuery {
    pub corporation_uuid: String,
    pub project_uuid: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl VendorPayablesQuery {
    pub fn new(
        corporation_uuid: String,
        project_uuid: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ProcurementResult<Self> {
        require_field("corporation_uuid", &corporation_uuid)?;
        require_field("project_uuid", &project_uuid)?;
        validate_date_range(start_date, end_date)?;
        Ok(Self {
            corporation_uuid,
            project_uuid,
            start_date,
            end_date,
        })
    }

    /// Build a query from the request's query-string parameters
    pub fn from_params(params: &HashMap<String, String>) -> ProcurementResult<Self> {
        let corporation_uuid = require_param(params, "corporation_uuid")?;
        let project_uuid = require_param(params, "project_uuid")?;
        let start_date = parse_date("start_date", &require_param(params, "start_date")?)?;
        let end_date = parse_date("end_date", &require_param(params, "end_date")?)?;
        Self::new(corporation_uuid, project_uuid, start_date, end_date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    fn in_scope(&self, corporation_uuid: &str, project_uuid: &str) -> bool {
        self.corporation_uuid == corporation_uuid && self.project_uuid == project_uuid
    }
}

/// Payables figures for one vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayableRow {
    pub vendor_uuid: String,
    pub vendor_name: String,
    pub po_amount: BigDecimal,
    pub change_order_amount: BigDecimal,
    pub total_invoice_value: BigDecimal,
    pub holdback: BigDecimal,
    pub tax: BigDecimal,
    pub paid_to_date: BigDecimal,
}

impl VendorPayableRow {
    fn empty(vendor: &Vendor) -> Self {
        Self {
            vendor_uuid: vendor.uuid.clone(),
            vendor_name: vendor.vendor_name.clone(),
            po_amount: BigDecimal::from(0),
            change_order_amount: BigDecimal::from(0),
            total_invoice_value: BigDecimal::from(0),
            holdback: BigDecimal::from(0),
            tax: BigDecimal::from(0),
            paid_to_date: BigDecimal::from(0),
        }
    }

    /// No commitments, invoices or payments
    pub fn has_no_activity(&self) -> bool {
        let zero = BigDecimal::from(0);
        self.po_amount == zero
            && self.change_order_amount == zero
            && self.total_invoice_value == zero
            && self.paid_to_date == zero
    }
}

/// Field-wise sum over all reported vendors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayableTotals {
    pub po_amount: BigDecimal,
    pub change_order_amount: BigDecimal,
    pub total_invoice_value: BigDecimal,
    pub holdback: BigDecimal,
    pub tax: BigDecimal,
    pub paid_to_date: BigDecimal,
}

impl VendorPayableTotals {
    fn from_rows(rows: &[VendorPayableRow]) -> Self {
        Self {
            po_amount: rows.iter().map(|row| &row.po_amount).sum(),
            change_order_amount: rows.iter().map(|row| &row.change_order_amount).sum(),
            total_invoice_value: rows.iter().map(|row| &row.total_invoice_value).sum(),
            holdback: rows.iter().map(|row| &row.holdback).sum(),
            tax: rows.iter().map(|row| &row.tax).sum(),
            paid_to_date: rows.iter().map(|row| &row.paid_to_date).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayablesSummary {
    pub corporation_uuid: String,
    pub project_uuid: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub vendors: Vec<VendorPayableRow>,
    pub totals: VendorPayableTotals,
}

/// Build the payables summary from already fetched records
///
/// Orders count when active and in a payable status; invoices count when
/// active and billed inside the query range. Vendors without activity are
/// dropped and the rest sorted by name.
pub fn aggregate_vendor_payables(
    settings: &ReportSettings,
    query: &VendorPayablesQuery,
    vendors: &[Vendor],
    orders: &[Order],
    invoices: &[VendorInvoice],
) -> VendorPayablesSummary {
    let mut rows: HashMap<&str, VendorPayableRow> = vendors
        .iter()
        .map(|vendor| (vendor.uuid.as_str(), VendorPayableRow::empty(vendor)))
        .collect();

    for order in orders
        .iter()
        .filter(|order| query.in_scope(&order.corporation_uuid, &order.project_uuid))
        .filter(|order| settings.counts_toward_payables(order))
    {
        let Some(row) = order
            .vendor_uuid
            .as_deref()
            .and_then(|vendor_uuid| rows.get_mut(vendor_uuid))
        else {
            debug!(order_uuid = %order.uuid, "order has no known vendor, skipping");
            continue;
        };
        let breakdown =
            FinancialBreakdown::parse_or_empty(order.financial_breakdown.as_ref(), &order.uuid);
        let amount = breakdown.order_total(order.kind);
        match order.kind {
            OrderKind::PurchaseOrder => row.po_amount += amount,
            OrderKind::ChangeOrder => row.change_order_amount += amount,
        }
    }

    for invoice in invoices
        .iter()
        .filter(|invoice| query.in_scope(&invoice.corporation_uuid, &invoice.project_uuid))
        .filter(|invoice| invoice.is_active && query.contains(invoice.bill_date))
    {
        let Some(row) = rows.get_mut(invoice.vendor_uuid.as_str()) else {
            debug!(invoice_uuid = %invoice.uuid, "invoice has no known vendor, skipping");
            continue;
        };
        let breakdown =
            FinancialBreakdown::parse_or_empty(invoice.financial_breakdown.as_ref(), &invoice.uuid);
        let total = invoice_total(invoice, &breakdown);

        row.holdback += invoice_holdback(invoice, &breakdown);
        row.tax += round_currency(&breakdown.tax_total());
        if settings.is_paid(&invoice.status) {
            row.paid_to_date += &total;
        }
        row.total_invoice_value += total;
    }

    let mut vendors: Vec<VendorPayableRow> = rows
        .into_values()
        .filter(|row| !row.has_no_activity())
        .collect();
    vendors.sort_by(|a, b| a.vendor_name.cmp(&b.vendor_name));

    let totals = VendorPayableTotals::from_rows(&vendors);
    VendorPayablesSummary {
        corporation_uuid: query.corporation_uuid.clone(),
        project_uuid: query.project_uuid.clone(),
        start_date: query.start_date,
        end_date: query.end_date,
        vendors,
        totals,
    }
}

/// Fetches report inputs through the repositories and aggregates them
pub struct VendorPayablesService<S> {
    storage: S,
    settings: ReportSettings,
    vendor_cache: Option<Arc<dyn ListCache<Vec<Vendor>>>>,
}

impl<S: ProcurementStorage> VendorPayablesService<S> {
    pub fn new(storage: S) -> Self {
        Self::with_settings(storage, ReportSettings::default())
    }

    pub fn with_settings(storage: S, settings: ReportSettings) -> Self {
        Self {
            storage,
            settings,
            vendor_cache: None,
        }
    }

    /// Serve vendor lists from a per-corporation cache
    pub fn with_vendor_cache(mut self, cache: Arc<dyn ListCache<Vec<Vendor>>>) -> Self {
        self.vendor_cache = Some(cache);
        self
    }

    async fn vendors(&self, corporation_uuid: &str) -> ProcurementResult<Vec<Vendor>> {
        if let Some(cache) = &self.vendor_cache {
            if let Some(vendors) = cache.get(corporation_uuid) {
                return Ok(vendors);
            }
        }
        let vendors = self.storage.list_vendors(corporation_uuid).await?;
        if let Some(cache) = &self.vendor_cache {
            cache.set(corporation_uuid, vendors.clone());
        }
        Ok(vendors)
    }

    #[instrument(skip(self), fields(project_uuid = %query.project_uuid))]
    pub async fn summary(
        &self,
        query: &VendorPayablesQuery,
    ) -> ProcurementResult<VendorPayablesSummary> {
        let (vendors, purchase_orders, change_orders, invoices) = futures::try_join!(
            self.vendors(&query.corporation_uuid),
            self.storage.list_orders(
                &query.corporation_uuid,
                &query.project_uuid,
                OrderKind::PurchaseOrder
            ),
            self.storage.list_orders(
                &query.corporation_uuid,
                &query.project_uuid,
                OrderKind::ChangeOrder
            ),
            self.storage
                .list_invoices(&query.corporation_uuid, &query.project_uuid),
        )?;

        let orders: Vec<Order> = purchase_orders.into_iter().chain(change_orders).collect();
        Ok(aggregate_vendor_payables(&self.settings, query, &vendors, &orders, &invoices))
    }

    /// Summary for a raw query-string map, validating it first
    pub async fn summary_from_params(
        &self,
        params: &HashMap<String, String>,
    ) -> ProcurementResult<VendorPayablesSummary> {
        let query = VendorPayablesQuery::from_params(params)?;
        self.summary(&query).await
    }

    /// Cost-code split of every active invoice in range
    ///
    /// Lookups run concurrently; a failed lookup leaves that invoice's
    /// `cost_codes` empty instead of failing the report.
    #[instrument(skip(self), fields(project_uuid = %query.project_uuid))]
    pub async fn invoice_cost_breakdown(
        &self,
        query: &VendorPayablesQuery,
    ) -> ProcurementResult<Vec<InvoiceCostBreakdown>> {
        let invoices: Vec<VendorInvoice> = self
            .storage
            .list_invoices(&query.corporation_uuid, &query.project_uuid)
            .await?
            .into_iter()
            .filter(|invoice| invoice.is_active && query.contains(invoice.bill_date))
            .collect();

        Ok(fetch_invoice_cost_codes(&self.storage, &invoices).await)
    }
}

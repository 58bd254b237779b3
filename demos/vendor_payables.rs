//! Vendor payables walkthrough: orders, receipts, invoices and the summary report

use procurement_core::utils::MemoryStorage;
use procurement_core::{
    allocate_invoice, AdvancePayments, FinancialBreakdown, InvoiceLineItem, Order, OrderKind,
    OrderLineItem, OrderRepository, OrderStatus, OrderWriter, ReceiptFieldUpdater, ReceiptNote,
    ReceiptNoteItem, ReceiptNoteRepository, UpdateReceiptFieldsRequest, Vendor, VendorInvoice,
    VendorInvoiceRepository, VendorPayablesQuery, VendorPayablesService, VendorRepository,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde_json::json;

const CORP: &str = "corp-demo";
const PROJECT: &str = "tower-a";

fn invoice(vendor: &Vendor, bill_date: NaiveDate) -> VendorInvoice {
    VendorInvoice::new(
        CORP.to_string(),
        PROJECT.to_string(),
        vendor.uuid.clone(),
        bill_date,
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏗️  Procurement Core - Vendor Payables Example\n");

    let storage = MemoryStorage::new();

    // 1. Vendors
    println!("🏢 Registering vendors...");
    let concrete = Vendor::new(CORP.to_string(), "Acme Concrete".to_string());
    let steel = Vendor::new(CORP.to_string(), "Northside Steel".to_string());
    for vendor in [&concrete, &steel] {
        storage.save_vendor(vendor).await?;
        println!("  ✓ {}", vendor.vendor_name);
    }
    println!();

    // 2. Purchase order with two lines
    println!("📦 Creating purchase order...");
    let order = Order::new(OrderKind::PurchaseOrder, CORP.to_string(), PROJECT.to_string())
        .with_vendor(concrete.uuid.clone())
        .with_status(OrderStatus::Approved)
        .with_breakdown(json!({ "totals": { "total_po_amount": 15000 } }))
        .with_items(vec![
            OrderLineItem::new(BigDecimal::from(100), BigDecimal::from(120)),
            OrderLineItem::new(BigDecimal::from(30), BigDecimal::from(100)),
        ]);
    let order = OrderWriter::new(storage.clone()).create_with_items(order).await?;
    println!("  ✓ PO {} with {} lines\n", order.uuid, order.items.len());

    let change_order = Order::new(OrderKind::ChangeOrder, CORP.to_string(), PROJECT.to_string())
        .with_vendor(concrete.uuid.clone())
        .with_status(OrderStatus::Approved)
        .with_breakdown(json!({ "totals": { "total_co_amount": "2400.00" } }));
    storage.insert_order(&change_order).await?;

    // 3. Goods receipt with charges and tax spread over the lines
    println!("🚚 Receiving goods...");
    let note = ReceiptNote {
        uuid: uuid::Uuid::new_v4().to_string(),
        corporation_uuid: CORP.to_string(),
        project_uuid: PROJECT.to_string(),
        purchase_order_uuid: Some(order.uuid.clone()),
        change_order_uuid: None,
        items: Vec::new(),
        removed_items: Vec::new(),
    };
    storage.save_receipt_note(&note).await?;

    let received: Vec<ReceiptNoteItem> = order
        .items
        .iter()
        .zip(["80", "35"])
        .map(|(line, quantity)| ReceiptNoteItem {
            item_uuid: line.item_uuid.clone(),
            unit_price: line.unit_price.clone(),
            received_quantity: quantity.parse().ok(),
            ..Default::default()
        })
        .collect();

    let response = ReceiptFieldUpdater::new(storage.clone())
        .update_receipt_fields(UpdateReceiptFieldsRequest {
            corporation_uuid: CORP.to_string(),
            project_uuid: PROJECT.to_string(),
            receipt_note_uuid: note.uuid.clone(),
            charges_total: Some(BigDecimal::from(250)),
            tax_total: Some(BigDecimal::from(1240)),
            items: received,
        })
        .await?;

    for (item, check) in response.items.iter().zip(&response.checks) {
        println!(
            "  ✓ received {:?} of {:?}: line total {:?}{}",
            check.received_quantity,
            check.ordered_quantity,
            item.grn_total_with_charges_taxes,
            if check.is_over_received { "  ⚠️ over-received" } else { "" }
        );
    }
    println!();

    // 4. Invoices, including an advance payment
    println!("🧾 Recording invoices...");
    let bill_date = NaiveDate::from_ymd_opt(2024, 3, 12).ok_or("invalid date")?;
    let advance = invoice(&concrete, bill_date)
        .against_order(OrderKind::PurchaseOrder, order.uuid.clone())
        .as_advance_payment()
        .with_amount(BigDecimal::from(3000))
        .with_status("Paid");
    let mut progress = invoice(&concrete, bill_date)
        .against_order(OrderKind::PurchaseOrder, order.uuid.clone())
        .with_amount(BigDecimal::from(9000))
        .with_holdback(BigDecimal::from(10))
        .with_breakdown(json!({ "totals": { "tax_total": 810, "charges_total": 150 } }));
    progress.items = vec![
        InvoiceLineItem {
            cost_code_uuid: Some("03-300 Cast-in-place".to_string()),
            total: Some(BigDecimal::from(6000)),
            ..Default::default()
        },
        InvoiceLineItem {
            cost_code_uuid: Some("05-100 Structural steel".to_string()),
            total: Some(BigDecimal::from(3000)),
            ..Default::default()
        },
    ];
    let steel_invoice = invoice(&steel, bill_date)
        .with_breakdown(json!(
            r#"{"totals":{"total_invoice_amount":"4200.50","totalTax":"378.05"}}"#
        ))
        .with_status("Paid");
    for invoice in [&advance, &progress, &steel_invoice] {
        storage.save_invoice(invoice).await?;
    }

    let breakdown =
        FinancialBreakdown::parse_or_empty(progress.financial_breakdown.as_ref(), &progress.uuid);
    for line in allocate_invoice(&progress, &breakdown) {
        println!(
            "  ✓ {:?}: subtotal {} tax {} charges {} holdback {} net {}",
            line.cost_code_uuid,
            line.subtotal,
            line.tax,
            line.charges,
            line.holdback,
            line.net_payable
        );
    }

    let pool = AdvancePayments::new(storage.clone());
    println!(
        "  ✓ open advance payments on PO: {}",
        pool.available(CORP, PROJECT, &order.uuid).await?.len()
    );
    pool.adjust(&advance.uuid, &progress.uuid).await?;
    println!(
        "  ✓ after adjustment: {}\n",
        pool.available(CORP, PROJECT, &order.uuid).await?.len()
    );

    // 5. Payables summary
    println!("📊 Vendor payables for March 2024:");
    let query = VendorPayablesQuery::new(
        CORP.to_string(),
        PROJECT.to_string(),
        NaiveDate::from_ymd_opt(2024, 3, 1).ok_or("invalid date")?,
        NaiveDate::from_ymd_opt(2024, 3, 31).ok_or("invalid date")?,
    )?;
    let service = VendorPayablesService::new(storage.clone());
    let summary = service.summary(&query).await?;

    for row in &summary.vendors {
        println!(
            "  {:<18} PO ₹{} CO ₹{} invoiced ₹{} holdback ₹{} tax ₹{} paid ₹{}",
            row.vendor_name,
            row.po_amount,
            row.change_order_amount,
            row.total_invoice_value,
            row.holdback,
            row.tax,
            row.paid_to_date
        );
    }
    println!(
        "  {:<18} invoiced ₹{} paid ₹{}",
        "TOTAL", summary.totals.total_invoice_value, summary.totals.paid_to_date
    );
    println!();

    println!("🧮 Cost-code split per invoice:");
    for invoice in service.invoice_cost_breakdown(&query).await? {
        match invoice.cost_codes {
            Some(cost_codes) => {
                for cost_code in cost_codes {
                    println!(
                        "  {} → {}: ₹{}",
                        invoice.invoice_uuid, cost_code.cost_code_uuid, cost_code.amount
                    );
                }
            }
            None => println!("  {} → unavailable", invoice.invoice_uuid),
        }
    }

    println!("\n✅ Example completed successfully!");
    Ok(())
}

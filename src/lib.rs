//! # Procurement Core
//!
//! Reconciliation and allocation rules for construction procurement:
//! purchase orders, change orders, goods receipt notes and vendor invoices.
//!
//! ## Features
//!
//! - **Quantity ledger**: used-quantity lookups and over-receipt detection per order line
//! - **Proportional allocation**: charges, tax and holdback spread over lines by subtotal share
//! - **Soft-delete filtering**: manifest-based removal of line items from materialized documents
//! - **Payables reporting**: per-vendor commitments, invoiced value, holdback, tax and payments
//! - **Storage abstraction**: typed repository traits per entity, with an in-memory backend
//!
//! ## Quick Start
//!
//! ```rust
//! use procurement_core::{allocate, holdback_amount};
//! use bigdecimal::BigDecimal;
//!
//! let shares = allocate(&BigDecimal::from(30), &[BigDecimal::from(100), BigDecimal::from(200)]);
//! assert_eq!(shares, vec![BigDecimal::from(10), BigDecimal::from(20)]);
//!
//! let holdback = holdback_amount(&BigDecimal::from(1000), &BigDecimal::from(10));
//! assert_eq!(holdback, BigDecimal::from(100));
//! ```

pub mod allocation;
pub mod breakdown;
pub mod config;
pub mod filters;
pub mod orders;
pub mod quantity;
pub mod reports;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use allocation::*;
pub use breakdown::{BreakdownError, FinancialBreakdown};
pub use config::ReportSettings;
pub use filters::*;
pub use orders::*;
pub use quantity::*;
pub use reports::*;
pub use traits::*;
pub use types::*;

//! Accounts-payable reporting

pub mod cost_codes;
pub mod vendor_payables;

pub use cost_codes::*;
pub use vendor_payables::*;

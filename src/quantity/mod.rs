//! Quantity tracking against ordered lines

pub mod coerce;
pub mod ledger;

pub use coerce::{coerce_decimal, parse_decimal};
pub use ledger::*;

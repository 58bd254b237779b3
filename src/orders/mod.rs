//! Order writes and the advance-payment pool

pub mod advance;
pub mod writer;

pub use advance::*;
pub use writer::*;

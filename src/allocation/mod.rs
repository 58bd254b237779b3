//! Proportional allocation of charges, tax and holdback

pub mod allocator;
pub mod invoice;
pub mod receipt;

pub use allocator::*;
pub use invoice::*;
pub use receipt::*;

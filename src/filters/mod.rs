//! Filters applied to materialized documents before they reach callers

pub mod soft_delete;

pub use soft_delete::*;

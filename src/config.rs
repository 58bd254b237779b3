//! Report settings

use serde::{Deserialize, Serialize};

use crate::types::*;

const DEFAULT_PAID_STATUS: &str = "paid";
const DEFAULT_CACHE_STALENESS_SECS: u64 = 300;

fn default_payable_order_statuses() -> Vec<OrderStatus> {
    vec![
        OrderStatus::Approved,
        OrderStatus::Completed,
        OrderStatus::PartiallyReceived,
    ]
}

fn default_paid_status() -> String {
    DEFAULT_PAID_STATUS.to_string()
}

fn default_cache_staleness_secs() -> u64 {
    DEFAULT_CACHE_STALENESS_SECS
}

/// Knobs for payables reporting and list caching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportSettings {
    /// Order statuses whose amounts count toward PO/CO totals
    #[serde(default = "default_payable_order_statuses")]
    pub payable_order_statuses: Vec<OrderStatus>,

    /// Invoice status counted as paid, compared case-insensitively
    #[serde(default = "default_paid_status")]
    pub paid_status: String,

    /// Age after which cached list data is refetched
    #[serde(default = "default_cache_staleness_secs")]
    pub cache_staleness_secs: u64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            payable_order_statuses: default_payable_order_statuses(),
            paid_status: default_paid_status(),
            cache_staleness_secs: default_cache_staleness_secs(),
        }
    }
}

impl ReportSettings {
    /// Load settings from JSON; omitted keys take their defaults
    pub fn from_json(text: &str) -> ProcurementResult<Self> {
        serde_json::from_str(text).map_err(|err| {
            ProcurementError::Validation(format!("invalid report settings: {}", err))
        })
    }

    pub fn cache_staleness(&self) -> chrono::Duration {
        let secs = i64::try_from(self.cache_staleness_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1_000);
        chrono::Duration::seconds(secs)
    }

    /// Whether an order's amount belongs in the payables totals
    pub fn counts_toward_payables(&self, order: &Order) -> bool {
        order.is_active && self.payable_order_statuses.contains(&order.status)
    }

    pub fn is_paid(&self, status: &str) -> bool {
        status.trim().eq_ignore_ascii_case(&self.paid_status)
    }
}

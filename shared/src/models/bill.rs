//! Bill Model (closed table)

use serde::{Deserialize, Serialize};

use super::running_table::TableLine;

/// Paid flag, stored as "yes" / "no"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaidFlag {
    Yes,
    No,
}

/// Bill (`bills`), never deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub table: String,
    pub items: Vec<TableLine>,
    pub ac_charge: f64,
    pub gst_amount: f64,
    pub total: f64,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    pub paid: PaidFlag,
    pub closed_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<i64>,
}

impl Bill {
    pub fn is_paid(&self) -> bool {
        self.paid == PaidFlag::Yes
    }
}

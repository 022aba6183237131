//! Running Table Model (open dine-in tab)

use serde::{Deserialize, Serialize};

/// Running table line, merged by `name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableLine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_local: Option<String>,
    pub price: f64,
    pub quantity: i32,
}

/// Open tab for a table (`runningTables/{table}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningTable {
    /// Table identifier, e.g. "5" or "5-2" for a split table
    pub table: String,
    pub items: Vec<TableLine>,
    pub ac_charge: f64,
    pub gst_amount: f64,
    pub total: f64,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

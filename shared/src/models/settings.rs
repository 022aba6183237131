//! Tenant settings documents (`settings/*`)

use serde::{Deserialize, Serialize};

/// `settings/userSettings`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    /// Per-order-type coupon counters
    pub separate_tracking: bool,
    /// Print local-language item names
    pub local_print: bool,
    /// Table flow: use acPrice / nonAcPrice per item
    pub ac_per_item: bool,
    pub dark_mode: bool,
}

/// `settings/topItems`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopItems {
    pub items: Vec<String>,
}

/// `settings/lastCouponClear`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupMarker {
    /// `YYYY-MM-DD`
    pub date: String,
}

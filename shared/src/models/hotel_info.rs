//! Hotel Info Model (`settings/hotelInfo`)

use serde::{Deserialize, Serialize};

/// Restaurant header info and table-flow charges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelInfo {
    pub hotel_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_number: Option<String>,
    /// GST percentage applied to the table subtotal
    #[serde(default)]
    pub gst_percentage: f64,
    #[serde(default)]
    pub ac_charge: f64,
    #[serde(default)]
    pub non_ac_charge: f64,
    /// Inclusive range "a-b"
    #[serde(default)]
    pub ac_tables: String,
    #[serde(default)]
    pub non_ac_tables: String,
    #[serde(default)]
    pub greeting: String,
}

impl Default for HotelInfo {
    fn default() -> Self {
        Self {
            hotel_name: String::new(),
            address: None,
            gst_number: None,
            gst_percentage: 0.0,
            ac_charge: 0.0,
            non_ac_charge: 0.0,
            ac_tables: String::new(),
            non_ac_tables: String::new(),
            greeting: String::new(),
        }
    }
}

impl HotelInfo {
    /// Whether `table_number` falls inside the AC range
    ///
    /// 范围解析失败时按非空调处理
    pub fn is_ac_table(&self, table_number: u32) -> bool {
        parse_range(&self.ac_tables)
            .map(|(start, end)| table_number >= start && table_number <= end)
            .unwrap_or(false)
    }

    /// Service charge for the table
    pub fn table_charge(&self, table_number: u32) -> f64 {
        if self.is_ac_table(table_number) {
            self.ac_charge
        } else {
            self.non_ac_charge
        }
    }
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    let (a, b) = s.split_once('-')?;
    let start = a.trim().parse().ok()?;
    let end = b.trim().parse().ok()?;
    Some((start, end))
}

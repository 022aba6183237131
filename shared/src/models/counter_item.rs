//! Counter Item Model

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Counter catalog item (柜台商品)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterItem {
    pub name: String,
    /// Name in the local language, printed on the coupon when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_local: Option<String>,
    pub price: f64,
    /// Short lookup code, unique among available items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default = "default_true")]
    pub availability: bool,
}

/// Create counter item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterItemCreate {
    pub name: String,
    pub name_local: Option<String>,
    pub price: f64,
    pub code: Option<String>,
}

/// Update counter item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterItemUpdate {
    pub name: Option<String>,
    pub name_local: Option<String>,
    pub price: Option<f64>,
    pub code: Option<String>,
    pub availability: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_defaults_to_true() {
        let item: CounterItem =
            serde_json::from_str(r#"{"name":"Samosa","price":15}"#).unwrap();
        assert!(item.availability);
        assert!(item.code.is_none());
    }
}

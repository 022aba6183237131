//! Menu Item Model (table flow)

use serde::{Deserialize, Serialize};

/// Menu section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    Breakfast,
    Meal,
    Drink,
    #[serde(other)]
    Other,
}

fn default_true() -> bool {
    true
}

/// Menu item (菜单)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_local: Option<String>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_ac_price: Option<f64>,
    #[serde(rename = "type")]
    pub menu_type: MenuType,
    #[serde(default = "default_true")]
    pub availability: bool,
}

impl MenuItem {
    /// Unit price for a table order
    ///
    /// `ac_per_item` 开启时取 `acPrice`，否则取 `nonAcPrice`；缺省回落到 `price`
    pub fn unit_price(&self, ac_per_item: bool) -> f64 {
        let specific = if ac_per_item {
            self.ac_price
        } else {
            self.non_ac_price
        };
        match specific {
            Some(p) if p > 0.0 => p,
            _ => self.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> MenuItem {
        MenuItem {
            name: "Thali".into(),
            name_local: None,
            price: 120.0,
            ac_price: Some(140.0),
            non_ac_price: None,
            menu_type: MenuType::Meal,
            availability: true,
        }
    }

    #[test]
    fn test_unit_price_selection() {
        let m = item();
        assert_eq!(m.unit_price(true), 140.0);
        assert_eq!(m.unit_price(false), 120.0);
    }

    #[test]
    fn test_unknown_type_is_other() {
        let m: MenuItem =
            serde_json::from_str(r#"{"name":"Pan","price":20,"type":"dessert"}"#).unwrap();
        assert_eq!(m.menu_type, MenuType::Other);
        assert!(m.availability);
    }
}

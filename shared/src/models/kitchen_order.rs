//! Kitchen Order Ticket Model (KOT)

use serde::{Deserialize, Serialize};

/// Ticket status; absent in storage means Active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Prepared,
    Served,
}

/// Kitchen ticket line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenLine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_local: Option<String>,
    pub quantity: i32,
    pub timestamp: i64,
}

/// Kitchen ticket (`orders`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenOrder {
    pub table: String,
    pub items: Vec<KitchenLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl KitchenOrder {
    /// 厨房看板上显示：既未 prepared 也未 served
    pub fn is_active(&self) -> bool {
        self.status.is_none()
    }

    pub fn is_ready(&self) -> bool {
        self.status == Some(TicketStatus::Prepared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_status_is_active() {
        let t: KitchenOrder =
            serde_json::from_str(r#"{"table":"5","items":[],"createdAt":1}"#).unwrap();
        assert!(t.is_active());
        assert!(!t.is_ready());

        let json = serde_json::to_value(&t).unwrap();
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_status_lowercase() {
        let t: KitchenOrder = serde_json::from_str(
            r#"{"table":"5","items":[],"createdAt":1,"status":"prepared"}"#,
        )
        .unwrap();
        assert!(t.is_ready());
    }
}

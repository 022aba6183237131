//! Counter Order Model (coupon-numbered takeaway orders)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counter order type
///
/// 历史数据里外卖类型同时存在 "Swiggy-Zomato" 和 "Swiggy/Zomato" 两种写法，
/// 反序列化都接受，写入统一为 "Swiggy/Zomato"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Table,
    Parcel,
    #[serde(rename = "Swiggy/Zomato", alias = "Swiggy-Zomato")]
    SwiggyZomato,
}

impl OrderType {
    pub const ALL: [OrderType; 3] = [Self::Table, Self::Parcel, Self::SwiggyZomato];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Parcel => "Parcel",
            Self::SwiggyZomato => "Swiggy/Zomato",
        }
    }

    /// Letter prefixed to the coupon id when tracking per order type
    pub fn prefix(&self) -> char {
        match self {
            Self::Table => 'T',
            Self::Parcel => 'P',
            Self::SwiggyZomato => 'S',
        }
    }

    /// Stable key fragment for per-type counter documents
    pub fn key(&self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::Parcel => "Parcel",
            Self::SwiggyZomato => "Swiggy-Zomato",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Online,
}

/// Counter order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_local: Option<String>,
    pub price: f64,
    pub quantity: i32,
    /// price × quantity
    pub total: f64,
}

/// Running counter order (`counterOrder`)
///
/// 账单流水 (`counterbill`) 在创建时写入同样的 payload，之后只追加不修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterOrder {
    /// Display id, e.g. "07" or "P07"
    pub coupon_id: String,
    pub items: Vec<LineItem>,
    pub sub_total: f64,
    pub order_type: OrderType,
    pub payment: PaymentMethod,
    /// Unix millis
    pub timestamp: i64,
}

/// Ledger entry written alongside every placed counter order
pub type LedgerEntry = CounterOrder;

/// Per-day coupon counter document (`counterMeta/couponTracker[-Type]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponCounter {
    pub last_number: u32,
    /// Business date, `YYYY-MM-DD`
    pub last_reset_date: String,
}

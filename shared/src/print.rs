//! Print bridge protocol
//!
//! 原生外壳 (Android WebView) 与核心之间的 JSON 消息：
//! - 出站: `{type, billId, bill, hotelInfo, timestamp}`
//! - 入站: `{type: "PRINT_SUCCESS" | "PRINT_ERROR", billId, message?}`

use serde::{Deserialize, Serialize};

use crate::models::{HotelInfo, OrderType, PaymentMethod};

/// Outbound print job kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintKind {
    /// Full-size table bill
    PrintBill,
    /// 58/80mm thermal table bill
    PrintThermalBill,
    /// Counter coupon
    PrintCoupon,
}

/// One receipt line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_local: Option<String>,
    pub quantity: i32,
    pub price: f64,
    pub total: f64,
}

/// Receipt payload handed to the printer surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<OrderType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentMethod>,
    pub lines: Vec<ReceiptLine>,
    pub sub_total: f64,
    #[serde(default)]
    pub ac_charge: f64,
    #[serde(default)]
    pub gst_amount: f64,
    pub total: f64,
    pub timestamp: i64,
}

/// Outbound message to the native bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    #[serde(rename = "type")]
    pub kind: PrintKind,
    pub bill_id: String,
    pub bill: Receipt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_info: Option<HotelInfo>,
    pub timestamp: i64,
}

/// Inbound reply from the native bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintReply {
    PrintSuccess {
        #[serde(rename = "billId")]
        bill_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    PrintError {
        #[serde(rename = "billId")]
        bill_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl PrintReply {
    pub fn bill_id(&self) -> &str {
        match self {
            Self::PrintSuccess { bill_id, .. } | Self::PrintError { bill_id, .. } => bill_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::PrintSuccess { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let req = PrintRequest {
            kind: PrintKind::PrintThermalBill,
            bill_id: "b1".into(),
            bill: Receipt {
                coupon_id: None,
                table: Some("5".into()),
                order_type: None,
                payment: None,
                lines: vec![],
                sub_total: 0.0,
                ac_charge: 0.0,
                gst_amount: 0.0,
                total: 0.0,
                timestamp: 1,
            },
            hotel_info: None,
            timestamp: 2,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "PRINT_THERMAL_BILL");
        assert_eq!(json["billId"], "b1");
        assert_eq!(json["bill"]["table"], "5");
        assert!(json.get("hotelInfo").is_none());
    }

    #[test]
    fn test_reply_parse() {
        let ok: PrintReply =
            serde_json::from_str(r#"{"type":"PRINT_SUCCESS","billId":"b1"}"#).unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.bill_id(), "b1");

        let err: PrintReply = serde_json::from_str(
            r#"{"type":"PRINT_ERROR","billId":"b2","message":"no paper"}"#,
        )
        .unwrap();
        assert!(!err.is_success());
        assert_eq!(
            err,
            PrintReply::PrintError {
                bill_id: "b2".into(),
                message: Some("no paper".into())
            }
        );
    }
}

//! Receipt payloads
//!
//! 把柜台订单 / 桌台账单转换为打印通道的 [`PrintRequest`]。

use shared::models::{Bill, CounterOrder, HotelInfo, TableLine};
use shared::print::{PrintKind, PrintRequest, Receipt, ReceiptLine};
use shared::util::now_millis;

use crate::utils::money::{line_total, to_f64};

/// Receipt for a counter coupon
pub fn coupon_receipt(order: &CounterOrder) -> Receipt {
    Receipt {
        coupon_id: Some(order.coupon_id.clone()),
        table: None,
        order_type: Some(order.order_type),
        payment: Some(order.payment),
        lines: order
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: item.name.clone(),
                name_local: item.name_local.clone(),
                quantity: item.quantity,
                price: item.price,
                total: item.total,
            })
            .collect(),
        sub_total: order.sub_total,
        ac_charge: 0.0,
        gst_amount: 0.0,
        total: order.sub_total,
        timestamp: order.timestamp,
    }
}

fn table_lines(items: &[TableLine]) -> Vec<ReceiptLine> {
    items
        .iter()
        .map(|item| ReceiptLine {
            name: item.name.clone(),
            name_local: item.name_local.clone(),
            quantity: item.quantity,
            price: item.price,
            total: to_f64(line_total(item.price, item.quantity)),
        })
        .collect()
}

/// Receipt for a closed table bill
pub fn bill_receipt(bill: &Bill) -> Receipt {
    let lines = table_lines(&bill.items);
    let sub_total = to_f64(
        bill.items
            .iter()
            .map(|i| line_total(i.price, i.quantity))
            .sum(),
    );
    Receipt {
        coupon_id: None,
        table: Some(bill.table.clone()),
        order_type: None,
        payment: None,
        lines,
        sub_total,
        ac_charge: bill.ac_charge,
        gst_amount: bill.gst_amount,
        total: bill.total,
        timestamp: bill.closed_at,
    }
}

/// Wrap a receipt into an outbound print request
pub fn print_request(
    kind: PrintKind,
    bill_id: impl Into<String>,
    receipt: Receipt,
    hotel_info: Option<HotelInfo>,
) -> PrintRequest {
    PrintRequest {
        kind,
        bill_id: bill_id.into(),
        bill: receipt,
        hotel_info,
        timestamp: now_millis(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{LineItem, OrderType, PaidFlag, PaymentMethod};

    #[test]
    fn test_coupon_receipt() {
        let order = CounterOrder {
            coupon_id: "P03".into(),
            items: vec![LineItem {
                name: "Samosa".into(),
                name_local: Some("समोसा".into()),
                price: 15.0,
                quantity: 2,
                total: 30.0,
            }],
            sub_total: 30.0,
            order_type: OrderType::Parcel,
            payment: PaymentMethod::Online,
            timestamp: 42,
        };
        let receipt = coupon_receipt(&order);
        assert_eq!(receipt.coupon_id.as_deref(), Some("P03"));
        assert_eq!(receipt.total, 30.0);
        assert_eq!(receipt.lines[0].name_local.as_deref(), Some("समोसा"));
    }

    #[test]
    fn test_bill_receipt_totals() {
        let bill = Bill {
            table: "5".into(),
            items: vec![
                TableLine {
                    name: "Tea".into(),
                    name_local: None,
                    price: 10.0,
                    quantity: 4,
                },
                TableLine {
                    name: "Dosa".into(),
                    name_local: None,
                    price: 45.5,
                    quantity: 1,
                },
            ],
            ac_charge: 20.0,
            gst_amount: 4.28,
            total: 109.78,
            created_at: 1,
            updated_at: None,
            paid: PaidFlag::No,
            closed_at: 9,
            paid_at: None,
        };
        let receipt = bill_receipt(&bill);
        assert_eq!(receipt.sub_total, 85.5);
        assert_eq!(receipt.lines[0].total, 40.0);
        assert_eq!(receipt.table.as_deref(), Some("5"));

        let req = print_request(PrintKind::PrintThermalBill, "bill-1", receipt, None);
        assert_eq!(req.bill_id, "bill-1");
    }
}

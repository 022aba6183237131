//! Counter order lifecycle
//!
//! `Draft → Placed → Closed | Cancelled`
//!
//! 下单时先写进行中订单 (`counterOrder`)，再写账单流水 (`counterbill`)。
//! 两次写入不在同一事务中：第二次失败会记录日志并返回错误，不做补偿。
//! 流水只追加，删项不修改流水。

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{CounterOrder, LineItem, OrderType, PaymentMethod};
use shared::print::PrintKind;
use shared::util::now_millis;
use std::sync::Arc;

use crate::core::SessionContext;
use crate::coupon::{CounterKey, CouponAllocator};
use crate::printing::receipt::{coupon_receipt, print_request};
use crate::printing::{PrintChannel, PrintConfirmation};
use crate::settings::SettingsService;
use crate::store::{
    Collection, Direction, DocumentStore, DocumentStoreExt, Query, Record, TenantScope,
};
use crate::utils::money::{line_total, to_f64, validate_price, validate_quantity};
use crate::utils::time::business_date;
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text, validate_required_text};

/// One cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub name: String,
    #[serde(default)]
    pub name_local: Option<String>,
    pub price: f64,
    pub quantity: i32,
}

/// Place-order request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub items: Vec<CartItem>,
    pub order_type: OrderType,
    pub payment: PaymentMethod,
}

/// Result of a successful placement
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOrder {
    pub order_id: String,
    pub ledger_id: String,
    pub coupon_id: String,
    pub sub_total: f64,
}

/// Documents removed by a cancellation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelledCoupon {
    pub order_id: String,
    /// 找不到对应流水时为 `None`
    pub ledger_id: Option<String>,
}

/// Counter order operations
#[derive(Clone)]
pub struct CounterOrders {
    store: Arc<dyn DocumentStore>,
    allocator: CouponAllocator,
    settings: SettingsService,
    printer: Option<Arc<dyn PrintChannel>>,
    timezone: Tz,
}

impl CounterOrders {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        allocator: CouponAllocator,
        settings: SettingsService,
        printer: Option<Arc<dyn PrintChannel>>,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            allocator,
            settings,
            printer,
            timezone,
        }
    }

    pub async fn place(&self, session: &SessionContext, req: PlaceOrder) -> AppResult<PlacedOrder> {
        self.place_at(session, req, now_millis()).await
    }

    /// Place an order at the given instant (unix ms)
    pub async fn place_at(
        &self,
        session: &SessionContext,
        req: PlaceOrder,
        now: i64,
    ) -> AppResult<PlacedOrder> {
        let _in_flight = session.begin_place()?;
        let scope = session.scope()?.clone();

        validate_cart(&req.items)?;

        let settings = self.settings.user_settings(&scope).await?;
        let key = CounterKey::for_order(req.order_type, settings.separate_tracking);
        let today = business_date(now, self.timezone);
        let coupon = self.allocator.allocate(&scope, today, key).await?;

        let items: Vec<LineItem> = req
            .items
            .into_iter()
            .map(|item| LineItem {
                total: to_f64(line_total(item.price, item.quantity)),
                name: item.name.trim().to_string(),
                name_local: item.name_local,
                price: item.price,
                quantity: item.quantity,
            })
            .collect();
        let order = CounterOrder {
            coupon_id: coupon.display(),
            sub_total: sub_total(&items),
            items,
            order_type: req.order_type,
            payment: req.payment,
            timestamp: now,
        };

        let order_id = self
            .store
            .add_as(&scope, Collection::CounterOrder, &order)
            .await
            .inspect_err(|e| {
                tracing::error!(tenant = %scope, coupon_id = %order.coupon_id, error = %e, "Failed to write order");
            })?;

        let ledger_id = match self
            .store
            .add_as(&scope, Collection::CounterBill, &order)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(
                    tenant = %scope,
                    coupon_id = %order.coupon_id,
                    order_id = %order_id,
                    error = %e,
                    "Ledger write failed after order was written"
                );
                return Err(AppError::from(e).with_detail("orderId", order_id));
            }
        };

        tracing::info!(
            tenant = %scope,
            coupon_id = %order.coupon_id,
            order_type = %order.order_type,
            sub_total = order.sub_total,
            "Counter order placed"
        );

        self.dispatch_print(&order_id, &order);

        Ok(PlacedOrder {
            order_id,
            ledger_id,
            coupon_id: order.coupon_id,
            sub_total: order.sub_total,
        })
    }

    /// Fire-and-forget coupon print
    fn dispatch_print(&self, order_id: &str, order: &CounterOrder) {
        let Some(printer) = self.printer.clone() else {
            return;
        };
        let request = print_request(
            PrintKind::PrintCoupon,
            order_id,
            coupon_receipt(order),
            None,
        );
        let coupon_id = order.coupon_id.clone();
        tokio::spawn(async move {
            if let Err(e) = printer.print(request).await {
                tracing::warn!(coupon_id = %coupon_id, error = %e, "Coupon print failed");
            }
        });
    }

    /// Remove one line from a running order
    ///
    /// 最后一项不能删除（应取消整张单）
    pub async fn remove_item(
        &self,
        scope: &TenantScope,
        order_id: &str,
        index: usize,
    ) -> AppResult<CounterOrder> {
        let mut order = self.load(scope, order_id).await?.data;
        if order.items.len() < 2 {
            return Err(AppError::new(ErrorCode::OrderLastItem));
        }
        if index >= order.items.len() {
            return Err(AppError::with_message(
                ErrorCode::OrderItemNotFound,
                format!("Item index {} out of range", index),
            ));
        }

        let removed = order.items.remove(index);
        order.sub_total = sub_total(&order.items);
        self.store
            .set_as(scope, Collection::CounterOrder, order_id, &order)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, order_id, error = %e, "Failed to update order"))?;

        tracing::info!(
            tenant = %scope,
            coupon_id = %order.coupon_id,
            item = %removed.name,
            sub_total = order.sub_total,
            "Item removed from order"
        );
        Ok(order)
    }

    /// Cancel a running coupon and its ledger entry
    pub async fn cancel(&self, scope: &TenantScope, coupon_id: &str) -> AppResult<CancelledCoupon> {
        let coupon_id = coupon_id.trim();
        let found = self
            .store
            .list_as::<CounterOrder>(
                scope,
                Collection::CounterOrder,
                &Query::all()
                    .where_eq("couponId", coupon_id)
                    .order_by("timestamp", Direction::Desc)
                    .limit(1),
            )
            .await?;
        let Some(order) = found.into_iter().next() else {
            return Err(AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Coupon {} not found or already closed", coupon_id),
            ));
        };

        self.store
            .delete(scope, Collection::CounterOrder, &order.id)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, coupon_id, error = %e, "Failed to delete order"))?;

        // 流水删除尽力而为
        let ledger_id = match self.find_ledger_entry(scope, &order.data).await {
            Ok(Some(id)) => match self.store.delete(scope, Collection::CounterBill, &id).await {
                Ok(()) => Some(id),
                Err(e) => {
                    tracing::warn!(tenant = %scope, coupon_id, error = %e, "Failed to delete ledger entry");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(tenant = %scope, coupon_id, "No ledger entry for cancelled coupon");
                None
            }
            Err(e) => {
                tracing::warn!(tenant = %scope, coupon_id, error = %e, "Ledger lookup failed");
                None
            }
        };

        tracing::info!(tenant = %scope, coupon_id, "Coupon cancelled");
        Ok(CancelledCoupon {
            order_id: order.id,
            ledger_id,
        })
    }

    /// 同券号优先匹配同一时间戳，否则取最新一条
    async fn find_ledger_entry(
        &self,
        scope: &TenantScope,
        order: &CounterOrder,
    ) -> AppResult<Option<String>> {
        let entries = self
            .store
            .list_as::<CounterOrder>(
                scope,
                Collection::CounterBill,
                &Query::all()
                    .where_eq("couponId", order.coupon_id.as_str())
                    .order_by("timestamp", Direction::Desc),
            )
            .await?;
        let exact = entries
            .iter()
            .find(|e| e.data.timestamp == order.timestamp)
            .map(|e| e.id.clone());
        Ok(exact.or_else(|| entries.first().map(|e| e.id.clone())))
    }

    /// Close (serve) a running coupon; the ledger entry stays
    pub async fn close(&self, scope: &TenantScope, order_id: &str) -> AppResult<()> {
        self.store
            .delete(scope, Collection::CounterOrder, order_id)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, order_id, error = %e, "Failed to close order"))?;
        tracing::info!(tenant = %scope, order_id, "Coupon closed");
        Ok(())
    }

    /// Print a running coupon again and wait for the outcome
    pub async fn reprint(&self, scope: &TenantScope, order_id: &str) -> AppResult<PrintConfirmation> {
        let Some(printer) = &self.printer else {
            return Err(AppError::new(ErrorCode::PrinterNotAvailable));
        };
        let order = self.load(scope, order_id).await?;
        let request = print_request(
            PrintKind::PrintCoupon,
            order.id,
            coupon_receipt(&order.data),
            None,
        );
        Ok(printer.print(request).await?)
    }

    async fn load(&self, scope: &TenantScope, order_id: &str) -> AppResult<Record<CounterOrder>> {
        self.store
            .get_as::<CounterOrder>(scope, Collection::CounterOrder, order_id)
            .await?
            .ok_or_else(|| {
                AppError::new(ErrorCode::OrderNotFound).with_detail("orderId", order_id)
            })
    }
}

fn validate_cart(items: &[CartItem]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    for item in items {
        validate_required_text(&item.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&item.name_local, "nameLocal", MAX_NAME_LEN)?;
        validate_price(item.price, "price")?;
        validate_quantity(item.quantity)?;
    }
    Ok(())
}

fn sub_total(items: &[LineItem]) -> f64 {
    let sum: Decimal = items
        .iter()
        .map(|i| line_total(i.price, i.quantity))
        .sum();
    to_f64(sum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use crate::store::MemoryStore;
    use shared::models::SystemType;

    fn setup() -> (CounterOrders, SessionContext) {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let orders = CounterOrders::new(
            store.clone(),
            CouponAllocator::new(store.clone(), 100),
            SettingsService::new(store),
            None,
            chrono_tz::Asia::Kolkata,
        );
        let session = SessionContext::new(
            AuthUser {
                uid: "t1".into(),
                email: "counter@hotel.in".into(),
            },
            Some(SystemType::Counter),
        );
        (orders, session)
    }

    fn cart(quantity: i32) -> PlaceOrder {
        PlaceOrder {
            items: vec![CartItem {
                name: "Tea".into(),
                name_local: None,
                price: 10.0,
                quantity,
            }],
            order_type: OrderType::Parcel,
            payment: PaymentMethod::Cash,
        }
    }

    #[tokio::test]
    async fn test_rejects_before_any_write() {
        let (orders, session) = setup();
        let mut empty = cart(1);
        empty.items.clear();
        assert_eq!(
            orders.place(&session, empty).await.unwrap_err().code,
            ErrorCode::OrderEmpty
        );
        assert_eq!(
            orders.place(&session, cart(0)).await.unwrap_err().code,
            ErrorCode::InvalidQuantity
        );

        // 被拒绝的下单不消耗券号
        let placed = orders.place(&session, cart(1)).await.unwrap();
        assert_eq!(placed.coupon_id, "01");
    }

    #[tokio::test]
    async fn test_second_place_in_flight_refused() {
        let (orders, session) = setup();
        let _held = session.begin_place().unwrap();
        let err = orders.place(&session, cart(1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderInFlight);
    }

    #[tokio::test]
    async fn test_close_keeps_ledger() {
        let (orders, session) = setup();
        let placed = orders.place(&session, cart(2)).await.unwrap();
        let scope = session.scope().unwrap().clone();
        orders.close(&scope, &placed.order_id).await.unwrap();

        let ledger = orders
            .store
            .get(&scope, Collection::CounterBill, &placed.ledger_id)
            .await
            .unwrap();
        assert!(ledger.is_some());
        assert_eq!(
            orders.remove_item(&scope, &placed.order_id, 0).await.unwrap_err().code,
            ErrorCode::OrderNotFound
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_coupon() {
        let (orders, session) = setup();
        let scope = session.scope().unwrap().clone();
        let err = orders.cancel(&scope, "42").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_reprint_without_printer() {
        let (orders, session) = setup();
        let scope = session.scope().unwrap().clone();
        let err = orders.reprint(&scope, "any").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PrinterNotAvailable);
    }
}

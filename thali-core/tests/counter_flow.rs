//! Counter flow: place, edit, cancel, daily cleanup

use shared::models::{CounterOrder, OrderType, PaymentMethod, SystemType};
use thali_core::auth::AuthUser;
use thali_core::counter::{CartItem, CleanupOutcome, PlaceOrder};
use thali_core::store::{Collection, DocumentStoreExt, TenantScope};
use thali_core::utils::time::parse_date;
use thali_core::{Config, CoreState, ErrorCode, SessionContext};

fn state() -> CoreState {
    CoreState::in_memory(Config::with_overrides("/tmp/thali-unused", chrono_tz::Asia::Kolkata))
}

fn session(uid: &str) -> SessionContext {
    SessionContext::new(
        AuthUser {
            uid: uid.into(),
            email: format!("{}@hotel.in", uid),
        },
        Some(SystemType::Counter),
    )
}

fn item(name: &str, price: f64, quantity: i32) -> CartItem {
    CartItem {
        name: name.into(),
        name_local: None,
        price,
        quantity,
    }
}

#[tokio::test]
async fn place_then_cancel_removes_order_and_ledger() {
    let state = state();
    let session = session("uid-1");
    let scope = session.scope().unwrap().clone();

    let placed = state
        .counter_orders
        .place(
            &session,
            PlaceOrder {
                items: vec![item("Samosa", 15.0, 2), item("Tea", 10.0, 1)],
                order_type: OrderType::Parcel,
                payment: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap();
    assert_eq!(placed.coupon_id, "01");
    assert_eq!(placed.sub_total, 40.0);

    let order = state
        .store
        .get_as::<CounterOrder>(&scope, Collection::CounterOrder, &placed.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.data.items[0].total, 30.0);
    assert_eq!(order.data.order_type, OrderType::Parcel);
    let ledger = state
        .store
        .get_as::<CounterOrder>(&scope, Collection::CounterBill, &placed.ledger_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.data, order.data);

    let cancelled = state.counter_orders.cancel(&scope, "01").await.unwrap();
    assert_eq!(cancelled.order_id, placed.order_id);
    assert_eq!(cancelled.ledger_id.as_deref(), Some(placed.ledger_id.as_str()));
    assert!(
        state
            .store
            .get(&scope, Collection::CounterOrder, &placed.order_id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        state
            .store
            .get(&scope, Collection::CounterBill, &placed.ledger_id)
            .await
            .unwrap()
            .is_none()
    );

    let again = state.counter_orders.cancel(&scope, "01").await.unwrap_err();
    assert_eq!(again.code, ErrorCode::OrderNotFound);
}

#[tokio::test]
async fn remove_item_keeps_at_least_one_line() {
    let state = state();
    let session = session("uid-2");
    let scope = session.scope().unwrap().clone();

    let single = state
        .counter_orders
        .place(
            &session,
            PlaceOrder {
                items: vec![item("Tea", 10.0, 1)],
                order_type: OrderType::Table,
                payment: PaymentMethod::Online,
            },
        )
        .await
        .unwrap();
    let err = state
        .counter_orders
        .remove_item(&scope, &single.order_id, 0)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderLastItem);

    let pair = state
        .counter_orders
        .place(
            &session,
            PlaceOrder {
                items: vec![item("Tea", 10.0, 2), item("Vada", 25.0, 1)],
                order_type: OrderType::Table,
                payment: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap();
    assert_eq!(pair.coupon_id, "02");

    let out_of_range = state
        .counter_orders
        .remove_item(&scope, &pair.order_id, 5)
        .await
        .unwrap_err();
    assert_eq!(out_of_range.code, ErrorCode::OrderItemNotFound);

    let updated = state
        .counter_orders
        .remove_item(&scope, &pair.order_id, 0)
        .await
        .unwrap();
    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].name, "Vada");
    assert_eq!(updated.sub_total, 25.0);

}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let state = state();
    let session = session("uid-3");
    let err = state
        .counter_orders
        .place(
            &session,
            PlaceOrder {
                items: vec![],
                order_type: OrderType::Parcel,
                payment: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderEmpty);
}

#[tokio::test]
async fn daily_cleanup_runs_once_per_day() {
    let state = state();
    let session = session("uid-4");
    let scope: TenantScope = session.scope().unwrap().clone();

    for name in ["Tea", "Coffee"] {
        state
            .counter_orders
            .place(
                &session,
                PlaceOrder {
                    items: vec![item(name, 10.0, 1)],
                    order_type: OrderType::Parcel,
                    payment: PaymentMethod::Cash,
                },
            )
            .await
            .unwrap();
    }

    let today = parse_date("2026-10-19").unwrap();
    let first = state.cleanup.run(&scope, today).await.unwrap();
    assert_eq!(first, CleanupOutcome::Swept { deleted: 2 });
    assert!(state.running_coupons.list(&scope).await.unwrap().is_empty());

    // 流水不受清理影响
    let ledger = state
        .store
        .list(&scope, Collection::CounterBill, &thali_core::Query::all())
        .await
        .unwrap();
    assert_eq!(ledger.len(), 2);

    state
        .counter_orders
        .place(
            &session,
            PlaceOrder {
                items: vec![item("Tea", 10.0, 1)],
                order_type: OrderType::Parcel,
                payment: PaymentMethod::Cash,
            },
        )
        .await
        .unwrap();
    let second = state.cleanup.run(&scope, today).await.unwrap();
    assert_eq!(second, CleanupOutcome::Skipped);
    assert_eq!(state.running_coupons.list(&scope).await.unwrap().len(), 1);

    let next_day = state
        .cleanup
        .run(&scope, parse_date("2026-10-20").unwrap())
        .await
        .unwrap();
    assert_eq!(next_day, CleanupOutcome::Swept { deleted: 1 });
}

//! Coupon allocator
//!
//! 柜台取号：每个租户（开启分类计数时再按订单类型）每天从 1 开始递增，
//! 超过上限回到 1。计数文档位于 `counterMeta/couponTracker[-{orderType}]`，
//! 读-改-写通过 [`DocumentStore::transact`] 完成，多终端并发取号不会重号。

use chrono::NaiveDate;
use serde_json::Value;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{CouponCounter, OrderType};
use std::fmt;
use std::sync::Arc;

use crate::store::{Collection, DocumentStore, StoreError, TenantScope};
use crate::utils::time::{format_date, parse_date};

/// Base document id of the coupon counter
pub const COUNTER_DOC: &str = "couponTracker";

/// Which counter a coupon is drawn from
///
/// `order_type = None` 为统一计数；分类计数时每种订单类型各一份。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub order_type: Option<OrderType>,
}

impl CounterKey {
    pub fn unified() -> Self {
        Self { order_type: None }
    }

    pub fn per_type(order_type: OrderType) -> Self {
        Self {
            order_type: Some(order_type),
        }
    }

    /// Build the key from the separate-tracking toggle
    pub fn for_order(order_type: OrderType, separate_tracking: bool) -> Self {
        if separate_tracking {
            Self::per_type(order_type)
        } else {
            Self::unified()
        }
    }

    pub fn doc_id(&self) -> String {
        match self.order_type {
            Some(t) => format!("{}-{}", COUNTER_DOC, t.key()),
            None => COUNTER_DOC.to_string(),
        }
    }
}

/// Allocated coupon number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouponNumber {
    pub number: u32,
    pub key: CounterKey,
}

impl CouponNumber {
    /// Display id: two digits, order-type prefix when tracked separately
    pub fn display(&self) -> String {
        match self.key.order_type {
            Some(t) => format!("{}{:02}", t.prefix(), self.number),
            None => format!("{:02}", self.number),
        }
    }
}

impl fmt::Display for CouponNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Next number given the stored counter
///
/// - 无文档 / 文档损坏 / 日期不是今天 → 1
/// - 同一天 → `last + 1`，超过 `ceiling` 回到 1
pub fn next_number(current: Option<&CouponCounter>, today: NaiveDate, ceiling: u32) -> u32 {
    let Some(counter) = current else {
        return 1;
    };
    let same_day = parse_date(&counter.last_reset_date)
        .map(|d| d == today)
        .unwrap_or(false);
    if !same_day {
        return 1;
    }
    if counter.last_number >= ceiling {
        tracing::warn!(
            last_number = counter.last_number,
            ceiling,
            "Coupon counter wrapped"
        );
        return 1;
    }
    counter.last_number + 1
}

/// Coupon allocator over a document store
#[derive(Clone)]
pub struct CouponAllocator {
    store: Arc<dyn DocumentStore>,
    ceiling: u32,
}

impl CouponAllocator {
    pub fn new(store: Arc<dyn DocumentStore>, ceiling: u32) -> Self {
        Self {
            store,
            ceiling: ceiling.max(1),
        }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Allocate the next coupon number for `today`
    pub async fn allocate(
        &self,
        scope: &TenantScope,
        today: NaiveDate,
        key: CounterKey,
    ) -> AppResult<CouponNumber> {
        let ceiling = self.ceiling;
        let today_str = format_date(today);
        let doc_id = key.doc_id();

        let written = self
            .store
            .transact(
                scope,
                Collection::CounterMeta,
                &doc_id,
                Arc::new(move |current: Option<Value>| {
                    // 损坏的计数文档按不存在处理
                    let counter = current.and_then(|v| serde_json::from_value::<CouponCounter>(v).ok());
                    let next = CouponCounter {
                        last_number: next_number(counter.as_ref(), today, ceiling),
                        last_reset_date: today_str.clone(),
                    };
                    serde_json::to_value(next).map_err(AppError::from)
                }),
            )
            .await
            .map_err(|e| {
                tracing::error!(tenant = %scope, counter = %doc_id, error = %e, "Coupon allocation failed");
                allocation_error(e)
            })?;

        let counter: CouponCounter = serde_json::from_value(written)?;
        let coupon = CouponNumber {
            number: counter.last_number,
            key,
        };
        tracing::debug!(tenant = %scope, coupon = %coupon, "Coupon allocated");
        Ok(coupon)
    }
}

fn allocation_error(err: StoreError) -> AppError {
    let cause = AppError::from(err);
    AppError::with_message(ErrorCode::CouponAllocationFailed, cause.message.clone())
        .with_detail("cause", cause.code.code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStoreExt, MemoryStore};

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn counter(last: u32, day: &str) -> CouponCounter {
        CouponCounter {
            last_number: last,
            last_reset_date: day.into(),
        }
    }

    #[test]
    fn test_next_number_rules() {
        let today = date("2026-10-19");
        assert_eq!(next_number(None, today, 100), 1);
        assert_eq!(next_number(Some(&counter(7, "2026-10-19")), today, 100), 8);
        assert_eq!(next_number(Some(&counter(7, "2026-10-18")), today, 100), 1);
        assert_eq!(next_number(Some(&counter(100, "2026-10-19")), today, 100), 1);
        assert_eq!(next_number(Some(&counter(3, "garbage")), today, 100), 1);
    }

    #[test]
    fn test_display() {
        let unified = CouponNumber {
            number: 1,
            key: CounterKey::unified(),
        };
        assert_eq!(unified.display(), "01");

        let parcel = CouponNumber {
            number: 12,
            key: CounterKey::per_type(OrderType::Parcel),
        };
        assert_eq!(parcel.to_string(), "P12");
    }

    #[test]
    fn test_doc_ids() {
        assert_eq!(CounterKey::unified().doc_id(), "couponTracker");
        assert_eq!(
            CounterKey::for_order(OrderType::SwiggyZomato, true).doc_id(),
            "couponTracker-Swiggy-Zomato"
        );
        assert_eq!(
            CounterKey::for_order(OrderType::Table, false).doc_id(),
            "couponTracker"
        );
    }

    #[tokio::test]
    async fn test_allocate_sequence_and_keys() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let allocator = CouponAllocator::new(store.clone(), 100);
        let t = TenantScope::new("t1");
        let today = date("2026-10-19");

        let a = allocator.allocate(&t, today, CounterKey::unified()).await.unwrap();
        let b = allocator.allocate(&t, today, CounterKey::unified()).await.unwrap();
        assert_eq!((a.number, b.number), (1, 2));

        // 分类计数互不影响
        let p = allocator
            .allocate(&t, today, CounterKey::per_type(OrderType::Parcel))
            .await
            .unwrap();
        assert_eq!(p.display(), "P01");

        let stored = store
            .get_as::<CouponCounter>(&t, Collection::CounterMeta, COUNTER_DOC)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data, counter(2, "2026-10-19"));
    }

    #[tokio::test]
    async fn test_malformed_counter_resets() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let t = TenantScope::new("t1");
        store
            .set(&t, Collection::CounterMeta, COUNTER_DOC, serde_json::json!({"oops": true}))
            .await
            .unwrap();
        let allocator = CouponAllocator::new(store, 100);
        let n = allocator
            .allocate(&t, date("2026-10-19"), CounterKey::unified())
            .await
            .unwrap();
        assert_eq!(n.number, 1);
    }
}

//! Counter ledger aggregation

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use shared::models::{LedgerEntry, OrderType, PaymentMethod};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::{Collection, DocumentStore, DocumentStoreExt, Query, TenantScope};
use crate::utils::money::{to_decimal, to_f64};
use crate::utils::time::{day_end_millis, day_start_millis};

/// Ledger filter
///
/// `None` 表示不过滤（界面上的 “all”）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterFilter {
    pub start: NaiveDate,
    /// 包含当天
    pub end: NaiveDate,
    #[serde(default)]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub payment: Option<PaymentMethod>,
    /// 只统计这些商品；空表示全部
    #[serde(default)]
    pub items: Vec<String>,
}

impl CounterFilter {
    pub fn for_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            order_type: None,
            payment: None,
            items: Vec::new(),
        }
    }
}

/// One row per item name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSales {
    pub name: String,
    pub quantity: i64,
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterReport {
    pub rows: Vec<ItemSales>,
    pub total_revenue: f64,
    pub order_count: usize,
}

#[derive(Clone)]
pub struct CounterAnalytics {
    store: Arc<dyn DocumentStore>,
    timezone: Tz,
}

impl CounterAnalytics {
    pub fn new(store: Arc<dyn DocumentStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    pub async fn report(&self, scope: &TenantScope, filter: &CounterFilter) -> AppResult<CounterReport> {
        if filter.end < filter.start {
            return Err(AppError::validation("end date is before start date"));
        }
        let mut query = Query::all();
        if let Some(t) = filter.order_type {
            query = query.where_eq("orderType", t.as_str());
        }
        if let Some(p) = filter.payment {
            query = query.where_eq("payment", serde_json::to_value(p)?);
        }
        query = query
            .where_gte("timestamp", day_start_millis(filter.start, self.timezone))
            .where_lt("timestamp", day_end_millis(filter.end, self.timezone));

        let entries: Vec<LedgerEntry> = self
            .store
            .list_as::<LedgerEntry>(scope, Collection::CounterBill, &query)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, error = %e, "Ledger query failed"))?
            .into_iter()
            .map(|r| r.data)
            .collect();

        let report = aggregate(&entries, &filter.items);
        tracing::debug!(
            tenant = %scope,
            orders = report.order_count,
            revenue = report.total_revenue,
            "Counter report built"
        );
        Ok(report)
    }
}

/// Group ledger lines by item name, then apply the item selection
pub fn aggregate(entries: &[LedgerEntry], selected: &[String]) -> CounterReport {
    let mut grouped: BTreeMap<&str, (i64, Decimal)> = BTreeMap::new();
    for item in entries.iter().flat_map(|e| e.items.iter()) {
        let row = grouped.entry(item.name.as_str()).or_default();
        row.0 += i64::from(item.quantity);
        row.1 += to_decimal(item.total);
    }

    let rows: Vec<ItemSales> = grouped
        .into_iter()
        .filter(|(name, _)| selected.is_empty() || selected.iter().any(|s| s == name))
        .map(|(name, (quantity, subtotal))| ItemSales {
            name: name.to_string(),
            quantity,
            subtotal: to_f64(subtotal),
        })
        .collect();
    let total: Decimal = rows.iter().map(|r| to_decimal(r.subtotal)).sum();

    CounterReport {
        total_revenue: to_f64(total),
        order_count: entries.len(),
        rows,
    }
}

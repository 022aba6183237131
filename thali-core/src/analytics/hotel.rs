//! Hotel revenue by day

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::AppResult;
use shared::models::Bill;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::{Collection, DocumentStore, DocumentStoreExt, Query, TenantScope};
use crate::utils::money::{to_decimal, to_f64};
use crate::utils::time::{business_date, format_date, month_bounds};

/// Paid revenue of one business day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    /// YYYY-MM-DD
    pub date: String,
    pub total: f64,
    pub bills: usize,
}

#[derive(Clone)]
pub struct HotelAnalytics {
    store: Arc<dyn DocumentStore>,
    timezone: Tz,
}

impl HotelAnalytics {
    pub fn new(store: Arc<dyn DocumentStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    /// Paid bills of a month grouped by the day they were opened
    pub async fn monthly(&self, scope: &TenantScope, year: i32, month: u32) -> AppResult<Vec<DailyRevenue>> {
        let (first, next) = month_bounds(year, month)?;
        let bills = self
            .store
            .list_as::<Bill>(scope, Collection::Bills, &Query::all().where_eq("paid", "yes"))
            .await?;
        let bills: Vec<Bill> = bills.into_iter().map(|r| r.data).collect();
        Ok(revenue_by_day(&bills, first, next, self.timezone))
    }
}

/// Sum paid totals per business day within `[first, next)`
pub fn revenue_by_day(bills: &[Bill], first: NaiveDate, next: NaiveDate, tz: Tz) -> Vec<DailyRevenue> {
    let mut days: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
    for bill in bills.iter().filter(|b| b.is_paid()) {
        let day = business_date(bill.created_at, tz);
        if day < first || day >= next {
            continue;
        }
        let entry = days.entry(day).or_default();
        entry.0 += to_decimal(bill.total);
        entry.1 += 1;
    }
    days.into_iter()
        .map(|(day, (total, count))| DailyRevenue {
            date: format_date(day),
            total: to_f64(total),
            bills: count,
        })
        .collect()
}

/// Month total across the daily rows
pub fn month_total(rows: &[DailyRevenue]) -> f64 {
    to_f64(rows.iter().map(|r| to_decimal(r.total)).sum())
}

/// Days in the month that have no revenue rows
pub fn empty_days(rows: &[DailyRevenue], year: i32, month: u32) -> AppResult<Vec<String>> {
    let (first, next) = month_bounds(year, month)?;
    Ok(first
        .iter_days()
        .take_while(|d| *d < next)
        .filter(|d| d.month() == month)
        .map(format_date)
        .filter(|d| !rows.iter().any(|r| &r.date == d))
        .collect())
}

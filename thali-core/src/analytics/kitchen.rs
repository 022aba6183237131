//! Kitchen item summary by date

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared::error::AppResult;
use shared::models::KitchenOrder;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::{Collection, DocumentStore, DocumentStoreExt, Query, TenantScope};
use crate::utils::time::{day_end_millis, day_start_millis};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenItemCount {
    pub name: String,
    pub quantity: i64,
}

#[derive(Clone)]
pub struct KitchenAnalytics {
    store: Arc<dyn DocumentStore>,
    timezone: Tz,
}

impl KitchenAnalytics {
    pub fn new(store: Arc<dyn DocumentStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    /// Quantities per item across tickets created on `date`
    pub async fn summary(&self, scope: &TenantScope, date: NaiveDate) -> AppResult<Vec<KitchenItemCount>> {
        let query = Query::all()
            .where_gte("createdAt", day_start_millis(date, self.timezone))
            .where_lt("createdAt", day_end_millis(date, self.timezone));
        let tickets = self
            .store
            .list_as::<KitchenOrder>(scope, Collection::Orders, &query)
            .await?;

        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for item in tickets.iter().flat_map(|t| t.data.items.iter()) {
            *counts.entry(item.name.clone()).or_default() += i64::from(item.quantity);
        }
        Ok(counts
            .into_iter()
            .map(|(name, quantity)| KitchenItemCount { name, quantity })
            .collect())
    }
}

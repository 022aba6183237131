//! Running coupons
//!
//! 进行中取号视图：按时间倒序列出，分类计数时按订单类型分组；
//! 顶部显示热门商品的待出数量。柜台显示屏只看堂食 (Table) 取号，按时间正序。

use serde::Serialize;
use shared::error::AppResult;
use shared::models::{CounterOrder, OrderType};
use std::sync::Arc;

use crate::settings::SettingsService;
use crate::store::{
    Collection, Direction, DocumentStore, DocumentStoreExt, Query, Record, Subscription,
    TenantScope,
};

/// Quantity of one top item across running coupons
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuantity {
    pub name: String,
    pub quantity: i64,
}

/// Top-item summary, unified or split by order type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TopItemSummary {
    Unified(Vec<ItemQuantity>),
    PerType(Vec<(OrderType, Vec<ItemQuantity>)>),
}

/// Running coupon queries
#[derive(Clone)]
pub struct RunningCoupons {
    store: Arc<dyn DocumentStore>,
    settings: SettingsService,
}

impl RunningCoupons {
    pub fn new(store: Arc<dyn DocumentStore>, settings: SettingsService) -> Self {
        Self { store, settings }
    }

    /// Newest first
    pub fn query() -> Query {
        Query::all().order_by("timestamp", Direction::Desc)
    }

    /// Table-type coupons, oldest first
    pub fn table_display_query() -> Query {
        Query::all()
            .where_eq("orderType", OrderType::Table.as_str())
            .order_by("timestamp", Direction::Asc)
    }

    pub async fn list(&self, scope: &TenantScope) -> AppResult<Vec<Record<CounterOrder>>> {
        Ok(self
            .store
            .list_as(scope, Collection::CounterOrder, &Self::query())
            .await?)
    }

    pub async fn table_display(&self, scope: &TenantScope) -> AppResult<Vec<Record<CounterOrder>>> {
        Ok(self
            .store
            .list_as(scope, Collection::CounterOrder, &Self::table_display_query())
            .await?)
    }

    pub fn subscribe(&self, scope: TenantScope) -> Subscription {
        Subscription::new(self.store.clone(), scope, Collection::CounterOrder, Self::query())
    }

    pub fn subscribe_table_display(&self, scope: TenantScope) -> Subscription {
        Subscription::new(
            self.store.clone(),
            scope,
            Collection::CounterOrder,
            Self::table_display_query(),
        )
    }

    /// Top-item summary for the current running coupons
    pub async fn summary(&self, scope: &TenantScope) -> AppResult<TopItemSummary> {
        let top = self.settings.top_items(scope).await?;
        let settings = self.settings.user_settings(scope).await?;
        let orders = self.list(scope).await?;
        let orders: Vec<CounterOrder> = orders.into_iter().map(|r| r.data).collect();

        if settings.separate_tracking {
            let per_type = group_by_type(&orders)
                .into_iter()
                .map(|(t, group)| (t, top_item_quantities(group, &top.items)))
                .collect();
            Ok(TopItemSummary::PerType(per_type))
        } else {
            Ok(TopItemSummary::Unified(top_item_quantities(
                orders.iter(),
                &top.items,
            )))
        }
    }
}

/// Group orders by type, in [`OrderType::ALL`] order, skipping empty groups
pub fn group_by_type(orders: &[CounterOrder]) -> Vec<(OrderType, Vec<&CounterOrder>)> {
    OrderType::ALL
        .iter()
        .filter_map(|t| {
            let group: Vec<&CounterOrder> = orders.iter().filter(|o| o.order_type == *t).collect();
            (!group.is_empty()).then_some((*t, group))
        })
        .collect()
}

/// Sum quantities of each named item (exact name match)
pub fn top_item_quantities<'a, I>(orders: I, names: &[String]) -> Vec<ItemQuantity>
where
    I: IntoIterator<Item = &'a CounterOrder>,
    I::IntoIter: Clone,
{
    let orders = orders.into_iter();
    names
        .iter()
        .map(|name| ItemQuantity {
            name: name.clone(),
            quantity: orders
                .clone()
                .flat_map(|o| o.items.iter())
                .filter(|i| &i.name == name)
                .map(|i| i64::from(i.quantity))
                .sum(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::models::{LineItem, PaymentMethod, UserSettings};

    fn order(coupon: &str, order_type: OrderType, items: &[(&str, i32)], ts: i64) -> CounterOrder {
        CounterOrder {
            coupon_id: coupon.into(),
            items: items
                .iter()
                .map(|(name, qty)| LineItem {
                    name: name.to_string(),
                    name_local: None,
                    price: 10.0,
                    quantity: *qty,
                    total: 10.0 * f64::from(*qty),
                })
                .collect(),
            sub_total: 0.0,
            order_type,
            payment: PaymentMethod::Cash,
            timestamp: ts,
        }
    }

    #[test]
    fn test_top_item_quantities() {
        let orders = vec![
            order("01", OrderType::Parcel, &[("Tea", 2), ("Samosa", 1)], 1),
            order("02", OrderType::Table, &[("Tea", 3)], 2),
        ];
        let names = vec!["Tea".to_string(), "Vada".to_string()];
        let summary = top_item_quantities(orders.iter(), &names);
        assert_eq!(summary[0].quantity, 5);
        assert_eq!(summary[1].quantity, 0);

        let groups = group_by_type(&orders);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, OrderType::Table);
    }

    #[tokio::test]
    async fn test_listing_and_summary() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let settings = SettingsService::new(store.clone());
        let running = RunningCoupons::new(store.clone(), settings.clone());
        let t = TenantScope::new("t1");

        for o in [
            order("01", OrderType::Table, &[("Tea", 1)], 10),
            order("02", OrderType::Parcel, &[("Tea", 2)], 20),
            order("03", OrderType::Table, &[("Tea", 4)], 30),
        ] {
            store.add_as(&t, Collection::CounterOrder, &o).await.unwrap();
        }
        settings.save_top_items(&t, &["Tea".into()]).await.unwrap();

        let list = running.list(&t).await.unwrap();
        assert_eq!(list[0].data.coupon_id, "03");

        let display = running.table_display(&t).await.unwrap();
        let ids: Vec<_> = display.iter().map(|r| r.data.coupon_id.as_str()).collect();
        assert_eq!(ids, vec!["01", "03"]);

        assert_eq!(
            running.summary(&t).await.unwrap(),
            TopItemSummary::Unified(vec![ItemQuantity {
                name: "Tea".into(),
                quantity: 7
            }])
        );

        settings
            .save_user_settings(
                &t,
                &UserSettings {
                    separate_tracking: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        match running.summary(&t).await.unwrap() {
            TopItemSummary::PerType(groups) => {
                assert_eq!(groups.len(), 2);
                assert_eq!(groups[0].1[0].quantity, 5);
                assert_eq!(groups[1].1[0].quantity, 2);
            }
            other => panic!("unexpected summary {:?}", other),
        }
    }
}

//! Running tables
//!
//! 同一桌台只有一份进行中记录（文档 id = 桌台标识），新下单按菜名合并数量，
//! 并重新计算 AC 附加费、GST 与合计。同时把本次菜品合并进该桌的厨房单。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{HotelInfo, KitchenLine, KitchenOrder, RunningTable, TableLine};
use shared::util::now_millis;
use std::sync::Arc;

use super::TableId;
use crate::settings::SettingsService;
use crate::store::{
    Collection, Direction, DocumentStore, DocumentStoreExt, Query, Record, Subscription,
    TenantScope,
};
use crate::utils::money::{line_total, percentage_of, to_decimal, to_f64, validate_price, validate_quantity};
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text, validate_required_text};

/// One ordered menu line (price already chosen from the menu)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub name: String,
    #[serde(default)]
    pub name_local: Option<String>,
    pub price: f64,
    pub quantity: i32,
}

/// Table order request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOrder {
    pub table: u32,
    #[serde(default)]
    pub split: Option<u8>,
    pub items: Vec<OrderLine>,
}

/// Running-table and kitchen-ticket writes for the table flow
#[derive(Clone)]
pub struct RunningTables {
    store: Arc<dyn DocumentStore>,
    settings: SettingsService,
}

impl RunningTables {
    pub fn new(store: Arc<dyn DocumentStore>, settings: SettingsService) -> Self {
        Self { store, settings }
    }

    pub async fn place_order(&self, scope: &TenantScope, req: TableOrder) -> AppResult<RunningTable> {
        self.place_order_at(scope, req, now_millis()).await
    }

    /// Merge an order into the running table and the kitchen ticket
    pub async fn place_order_at(
        &self,
        scope: &TenantScope,
        req: TableOrder,
        now: i64,
    ) -> AppResult<RunningTable> {
        let table_id = TableId::new(req.table, req.split)?;
        validate_lines(&req.items)?;
        let table = table_id.to_string();
        let hotel = self.settings.hotel_info(scope).await?;

        let existing = self
            .store
            .get_as::<RunningTable>(scope, Collection::RunningTables, &table)
            .await?
            .map(|r| r.data);

        let mut running = existing.unwrap_or_else(|| RunningTable {
            table: table.clone(),
            items: Vec::new(),
            ac_charge: 0.0,
            gst_amount: 0.0,
            total: 0.0,
            created_at: now,
            updated_at: None,
        });
        let is_update = !running.items.is_empty();
        merge_table_lines(&mut running.items, &req.items);
        recompute(&mut running, &hotel, table_id.number);
        if is_update {
            running.updated_at = Some(now);
        }

        self.store
            .set_as(scope, Collection::RunningTables, &table, &running)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, table = %table, error = %e, "Failed to write running table"))?;

        self.merge_kitchen_ticket(scope, &table, &req.items, now)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, table = %table, error = %e, "Failed to write kitchen ticket"))?;

        tracing::info!(
            tenant = %scope,
            table = %table,
            items = running.items.len(),
            total = running.total,
            "Table order placed"
        );
        Ok(running)
    }

    /// 合并进该桌的进行中厨房单；没有进行中的单则新建
    async fn merge_kitchen_ticket(
        &self,
        scope: &TenantScope,
        table: &str,
        lines: &[OrderLine],
        now: i64,
    ) -> AppResult<String> {
        let tickets = self
            .store
            .list_as::<KitchenOrder>(
                scope,
                Collection::Orders,
                &Query::all()
                    .where_eq("table", table)
                    .order_by("createdAt", Direction::Desc),
            )
            .await?;

        let new_lines = lines.iter().map(|l| KitchenLine {
            name: l.name.trim().to_string(),
            name_local: l.name_local.clone(),
            quantity: l.quantity,
            timestamp: now,
        });

        match tickets.into_iter().find(|t| t.data.is_active()) {
            Some(Record { id, data: mut ticket }) => {
                for line in new_lines {
                    match ticket.items.iter_mut().find(|i| i.name == line.name) {
                        Some(existing) => existing.quantity += line.quantity,
                        None => ticket.items.push(line),
                    }
                }
                ticket.updated_at = Some(now);
                self.store
                    .set_as(scope, Collection::Orders, &id, &ticket)
                    .await?;
                Ok(id)
            }
            None => {
                let mut items: Vec<KitchenLine> = Vec::new();
                for line in new_lines {
                    match items.iter_mut().find(|i| i.name == line.name) {
                        Some(existing) => existing.quantity += line.quantity,
                        None => items.push(line),
                    }
                }
                let ticket = KitchenOrder {
                    table: table.to_string(),
                    items,
                    status: None,
                    created_at: now,
                    updated_at: None,
                };
                Ok(self.store.add_as(scope, Collection::Orders, &ticket).await?)
            }
        }
    }

    pub async fn get(&self, scope: &TenantScope, table: &str) -> AppResult<RunningTable> {
        self.store
            .get_as::<RunningTable>(scope, Collection::RunningTables, table)
            .await?
            .map(|r| r.data)
            .ok_or_else(|| AppError::new(ErrorCode::TableNotFound).with_detail("table", table))
    }

    pub async fn list(&self, scope: &TenantScope) -> AppResult<Vec<Record<RunningTable>>> {
        Ok(self
            .store
            .list_as(
                scope,
                Collection::RunningTables,
                &Query::all().order_by("createdAt", Direction::Asc),
            )
            .await?)
    }

    pub fn subscribe(&self, scope: TenantScope) -> Subscription {
        Subscription::new(
            self.store.clone(),
            scope,
            Collection::RunningTables,
            Query::all().order_by("createdAt", Direction::Asc),
        )
    }
}

fn validate_lines(lines: &[OrderLine]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    for line in lines {
        validate_required_text(&line.name, "name", MAX_NAME_LEN)?;
        validate_optional_text(&line.name_local, "nameLocal", MAX_NAME_LEN)?;
        validate_price(line.price, "price")?;
        validate_quantity(line.quantity)?;
    }
    Ok(())
}

/// Merge by item name, adding quantities
pub fn merge_table_lines(items: &mut Vec<TableLine>, lines: &[OrderLine]) {
    for line in lines {
        let name = line.name.trim();
        match items.iter_mut().find(|i| i.name == name) {
            Some(existing) => existing.quantity += line.quantity,
            None => items.push(TableLine {
                name: name.to_string(),
                name_local: line.name_local.clone(),
                price: line.price,
                quantity: line.quantity,
            }),
        }
    }
}

/// Recompute AC charge, GST and total from the items
pub fn recompute(running: &mut RunningTable, hotel: &HotelInfo, table_number: u32) {
    let subtotal: Decimal = running
        .items
        .iter()
        .map(|i| line_total(i.price, i.quantity))
        .sum();
    let ac_charge = to_decimal(hotel.table_charge(table_number));
    let gst = percentage_of(subtotal, hotel.gst_percentage);

    running.ac_charge = to_f64(ac_charge);
    running.gst_amount = to_f64(gst);
    running.total = to_f64(subtotal + ac_charge + gst);
}

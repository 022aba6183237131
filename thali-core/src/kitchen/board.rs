//! Board queries and status writes

use serde::Serialize;
use serde_json::Value;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{KitchenOrder, TicketStatus};
use shared::util::now_millis;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::transition;
use crate::store::{
    Collection, Direction, DocumentStore, DocumentStoreExt, Query, Record, Snapshot,
    StoreError, Subscription, TenantScope,
};

/// Tickets of one table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableTickets {
    pub table: String,
    pub tickets: Vec<Record<KitchenOrder>>,
}

#[derive(Clone)]
pub struct KitchenBoard {
    store: Arc<dyn DocumentStore>,
}

impl KitchenBoard {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Active → prepared
    pub async fn mark_prepared(&self, scope: &TenantScope, id: &str) -> AppResult<KitchenOrder> {
        self.advance(scope, id, TicketStatus::Prepared).await
    }

    /// Prepared → served
    pub async fn mark_served(&self, scope: &TenantScope, id: &str) -> AppResult<KitchenOrder> {
        self.advance(scope, id, TicketStatus::Served).await
    }

    async fn advance(
        &self,
        scope: &TenantScope,
        id: &str,
        target: TicketStatus,
    ) -> AppResult<KitchenOrder> {
        let now = now_millis();
        let ticket_id = id.to_string();
        let written = self
            .store
            .transact(
                scope,
                Collection::Orders,
                id,
                Arc::new(move |current: Option<Value>| {
                    let Some(current) = current else {
                        return Err(AppError::new(ErrorCode::TicketNotFound)
                            .with_detail("id", ticket_id.as_str()));
                    };
                    let mut ticket: KitchenOrder = serde_json::from_value(current)?;
                    ticket.status = Some(transition(ticket.status, target)?);
                    ticket.updated_at = Some(now);
                    Ok(serde_json::to_value(ticket)?)
                }),
            )
            .await
            .map_err(|e| {
                if !matches!(e, StoreError::Rejected(_)) {
                    tracing::error!(tenant = %scope, id, error = %e, "Ticket status write failed");
                }
                AppError::from(e)
            })?;

        let ticket: KitchenOrder = serde_json::from_value(written)?;
        tracing::info!(tenant = %scope, id, table = %ticket.table, status = ?target, "Ticket advanced");
        Ok(ticket)
    }

    /// Active tickets, oldest first
    pub async fn active(&self, scope: &TenantScope) -> AppResult<Vec<Record<KitchenOrder>>> {
        let mut tickets = self.all(scope).await?;
        tickets.retain(|t| t.data.is_active());
        Ok(tickets)
    }

    /// Prepared tickets waiting to be served
    pub async fn ready(&self, scope: &TenantScope) -> AppResult<Vec<Record<KitchenOrder>>> {
        let mut tickets = self.all(scope).await?;
        tickets.retain(|t| t.data.is_ready());
        Ok(tickets)
    }

    async fn all(&self, scope: &TenantScope) -> AppResult<Vec<Record<KitchenOrder>>> {
        Ok(self
            .store
            .list_as(scope, Collection::Orders, &Self::query())
            .await?)
    }

    fn query() -> Query {
        Query::all().order_by("createdAt", Direction::Asc)
    }

    /// All tickets; shape with [`active_snapshot`] or [`ready_snapshot`]
    pub fn subscribe(&self, scope: TenantScope) -> Subscription {
        Subscription::new(self.store.clone(), scope, Collection::Orders, Self::query())
    }
}

/// 缺失的 status 视为进行中
fn status_of(data: &Value) -> Option<&str> {
    data.get("status").and_then(|v| v.as_str())
}

/// Keep tickets whose status is neither prepared nor served
pub fn active_snapshot(mut snapshot: Snapshot) -> Snapshot {
    snapshot
        .docs
        .retain(|d| !matches!(status_of(&d.data), Some("prepared") | Some("served")));
    snapshot
}

/// Keep prepared tickets
pub fn ready_snapshot(mut snapshot: Snapshot) -> Snapshot {
    snapshot.docs.retain(|d| status_of(&d.data) == Some("prepared"));
    snapshot
}

/// Group tickets by table, tables in ascending identifier order
pub fn group_by_table(tickets: Vec<Record<KitchenOrder>>) -> Vec<TableTickets> {
    let mut groups: BTreeMap<String, Vec<Record<KitchenOrder>>> = BTreeMap::new();
    for ticket in tickets {
        groups
            .entry(ticket.data.table.clone())
            .or_default()
            .push(ticket);
    }
    groups
        .into_iter()
        .map(|(table, tickets)| TableTickets { table, tickets })
        .collect()
}

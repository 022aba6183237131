//! Billing
//!
//! 结台：由进行中桌台生成账单 (`paid = "no"`) 并删除桌台。
//! 打印成功（原生回执 `PRINT_SUCCESS`，或桌面对话框完成 / 兜底超时）后才标记已付；
//! 打印失败账单保持未付。账单从不删除，`paid` 只会从 `no` 变为 `yes`。

use serde_json::json;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Bill, PaidFlag, RunningTable};
use shared::print::PrintKind;
use shared::util::now_millis;
use std::sync::Arc;

use crate::printing::receipt::{bill_receipt, print_request};
use crate::printing::{PrintChannel, PrintConfirmation};
use crate::settings::SettingsService;
use crate::store::{
    Collection, Direction, DocumentStore, DocumentStoreExt, Query, Record, Subscription,
    TenantScope,
};

/// Bill operations for the table flow
#[derive(Clone)]
pub struct Billing {
    store: Arc<dyn DocumentStore>,
    settings: SettingsService,
    printer: Option<Arc<dyn PrintChannel>>,
}

impl Billing {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        settings: SettingsService,
        printer: Option<Arc<dyn PrintChannel>>,
    ) -> Self {
        Self {
            store,
            settings,
            printer,
        }
    }

    /// Close a running table into an unpaid bill, returns the bill id
    pub async fn close_table(&self, scope: &TenantScope, table: &str) -> AppResult<String> {
        let running = self
            .store
            .get_as::<RunningTable>(scope, Collection::RunningTables, table)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::TableNotFound).with_detail("table", table))?
            .data;

        let bill = Bill {
            table: running.table,
            items: running.items,
            ac_charge: running.ac_charge,
            gst_amount: running.gst_amount,
            total: running.total,
            created_at: running.created_at,
            updated_at: running.updated_at,
            paid: PaidFlag::No,
            closed_at: now_millis(),
            paid_at: None,
        };
        let bill_id = self
            .store
            .add_as(scope, Collection::Bills, &bill)
            .await
            .inspect_err(|e| tracing::error!(tenant = %scope, table, error = %e, "Failed to create bill"))?;

        self.store
            .delete(scope, Collection::RunningTables, table)
            .await
            .inspect_err(|e| {
                tracing::error!(tenant = %scope, table, bill_id = %bill_id, error = %e, "Bill created but running table not removed");
            })?;

        tracing::info!(tenant = %scope, table, bill_id = %bill_id, total = bill.total, "Table closed");
        Ok(bill_id)
    }

    pub async fn get(&self, scope: &TenantScope, bill_id: &str) -> AppResult<Bill> {
        self.store
            .get_as::<Bill>(scope, Collection::Bills, bill_id)
            .await?
            .map(|r| r.data)
            .ok_or_else(|| AppError::new(ErrorCode::BillNotFound).with_detail("billId", bill_id))
    }

    /// Flip `paid` to `yes`
    ///
    /// 只在打印成功后调用；已付账单再次调用返回 BillAlreadyPaid
    pub async fn mark_paid(&self, scope: &TenantScope, bill_id: &str) -> AppResult<()> {
        let bill = self.get(scope, bill_id).await?;
        if bill.is_paid() {
            return Err(AppError::new(ErrorCode::BillAlreadyPaid).with_detail("billId", bill_id));
        }
        self.store
            .update(
                scope,
                Collection::Bills,
                bill_id,
                json!({"paid": PaidFlag::Yes, "paidAt": now_millis()}),
            )
            .await?;
        tracing::info!(tenant = %scope, bill_id, "Bill marked paid");
        Ok(())
    }

    /// Print a bill, then mark it paid on success
    ///
    /// 打印失败时账单保持未付并返回错误
    pub async fn print_and_settle(
        &self,
        scope: &TenantScope,
        bill_id: &str,
        kind: PrintKind,
    ) -> AppResult<PrintConfirmation> {
        let Some(printer) = &self.printer else {
            return Err(AppError::new(ErrorCode::PrinterNotAvailable));
        };
        let bill = self.get(scope, bill_id).await?;
        if bill.is_paid() {
            return Err(AppError::new(ErrorCode::BillAlreadyPaid).with_detail("billId", bill_id));
        }
        let hotel = self.settings.hotel_info(scope).await?;
        let request = print_request(kind, bill_id, bill_receipt(&bill), Some(hotel));

        let confirmation = match printer.print(request).await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(tenant = %scope, bill_id, error = %e, "Bill print failed, left unpaid");
                return Err(e.into());
            }
        };
        self.mark_paid(scope, bill_id).await?;
        Ok(confirmation)
    }

    /// Unpaid bills, oldest first
    pub async fn unpaid(&self, scope: &TenantScope) -> AppResult<Vec<Record<Bill>>> {
        Ok(self
            .store
            .list_as(scope, Collection::Bills, &Self::unpaid_query())
            .await?)
    }

    pub fn unpaid_query() -> Query {
        Query::all()
            .where_eq("paid", "no")
            .order_by("closedAt", Direction::Asc)
    }

    pub fn subscribe_unpaid(&self, scope: TenantScope) -> Subscription {
        Subscription::new(self.store.clone(), scope, Collection::Bills, Self::unpaid_query())
    }
}

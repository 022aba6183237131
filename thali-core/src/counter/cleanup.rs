//! Daily cleanup of running coupons
//!
//! 登录时执行：标记日期不是今天则删除所有进行中取号，全部成功后再写标记。
//! 至少执行一次，非原子：中途失败不写标记，下次重试。

use chrono::NaiveDate;
use futures::future::join_all;
use shared::error::{AppError, AppResult};
use shared::models::CleanupMarker;
use std::sync::Arc;

use crate::settings::CLEANUP_MARKER_DOC;
use crate::store::{Collection, DocumentStore, DocumentStoreExt, Query, TenantScope};
use crate::utils::time::format_date;

/// Result of a cleanup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// 今天已经清理过
    Skipped,
    Swept { deleted: usize },
}

#[derive(Clone)]
pub struct DailyCleanup {
    store: Arc<dyn DocumentStore>,
}

impl DailyCleanup {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn run(&self, scope: &TenantScope, today: NaiveDate) -> AppResult<CleanupOutcome> {
        let today = format_date(today);
        let marker = self
            .store
            .get_as::<CleanupMarker>(scope, Collection::Settings, CLEANUP_MARKER_DOC)
            .await?;
        if marker.is_some_and(|m| m.data.date == today) {
            return Ok(CleanupOutcome::Skipped);
        }

        let orders = self
            .store
            .list(scope, Collection::CounterOrder, &Query::all())
            .await?;
        let results = join_all(
            orders
                .iter()
                .map(|doc| self.store.delete(scope, Collection::CounterOrder, &doc.id)),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            if let Some(Err(e)) = results.into_iter().find(|r| r.is_err()) {
                tracing::error!(tenant = %scope, failed, error = %e, "Daily cleanup incomplete");
            }
            return Err(AppError::database(format!(
                "Daily cleanup failed for {} coupon(s)",
                failed
            )));
        }

        self.store
            .set_as(
                scope,
                Collection::Settings,
                CLEANUP_MARKER_DOC,
                &CleanupMarker {
                    date: today.clone(),
                },
            )
            .await?;

        tracing::info!(tenant = %scope, date = %today, deleted = orders.len(), "Daily coupon cleanup done");
        Ok(CleanupOutcome::Swept {
            deleted: orders.len(),
        })
    }
}

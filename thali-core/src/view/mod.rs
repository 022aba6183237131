//! Live views
//!
//! 厨房看板、取餐视图、柜台显示屏共用同一套机制：
//! [`Subscription`] 推送完整快照 → [`SnapshotTracker`] 计算一次差异 →
//! 分发给所有 [`DiffObserver`]（高亮、提示音、通知）。
//!
//! [`Subscription`]: crate::store::Subscription

mod highlight;
mod notify;
mod tracker;

pub use highlight::HighlightSet;
pub use notify::ArrivalNotifier;
pub use tracker::{DiffObserver, SnapshotDiff, SnapshotTracker};

use tokio_util::sync::CancellationToken;

use crate::store::{Snapshot, Subscription};

/// Drive a subscription into a tracker until cancelled
///
/// `shape` 在比较前裁剪快照（例如只保留进行中的厨房单）。
/// 视图销毁时取消 token，之后到达的快照直接丢弃。
pub async fn run_view<F>(
    mut subscription: Subscription,
    tracker: SnapshotTracker,
    cancel: CancellationToken,
    shape: F,
) where
    F: Fn(Snapshot) -> Snapshot + Send,
{
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = subscription.next() => next,
        };
        match next {
            Some(Ok(snapshot)) => {
                if cancel.is_cancelled() {
                    break;
                }
                tracker.process(shape(snapshot));
            }
            Some(Err(e)) => {
                tracing::error!(tenant = %subscription.scope(), error = %e, "View snapshot failed");
            }
            None => {
                tracing::debug!(tenant = %subscription.scope(), "Store closed, view stopped");
                break;
            }
        }
    }
}

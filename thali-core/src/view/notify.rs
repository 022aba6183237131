//! Arrival notifications

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{DiffObserver, SnapshotDiff};
use crate::store::Document;

/// Sends one field of every newly arrived document
///
/// 柜台新取号提示用 `couponId`，取餐视图的“已做好”提示用 `table`。
/// 首个快照是加载已有数据，不提示。
pub struct ArrivalNotifier {
    field: &'static str,
    tx: mpsc::Sender<String>,
}

impl ArrivalNotifier {
    /// 队列满时丢弃新提示，不阻塞视图循环
    pub fn new(field: &'static str, capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { field, tx }, rx)
    }
}

impl DiffObserver for ArrivalNotifier {
    fn on_diff(&self, diff: &SnapshotDiff, docs: &[Document]) {
        if diff.initial {
            return;
        }
        for id in &diff.added {
            let value = docs
                .iter()
                .find(|d| &d.id == id)
                .and_then(|d| d.data.get(self.field))
                .and_then(|v| v.as_str());
            let Some(value) = value else { continue };
            match self.tx.try_send(value.to_string()) {
                Ok(()) => {}
                Err(TrySendError::Full(value)) => {
                    tracing::warn!(field = self.field, value = %value, "Arrival queue full, dropping notification");
                }
                // 接收方已关闭
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }
}

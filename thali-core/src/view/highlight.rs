//! Auto-clearing highlight set
//!
//! 新到达的 id 高亮一段时间后自动清除。重复高亮会重新计时（代数递增，
//! 旧定时器到期时发现代数不符直接退出）；`clear` 或 drop 取消所有定时器。

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{DiffObserver, SnapshotDiff};
use crate::store::Document;

/// Ids currently highlighted, each cleared after `ttl`
pub struct HighlightSet {
    ttl: Duration,
    entries: Arc<DashMap<String, u64>>,
    generation: AtomicU64,
    cancel: Mutex<CancellationToken>,
    /// 首次加载的文档是否也高亮（厨房看板是，柜台显示屏不是）
    on_first_load: bool,
}

impl HighlightSet {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            cancel: Mutex::new(CancellationToken::new()),
            on_first_load: true,
        }
    }

    /// Leave documents of the first snapshot unhighlighted
    pub fn skip_first_load(mut self) -> Self {
        self.on_first_load = false;
        self
    }

    /// Highlight `id`, restarting its timer
    ///
    /// 需要在 tokio 运行时内调用
    pub fn highlight(&self, id: &str) {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries.insert(id.to_string(), generation);

        let entries = self.entries.clone();
        let cancel = self.cancel.lock().clone();
        let ttl = self.ttl;
        let id = id.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(ttl) => {
                    entries.remove_if(&id, |_, g| *g == generation);
                }
            }
        });
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear every highlight and cancel pending timers
    pub fn clear(&self) {
        let previous = std::mem::replace(&mut *self.cancel.lock(), CancellationToken::new());
        previous.cancel();
        self.entries.clear();
    }
}

impl DiffObserver for HighlightSet {
    fn on_diff(&self, diff: &SnapshotDiff, _docs: &[Document]) {
        if diff.initial && !self.on_first_load {
            return;
        }
        for id in &diff.added {
            self.highlight(id);
        }
        for id in &diff.removed {
            self.entries.remove(id);
        }
    }
}

impl Drop for HighlightSet {
    fn drop(&mut self) {
        self.cancel.lock().cancel();
    }
}

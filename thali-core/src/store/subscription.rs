//! Live query subscription
//!
//! 监听存储的变更通知，相关集合发生写入时重新拉取完整快照。
//! 快照按存储序号单调递增交付，旧序号的快照直接丢弃。

use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::{ChangeNotice, Collection, DocumentStore, Query, Snapshot, StoreResult, TenantScope};

/// Snapshot stream for one tenant collection query
pub struct Subscription {
    store: Arc<dyn DocumentStore>,
    scope: TenantScope,
    collection: Collection,
    query: Query,
    rx: broadcast::Receiver<ChangeNotice>,
    last_sequence: Option<u64>,
    primed: bool,
}

impl Subscription {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        scope: TenantScope,
        collection: Collection,
        query: Query,
    ) -> Self {
        // 先订阅再读首个快照，避免漏掉中间的写入
        let rx = store.changes();
        Self {
            store,
            scope,
            collection,
            query,
            rx,
            last_sequence: None,
            primed: false,
        }
    }

    pub fn scope(&self) -> &TenantScope {
        &self.scope
    }

    /// Next snapshot, `None` once the store is gone
    ///
    /// 第一次调用立即返回当前快照；之后等待相关写入。
    pub async fn next(&mut self) -> Option<StoreResult<Snapshot>> {
        if !self.primed {
            self.primed = true;
            let first = self.fetch().await;
            if let Ok(snapshot) = &first {
                self.last_sequence = Some(snapshot.sequence);
            }
            return Some(first);
        }

        loop {
            match self.rx.recv().await {
                Ok(notice) => {
                    if notice.scope != self.scope || notice.collection != self.collection {
                        continue;
                    }
                    if self
                        .last_sequence
                        .is_some_and(|last| notice.sequence <= last)
                    {
                        continue;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        tenant = %self.scope,
                        collection = %self.collection,
                        skipped,
                        "Subscription lagged, refetching"
                    );
                }
                Err(RecvError::Closed) => return None,
            }

            match self.fetch().await {
                Ok(snapshot) => {
                    if self
                        .last_sequence
                        .is_some_and(|last| snapshot.sequence <= last)
                    {
                        // 并发拉取拿到的旧快照
                        continue;
                    }
                    self.last_sequence = Some(snapshot.sequence);
                    return Some(Ok(snapshot));
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }

    async fn fetch(&self) -> StoreResult<Snapshot> {
        self.store
            .snapshot(&self.scope, self.collection, &self.query)
            .await
    }
}

//! In-memory store (tests, ephemeral sessions)

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared::util::new_doc_id;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::broadcast;

use super::{
    ChangeNotice, Collection, Document, DocumentStore, Query, Snapshot, StoreError, StoreResult,
    TenantScope, TransactFn, merge_fields,
};

const CHANGE_CHANNEL_CAPACITY: usize = 256;

type CollectionKey = (TenantScope, Collection);

#[derive(Default)]
struct Inner {
    docs: HashMap<CollectionKey, BTreeMap<String, Value>>,
    sequence: u64,
}

impl Inner {
    fn put(&mut self, scope: &TenantScope, collection: Collection, id: &str, data: Value) -> u64 {
        self.docs
            .entry((scope.clone(), collection))
            .or_default()
            .insert(id.to_string(), data);
        self.sequence += 1;
        self.sequence
    }

    fn collect(&self, scope: &TenantScope, collection: Collection) -> Vec<Document> {
        self.docs
            .get(&(scope.clone(), collection))
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Document store held entirely in memory
pub struct MemoryStore {
    inner: RwLock<Inner>,
    changes: broadcast::Sender<ChangeNotice>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(Inner::default()),
            changes,
        }
    }

    fn notify(&self, scope: &TenantScope, collection: Collection, id: &str, sequence: u64) {
        // 没有订阅者时 send 会失败，忽略
        let _ = self.changes.send(ChangeNotice {
            scope: scope.clone(),
            collection,
            id: id.to_string(),
            sequence,
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<Document>> {
        let inner = self.inner.read();
        Ok(inner
            .docs
            .get(&(scope.clone(), collection))
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_string(),
                data: data.clone(),
            }))
    }

    async fn list(
        &self,
        scope: &TenantScope,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Vec<Document>> {
        let docs = self.inner.read().collect(scope, collection);
        Ok(query.apply(docs))
    }

    async fn add(
        &self,
        scope: &TenantScope,
        collection: Collection,
        data: Value,
    ) -> StoreResult<String> {
        let id = new_doc_id();
        let seq = self.inner.write().put(scope, collection, &id, data);
        self.notify(scope, collection, &id, seq);
        Ok(id)
    }

    async fn set(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> StoreResult<()> {
        let seq = self.inner.write().put(scope, collection, id, data);
        self.notify(scope, collection, id, seq);
        Ok(())
    }

    async fn update(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> StoreResult<()> {
        let seq = {
            let mut inner = self.inner.write();
            let Some(existing) = inner
                .docs
                .get(&(scope.clone(), collection))
                .and_then(|docs| docs.get(id))
                .cloned()
            else {
                return Err(StoreError::NotFound {
                    collection,
                    id: id.to_string(),
                });
            };
            let mut merged = existing;
            merge_fields(&mut merged, patch);
            inner.put(scope, collection, id, merged)
        };
        self.notify(scope, collection, id, seq);
        Ok(())
    }

    async fn delete(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<()> {
        let seq = {
            let mut inner = self.inner.write();
            let removed = inner
                .docs
                .get_mut(&(scope.clone(), collection))
                .and_then(|docs| docs.remove(id));
            if removed.is_none() {
                return Ok(());
            }
            inner.sequence += 1;
            inner.sequence
        };
        self.notify(scope, collection, id, seq);
        Ok(())
    }

    async fn snapshot(
        &self,
        scope: &TenantScope,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Snapshot> {
        let (sequence, docs) = {
            let inner = self.inner.read();
            (inner.sequence, inner.collect(scope, collection))
        };
        Ok(Snapshot {
            sequence,
            docs: query.apply(docs),
        })
    }

    fn changes(&self) -> broadcast::Receiver<ChangeNotice> {
        self.changes.subscribe()
    }

    async fn transact(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
        body: TransactFn,
    ) -> StoreResult<Value> {
        // 写锁覆盖读-改-写全过程，单进程内天然串行
        let (seq, written) = {
            let mut inner = self.inner.write();
            let current = inner
                .docs
                .get(&(scope.clone(), collection))
                .and_then(|docs| docs.get(id))
                .cloned();
            let next = body(current).map_err(StoreError::Rejected)?;
            let seq = inner.put(scope, collection, id, next.clone());
            (seq, next)
        };
        self.notify(scope, collection, id, seq);
        Ok(written)
    }
}

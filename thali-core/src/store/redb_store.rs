//! redb-based document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `documents` | `(tenant, collection, id)` | JSON bytes | Tenant documents |
//! | `sequence_counter` | `"seq"` | `u64` | Global write sequence |
//!
//! 每次写事务提交前递增序号，订阅方据此丢弃过期快照。
//! redb 调用是阻塞的，统一放到 `spawn_blocking`。

use async_trait::async_trait;
use redb::{
    Database, ReadOnlyTable, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde_json::Value;
use shared::util::new_doc_id;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::{
    ChangeNotice, Collection, Document, DocumentStore, Query, Snapshot, StoreError, StoreResult,
    TenantScope, TransactFn, merge_fields,
};

/// key = (tenant, collection, id), value = JSON-serialized document
const DOCUMENTS_TABLE: TableDefinition<(&str, &str, &str), &[u8]> =
    TableDefinition::new("documents");

/// key = "seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Document store backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    changes: broadcast::Sender<ChangeNotice>,
}

impl RedbStore {
    /// Open or create the database at the given path
    ///
    /// redb 默认 `Durability::Immediate`，`commit()` 返回即落盘
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            db: Arc::new(db),
            changes,
        })
    }

    /// Current write sequence (read-only)
    pub fn current_sequence(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    /// Run blocking redb work off the async runtime
    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Backend(anyhow::Error::new(e)))?
    }

    fn notify(&self, scope: &TenantScope, collection: Collection, id: &str, sequence: u64) {
        let _ = self.changes.send(ChangeNotice {
            scope: scope.clone(),
            collection,
            id: id.to_string(),
            sequence,
        });
    }
}

/// Increment and return the sequence number (within transaction)
fn increment_sequence(txn: &WriteTransaction) -> StoreResult<u64> {
    let mut table = txn.open_table(SEQUENCE_TABLE)?;
    let current = table
        .get(SEQUENCE_KEY)?
        .map(|guard| guard.value())
        .unwrap_or(0);
    let next = current + 1;
    table.insert(SEQUENCE_KEY, next)?;
    Ok(next)
}

fn read_doc(
    txn: &WriteTransaction,
    tenant: &str,
    collection: &str,
    id: &str,
) -> StoreResult<Option<Value>> {
    let table = txn.open_table(DOCUMENTS_TABLE)?;
    let value = match table.get((tenant, collection, id))? {
        Some(guard) => Some(serde_json::from_slice(guard.value())?),
        None => None,
    };
    Ok(value)
}

fn write_doc(
    txn: &WriteTransaction,
    tenant: &str,
    collection: &str,
    id: &str,
    data: &Value,
) -> StoreResult<u64> {
    let bytes = serde_json::to_vec(data)?;
    {
        let mut table = txn.open_table(DOCUMENTS_TABLE)?;
        table.insert((tenant, collection, id), bytes.as_slice())?;
    }
    increment_sequence(txn)
}

/// All documents of one tenant collection, ordered by id
fn scan_collection(
    table: &ReadOnlyTable<(&'static str, &'static str, &'static str), &'static [u8]>,
    tenant: &str,
    collection: &str,
) -> StoreResult<Vec<Document>> {
    let mut docs = Vec::new();
    for result in table.range((tenant, collection, "")..)? {
        let (key, value) = result?;
        let (t, c, id) = key.value();
        if t != tenant || c != collection {
            break;
        }
        docs.push(Document {
            id: id.to_string(),
            data: serde_json::from_slice(value.value())?,
        });
    }
    Ok(docs)
}

#[async_trait]
impl DocumentStore for RedbStore {
    async fn get(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<Document>> {
        let tenant = scope.to_string();
        let id = id.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(DOCUMENTS_TABLE)?;
            let doc = match table.get((tenant.as_str(), collection.as_str(), id.as_str()))? {
                Some(guard) => Some(Document {
                    data: serde_json::from_slice(guard.value())?,
                    id,
                }),
                None => None,
            };
            Ok(doc)
        })
        .await
    }

    async fn list(
        &self,
        scope: &TenantScope,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Vec<Document>> {
        Ok(self.snapshot(scope, collection, query).await?.docs)
    }

    async fn add(
        &self,
        scope: &TenantScope,
        collection: Collection,
        data: Value,
    ) -> StoreResult<String> {
        let id = new_doc_id();
        self.set(scope, collection, &id, data).await?;
        Ok(id)
    }

    async fn set(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> StoreResult<()> {
        let tenant = scope.to_string();
        let doc_id = id.to_string();
        let seq = self
            .blocking(move |db| {
                let txn = db.begin_write()?;
                let seq = write_doc(&txn, &tenant, collection.as_str(), &doc_id, &data)?;
                txn.commit()?;
                Ok(seq)
            })
            .await?;
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
        let tenant = scope.to_string();
        let doc_id = id.to_string();
        let seq = self
            .blocking(move |db| {
                let txn = db.begin_write()?;
                let Some(mut current) = read_doc(&txn, &tenant, collection.as_str(), &doc_id)?
                else {
                    return Err(StoreError::NotFound {
                        collection,
                        id: doc_id,
                    });
                };
                merge_fields(&mut current, patch);
                let seq = write_doc(&txn, &tenant, collection.as_str(), &doc_id, &current)?;
                txn.commit()?;
                Ok(seq)
            })
            .await?;
        self.notify(scope, collection, id, seq);
        Ok(())
    }

    async fn delete(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<()> {
        let tenant = scope.to_string();
        let doc_id = id.to_string();
        let seq = self
            .blocking(move |db| {
                let txn = db.begin_write()?;
                let removed = {
                    let mut table = txn.open_table(DOCUMENTS_TABLE)?;
                    table
                        .remove((tenant.as_str(), collection.as_str(), doc_id.as_str()))?
                        .is_some()
                };
                if !removed {
                    // 不存在：不递增序号
                    txn.abort()?;
                    return Ok(None);
                }
                let seq = increment_sequence(&txn)?;
                txn.commit()?;
                Ok(Some(seq))
            })
            .await?;
        if let Some(seq) = seq {
            self.notify(scope, collection, id, seq);
        }
        Ok(())
    }

    async fn snapshot(
        &self,
        scope: &TenantScope,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Snapshot> {
        let tenant = scope.to_string();
        let query = query.clone();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let sequence = read_txn
                .open_table(SEQUENCE_TABLE)?
                .get(SEQUENCE_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0);
            let table = read_txn.open_table(DOCUMENTS_TABLE)?;
            let docs = scan_collection(&table, &tenant, collection.as_str())?;
            Ok(Snapshot {
                sequence,
                docs: query.apply(docs),
            })
        })
        .await
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
        let tenant = scope.to_string();
        let doc_id = id.to_string();
        // redb 同一时刻只有一个写事务，读-改-写天然原子
        let (seq, written) = self
            .blocking(move |db| {
                let txn = db.begin_write()?;
                let current = read_doc(&txn, &tenant, collection.as_str(), &doc_id)?;
                let next = body(current).map_err(StoreError::Rejected)?;
                let seq = write_doc(&txn, &tenant, collection.as_str(), &doc_id, &next)?;
                txn.commit()?;
                Ok((seq, next))
            })
            .await?;
        self.notify(scope, collection, id, seq);
        Ok(written)
    }
}

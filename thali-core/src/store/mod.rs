//! Tenant-scoped document store
//!
//! 所有数据都在 `users/{tenant}/{collection}/{id}` 下，每次调用都必须带上
//! [`TenantScope`]，不存在跨租户读取。
//!
//! # 后端
//!
//! | Backend | 用途 |
//! |---------|------|
//! | [`MemoryStore`] | 测试、临时会话 |
//! | [`RedbStore`] | 本地持久化 (redb) |
//!
//! 托管文档库只需实现 [`DocumentStore`] 即可接入。

mod error;
mod memory;
mod query;
mod redb_store;
mod subscription;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use query::{Direction, Filter, FilterOp, Query};
pub use redb_store::RedbStore;
pub use subscription::Subscription;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::AppResult;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Tenant key (the auth provider's uid)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantScope(Arc<str>);

impl TenantScope {
    pub fn new(uid: impl AsRef<str>) -> Self {
        Self(Arc::from(uid.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collections under a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    CounterItems,
    Menu,
    CounterMeta,
    CounterOrder,
    CounterBill,
    RunningTables,
    Bills,
    Orders,
    Settings,
    Profile,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CounterItems => "counterItems",
            Self::Menu => "menu",
            Self::CounterMeta => "counterMeta",
            Self::CounterOrder => "counterOrder",
            Self::CounterBill => "counterbill",
            Self::RunningTables => "runningTables",
            Self::Bills => "bills",
            Self::Orders => "orders",
            Self::Settings => "settings",
            Self::Profile => "profile",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn decode<T: DeserializeOwned>(self) -> StoreResult<Record<T>> {
        Ok(Record {
            data: serde_json::from_value(self.data)?,
            id: self.id,
        })
    }
}

/// Typed document with its id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<T> {
    pub id: String,
    pub data: T,
}

/// Query result tagged with the store sequence it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub sequence: u64,
    pub docs: Vec<Document>,
}

impl Snapshot {
    pub fn decode<T: DeserializeOwned>(self) -> StoreResult<Vec<Record<T>>> {
        self.docs.into_iter().map(Document::decode).collect()
    }
}

/// Emitted after every committed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub scope: TenantScope,
    pub collection: Collection,
    pub id: String,
    pub sequence: u64,
}

/// Read-modify-write body for [`DocumentStore::transact`]
///
/// 收到当前文档（不存在为 `None`），返回要写入的新文档；返回错误则不写入。
/// 托管后端冲突时会重新调用，所以必须是纯函数。
pub type TransactFn = Arc<dyn Fn(Option<Value>) -> AppResult<Value> + Send + Sync>;

/// Document store contract
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<Document>>;

    async fn list(
        &self,
        scope: &TenantScope,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Vec<Document>>;

    /// Insert with a generated id
    async fn add(&self, scope: &TenantScope, collection: Collection, data: Value)
    -> StoreResult<String>;

    /// Create or replace
    async fn set(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> StoreResult<()>;

    /// Merge top-level fields into an existing document
    async fn update(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> StoreResult<()>;

    /// Idempotent: deleting a missing document succeeds
    async fn delete(&self, scope: &TenantScope, collection: Collection, id: &str)
    -> StoreResult<()>;

    /// Query plus the sequence it was read at
    async fn snapshot(
        &self,
        scope: &TenantScope,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Snapshot>;

    /// Change feed for subscriptions
    fn changes(&self) -> broadcast::Receiver<ChangeNotice>;

    /// Atomic single-document read-modify-write, returns the written document
    async fn transact(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
        body: TransactFn,
    ) -> StoreResult<Value>;
}

/// Typed helpers over [`DocumentStore`]
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    async fn get_as<T>(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
    ) -> StoreResult<Option<Record<T>>>
    where
        T: DeserializeOwned + Send,
    {
        self.get(scope, collection, id)
            .await?
            .map(Document::decode)
            .transpose()
    }

    async fn list_as<T>(
        &self,
        scope: &TenantScope,
        collection: Collection,
        query: &Query,
    ) -> StoreResult<Vec<Record<T>>>
    where
        T: DeserializeOwned + Send,
    {
        self.list(scope, collection, query)
            .await?
            .into_iter()
            .map(Document::decode)
            .collect()
    }

    async fn add_as<T>(
        &self,
        scope: &TenantScope,
        collection: Collection,
        data: &T,
    ) -> StoreResult<String>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(data)?;
        self.add(scope, collection, value).await
    }

    async fn set_as<T>(
        &self,
        scope: &TenantScope,
        collection: Collection,
        id: &str,
        data: &T,
    ) -> StoreResult<()>
    where
        T: Serialize + Sync,
    {
        let value = serde_json::to_value(data)?;
        self.set(scope, collection, id, value).await
    }
}

impl<S: DocumentStore + ?Sized> DocumentStoreExt for S {}

/// Shallow merge of `patch` into `target` (both objects)
pub(crate) fn merge_fields(target: &mut Value, patch: Value) {
    match (target.as_object_mut(), patch) {
        (Some(obj), Value::Object(fields)) => {
            for (k, v) in fields {
                obj.insert(k, v);
            }
        }
        (_, other) => *target = other,
    }
}

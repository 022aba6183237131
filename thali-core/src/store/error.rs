//! Store errors

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use super::Collection;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    /// 事务闭包拒绝了当前文档状态，不写入
    #[error("{0}")]
    Rejected(AppError),

    #[error("Transaction conflict after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Redb(#[from] redb::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        Self::Redb(err.into())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                AppError::not_found(format!("{}/{}", collection, id))
            }
            StoreError::Rejected(app) => app,
            StoreError::Conflict { attempts } => {
                AppError::conflict(format!("Gave up after {} attempts", attempts))
            }
            StoreError::Serialization(e) => {
                AppError::with_message(ErrorCode::InvalidFormat, e.to_string())
            }
            StoreError::Redb(e) => AppError::database(e.to_string()),
            StoreError::Backend(e) => AppError::database(e.to_string()),
        }
    }
}

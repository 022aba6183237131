//! Printing
//!
//! 两种打印通道，统一为 [`PrintChannel`]：
//!
//! | 通道 | 说明 |
//! |------|------|
//! | [`NativeBridge`] | Android 外壳，JSON 消息往返，`PRINT_SUCCESS` / `PRINT_ERROR` 回执 |
//! | [`DialogChannel`] | 桌面打印对话框，完成回调或兜底超时 |
//!
//! 打印失败从不回滚已写入的数据，只会跳过“标记已付”。

mod bridge;
mod dialog;
pub mod receipt;

pub use bridge::NativeBridge;
pub use dialog::{DialogChannel, DialogHandle, PrintDialog};

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::print::PrintRequest;
use thiserror::Error;

/// Print errors
#[derive(Debug, Error)]
pub enum PrintError {
    /// 外壳未连接或通道已关闭
    #[error("Printer unavailable: {0}")]
    Unavailable(String),

    #[error("Print queue full")]
    QueueFull,

    #[error("Print timed out: {bill_id}")]
    Timeout { bill_id: String },

    /// 外壳返回 PRINT_ERROR
    #[error("Print failed for {bill_id}: {message}")]
    Rejected { bill_id: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PrintResult<T> = Result<T, PrintError>;

impl From<PrintError> for AppError {
    fn from(err: PrintError) -> Self {
        match err {
            PrintError::Unavailable(msg) => {
                AppError::with_message(ErrorCode::PrinterNotAvailable, msg)
            }
            PrintError::QueueFull => {
                AppError::with_message(ErrorCode::PrinterNotAvailable, "Print queue full")
            }
            PrintError::Timeout { bill_id } => {
                AppError::timeout(format!("No print reply for {}", bill_id))
                    .with_detail("billId", bill_id)
            }
            PrintError::Rejected { bill_id, message } => {
                AppError::with_message(ErrorCode::PrintFailed, message).with_detail("billId", bill_id)
            }
            PrintError::Serialization(e) => {
                AppError::with_message(ErrorCode::InvalidFormat, e.to_string())
            }
        }
    }
}

/// How a print job was confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 外壳或对话框明确回报完成
    Confirmed,
    /// 对话框兜底超时
    Fallback,
}

/// Successful print
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintConfirmation {
    pub bill_id: String,
    pub completion: Completion,
    pub message: Option<String>,
}

/// Print channel contract
#[async_trait]
pub trait PrintChannel: Send + Sync {
    /// Send a job and wait for its outcome
    async fn print(&self, request: PrintRequest) -> PrintResult<PrintConfirmation>;
}

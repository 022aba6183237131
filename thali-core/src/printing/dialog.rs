//! Desktop print dialog
//!
//! 打开打印对话框后等待完成回调；对话框不回调时在兜底超时后视为完成。

use async_trait::async_trait;
use shared::print::PrintRequest;
use std::time::Duration;
use tokio::sync::oneshot;

use super::{Completion, PrintChannel, PrintConfirmation, PrintResult};

/// Completion handle returned by [`PrintDialog::open`]
pub type DialogHandle = oneshot::Receiver<()>;

/// Surface that shows a receipt and reports when printing finished
pub trait PrintDialog: Send + Sync {
    fn open(&self, request: &PrintRequest) -> PrintResult<DialogHandle>;
}

/// [`PrintChannel`] over a desktop dialog
pub struct DialogChannel<D> {
    dialog: D,
    fallback: Duration,
}

impl<D: PrintDialog> DialogChannel<D> {
    pub fn new(dialog: D, fallback: Duration) -> Self {
        Self { dialog, fallback }
    }
}

#[async_trait]
impl<D: PrintDialog> PrintChannel for DialogChannel<D> {
    async fn print(&self, request: PrintRequest) -> PrintResult<PrintConfirmation> {
        let handle = self.dialog.open(&request)?;
        let completion = match tokio::time::timeout(self.fallback, handle).await {
            Ok(Ok(())) => Completion::Confirmed,
            // 对话框关闭但没有回调，同样按兜底处理
            Ok(Err(_)) | Err(_) => {
                tracing::debug!(bill_id = %request.bill_id, "Print dialog fallback");
                Completion::Fallback
            }
        };
        Ok(PrintConfirmation {
            bill_id: request.bill_id,
            completion,
            message: None,
        })
    }
}

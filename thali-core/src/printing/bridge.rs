//! Native print bridge
//!
//! 出站消息写入 mpsc 队列，由外壳读取；外壳回执通过 [`NativeBridge::handle_reply`]
//! 按 `billId` 找到等待中的 oneshot。同一张账单可以有多个任务在等，
//! 回执只带 `billId`，按发送顺序依次匹配。超时或通道关闭只清理本任务。

use async_trait::async_trait;
use dashmap::DashMap;
use shared::print::{PrintReply, PrintRequest};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use super::{Completion, PrintChannel, PrintConfirmation, PrintError, PrintResult};

const OUTBOUND_CAPACITY: usize = 32;

type Waiting = VecDeque<(u64, oneshot::Sender<PrintReply>)>;

/// Print channel backed by the native shell's message bridge
#[derive(Clone)]
pub struct NativeBridge {
    outbound: mpsc::Sender<String>,
    /// billId -> 等待回执的任务（先发先配）
    pending: Arc<DashMap<String, Waiting>>,
    next_job: Arc<AtomicU64>,
    timeout: Duration,
}

impl NativeBridge {
    /// Create the bridge and the receiver the shell drains
    pub fn new(timeout: Duration) -> (Self, mpsc::Receiver<String>) {
        let (outbound, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        (
            Self {
                outbound,
                pending: Arc::new(DashMap::new()),
                next_job: Arc::new(AtomicU64::new(1)),
                timeout,
            },
            rx,
        )
    }

    /// Route an inbound JSON reply to its waiting job
    ///
    /// 返回 `false` 表示消息无法解析或没有对应的等待任务
    pub fn handle_reply(&self, raw: &str) -> bool {
        let reply: PrintReply = match serde_json::from_str(raw) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed print reply");
                return false;
            }
        };
        let bill_id = reply.bill_id().to_string();
        let mut reply = reply;
        loop {
            let Some(tx) = self.next_waiting(&bill_id) else {
                tracing::debug!(bill_id = %bill_id, "Print reply without a pending job");
                return false;
            };
            // 调用方已放弃等待时交给下一个任务
            match tx.send(reply) {
                Ok(()) => return true,
                Err(unclaimed) => reply = unclaimed,
            }
        }
    }

    /// Number of jobs still waiting for a reply
    pub fn pending_count(&self) -> usize {
        self.pending.iter().map(|jobs| jobs.len()).sum()
    }

    fn enqueue(&self, bill_id: &str, tx: oneshot::Sender<PrintReply>) -> u64 {
        let job = self.next_job.fetch_add(1, Ordering::Relaxed);
        self.pending
            .entry(bill_id.to_string())
            .or_default()
            .push_back((job, tx));
        job
    }

    fn next_waiting(&self, bill_id: &str) -> Option<oneshot::Sender<PrintReply>> {
        let tx = self
            .pending
            .get_mut(bill_id)
            .and_then(|mut jobs| jobs.pop_front())
            .map(|(_, tx)| tx);
        self.pending.remove_if(bill_id, |_, jobs| jobs.is_empty());
        tx
    }

    /// 只移除本任务，同一账单的其他任务继续等待
    fn forget(&self, bill_id: &str, job: u64) {
        if let Some(mut jobs) = self.pending.get_mut(bill_id) {
            jobs.retain(|(id, _)| *id != job);
        }
        self.pending.remove_if(bill_id, |_, jobs| jobs.is_empty());
    }
}

#[async_trait]
impl PrintChannel for NativeBridge {
    async fn print(&self, request: PrintRequest) -> PrintResult<PrintConfirmation> {
        let bill_id = request.bill_id.clone();
        let payload = serde_json::to_string(&request)?;

        let (tx, rx) = oneshot::channel();
        let job = self.enqueue(&bill_id, tx);

        if let Err(e) = self.outbound.try_send(payload) {
            self.forget(&bill_id, job);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => PrintError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => {
                    PrintError::Unavailable("Native bridge closed".into())
                }
            });
        }
        tracing::debug!(bill_id = %bill_id, job, kind = ?request.kind, "Print job sent to bridge");

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(PrintReply::PrintSuccess { bill_id, message })) => {
                tracing::info!(bill_id = %bill_id, "Print confirmed");
                Ok(PrintConfirmation {
                    bill_id,
                    completion: Completion::Confirmed,
                    message,
                })
            }
            Ok(Ok(PrintReply::PrintError { bill_id, message })) => {
                let message = message.unwrap_or_else(|| "Unknown printer error".into());
                tracing::warn!(bill_id = %bill_id, message = %message, "Print rejected by bridge");
                Err(PrintError::Rejected { bill_id, message })
            }
            Ok(Err(_)) => {
                self.forget(&bill_id, job);
                Err(PrintError::Unavailable("Native bridge dropped the job".into()))
            }
            Err(_) => {
                self.forget(&bill_id, job);
                tracing::warn!(bill_id = %bill_id, "Print reply timed out");
                Err(PrintError::Timeout { bill_id })
            }
        }
    }
}

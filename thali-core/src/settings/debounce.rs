//! Debounced writer
//!
//! 窗口内的多次修改只写最后一次；新的修改取消尚未触发的写入。
//! `cancel` 或 drop 时清除待写定时器，`flush` 立即写入待写值。

use futures::future::BoxFuture;
use parking_lot::Mutex;
use shared::error::AppResult;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type WriteFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, AppResult<()>> + Send + Sync>;

struct Pending<T> {
    value: Option<T>,
    /// 当前窗口的定时器，带代次编号
    timer: Option<(u64, CancellationToken)>,
    generation: u64,
}

impl<T> Pending<T> {
    /// 定时器到期：只有仍是当前代次时才取走值
    fn take_elapsed(&mut self, generation: u64) -> Option<T> {
        if !self.timer.as_ref().is_some_and(|(g, _)| *g == generation) {
            return None;
        }
        self.timer = None;
        self.value.take()
    }

    fn cancel_timer(&mut self) {
        if let Some((_, timer)) = self.timer.take() {
            timer.cancel();
        }
    }
}

/// Coalesces rapid changes into one delayed write
pub struct DebouncedWriter<T> {
    window: Duration,
    write: WriteFn<T>,
    pending: Arc<Mutex<Pending<T>>>,
}

impl<T: Send + 'static> DebouncedWriter<T> {
    pub fn new<F>(window: Duration, write: F) -> Self
    where
        F: Fn(T) -> BoxFuture<'static, AppResult<()>> + Send + Sync + 'static,
    {
        Self {
            window,
            write: Arc::new(write),
            pending: Arc::new(Mutex::new(Pending {
                value: None,
                timer: None,
                generation: 0,
            })),
        }
    }

    /// Record a change and restart the window
    ///
    /// 需要在 tokio 运行时内调用
    pub fn schedule(&self, value: T) {
        let token = CancellationToken::new();
        let generation = {
            let mut pending = self.pending.lock();
            pending.cancel_timer();
            pending.generation += 1;
            let generation = pending.generation;
            pending.timer = Some((generation, token.clone()));
            pending.value = Some(value);
            generation
        };

        let pending = self.pending.clone();
        let write = self.write.clone();
        let window = self.window;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(window) => {
                    let value = pending.lock().take_elapsed(generation);
                    if let Some(value) = value
                        && let Err(e) = write(value).await
                    {
                        tracing::error!(error = %e, "Debounced write failed");
                    }
                }
            }
        });
    }

    /// Whether a write is waiting for its window
    pub fn is_pending(&self) -> bool {
        self.pending.lock().value.is_some()
    }

    /// Write the pending value now
    pub async fn flush(&self) -> AppResult<()> {
        let value = {
            let mut pending = self.pending.lock();
            pending.cancel_timer();
            pending.value.take()
        };
        match value {
            Some(value) => (self.write)(value).await,
            None => Ok(()),
        }
    }

    /// Drop the pending value without writing
    pub fn cancel(&self) {
        let mut pending = self.pending.lock();
        pending.cancel_timer();
        pending.value = None;
    }
}

impl<T> Drop for DebouncedWriter<T> {
    fn drop(&mut self) {
        self.pending.lock().cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn recording_writer(window: Duration) -> (DebouncedWriter<u32>, Arc<Mutex<Vec<u32>>>) {
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = written.clone();
        let writer = DebouncedWriter::new(window, move |v: u32| {
            let sink = sink.clone();
            async move {
                sink.lock().push(v);
                Ok(())
            }
            .boxed()
        });
        (writer, written)
    }

    #[tokio::test]
    async fn test_coalesces_to_last_value() {
        let (writer, written) = recording_writer(Duration::from_millis(50));
        writer.schedule(1);
        writer.schedule(2);
        writer.schedule(3);
        assert!(writer.is_pending());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*written.lock(), vec![3]);
        assert!(!writer.is_pending());
    }

    #[tokio::test]
    async fn test_cancel_and_drop_skip_write() {
        let (writer, written) = recording_writer(Duration::from_millis(30));
        writer.schedule(1);
        writer.cancel();

        let (dropped, dropped_written) = recording_writer(Duration::from_millis(30));
        dropped.schedule(9);
        drop(dropped);

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(written.lock().is_empty());
        assert!(dropped_written.lock().is_empty());
    }

    #[test]
    fn test_elapsed_timer_keeps_newer_window() {
        let mut pending = Pending {
            value: Some(1),
            timer: Some((1, CancellationToken::new())),
            generation: 1,
        };
        // 旧定时器到期前，新一次 schedule 已经替换
        let newer = CancellationToken::new();
        pending.value = Some(2);
        pending.generation = 2;
        pending.timer = Some((2, newer.clone()));

        assert_eq!(pending.take_elapsed(1), None);
        assert!(pending.timer.is_some());
        assert_eq!(pending.value, Some(2));

        pending.cancel_timer();
        assert!(newer.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_after_reschedule_skips_write() {
        let (writer, written) = recording_writer(Duration::from_millis(40));
        writer.schedule(1);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*written.lock(), vec![1]);

        writer.schedule(2);
        writer.cancel();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(*written.lock(), vec![1]);
        assert!(!writer.is_pending());
    }

    #[tokio::test]
    async fn test_flush_writes_immediately() {
        let (writer, written) = recording_writer(Duration::from_secs(10));
        writer.schedule(7);
        writer.flush().await.unwrap();
        assert_eq!(*written.lock(), vec![7]);
        // nothing left for the cancelled timer
        writer.flush().await.unwrap();
        assert_eq!(written.lock().len(), 1);
    }
}

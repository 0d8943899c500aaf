// 终端尺寸变化监听
// 收到窗口变化通知后读取本地尺寸，与上次发送的不同才转发给远端

use std::io;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::session::ShellChannel;
use crate::terminal::{TerminalControl, TerminalSize};

/// 窗口变化通知源
#[async_trait]
pub trait ResizeSignal: Send {
    /// 等待下一次通知；返回 None 表示不会再有通知
    async fn recv(&mut self) -> Option<()>;
}

/// 操作系统窗口变化信号（unix 上为 SIGWINCH）
pub struct OsResizeSignal {
    #[cfg(unix)]
    inner: tokio::signal::unix::Signal,
}

impl OsResizeSignal {
    #[cfg(unix)]
    pub fn new() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            inner: signal(SignalKind::window_change())?,
        })
    }

    #[cfg(not(unix))]
    pub fn new() -> io::Result<Self> {
        Ok(Self {})
    }
}

#[async_trait]
impl ResizeSignal for OsResizeSignal {
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<()> {
        self.inner.recv().await
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<()> {
        std::future::pending().await
    }
}

/// 从不触发的通知源，信号注册失败时使用
pub struct NoResize;

#[async_trait]
impl ResizeSignal for NoResize {
    async fn recv(&mut self) -> Option<()> {
        std::future::pending().await
    }
}

#[async_trait]
impl ResizeSignal for mpsc::UnboundedReceiver<()> {
    async fn recv(&mut self) -> Option<()> {
        mpsc::UnboundedReceiver::recv(self).await
    }
}

/// 监听尺寸变化直到会话结束，返回实际转发的次数
pub async fn watch_resize<C: ShellChannel + ?Sized>(
    signal: &mut dyn ResizeSignal,
    terminal: &dyn TerminalControl,
    channel: &C,
    initial: TerminalSize,
    token: &CancellationToken,
) -> usize {
    let mut last = initial;
    let mut forwarded = 0;

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            event = signal.recv() => {
                if event.is_none() {
                    // 通知源已关闭，等待会话结束
                    token.cancelled().await;
                    break;
                }
            }
        }

        let size = match terminal.size() {
            Ok(size) => size,
            Err(e) => {
                warn!("[Terminal] Unable to read terminal size: {}", e);
                continue;
            }
        };
        if size == last {
            continue;
        }

        match channel.resize(size).await {
            Ok(()) => {
                debug!("[SSH] Window resized to {}x{}", size.cols, size.rows);
                last = size;
                forwarded += 1;
            }
            Err(e) => warn!("[SSH] Failed to forward window size: {}", e),
        }
    }

    forwarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeChannel, FakeTerminal};

    #[tokio::test]
    async fn test_duplicate_sizes_are_not_forwarded() {
        let terminal = FakeTerminal::new(TerminalSize::new(24, 80));
        let channel = FakeChannel::new(vec![]);
        let token = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        // 两次通知读到同一尺寸
        terminal.set_size(TerminalSize::new(40, 120));
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        drop(tx);

        let watcher = watch_resize(&mut rx, &terminal, &channel, TerminalSize::new(24, 80), &token);
        let canceller = async {
            tokio::task::yield_now().await;
            token.cancel();
        };
        let (forwarded, _) = tokio::join!(watcher, canceller);

        assert_eq!(forwarded, 1);
        assert_eq!(channel.resizes(), vec![TerminalSize::new(40, 120)]);
    }

    #[tokio::test]
    async fn test_unchanged_size_is_ignored() {
        let terminal = FakeTerminal::new(TerminalSize::new(24, 80));
        let channel = FakeChannel::new(vec![]);
        let token = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(()).unwrap();
        drop(tx);

        let watcher = watch_resize(&mut rx, &terminal, &channel, TerminalSize::new(24, 80), &token);
        let canceller = async {
            tokio::task::yield_now().await;
            token.cancel();
        };
        let (forwarded, _) = tokio::join!(watcher, canceller);

        assert_eq!(forwarded, 0);
        assert!(channel.resizes().is_empty());
    }

    #[tokio::test]
    async fn test_stops_when_cancelled() {
        let terminal = FakeTerminal::new(TerminalSize::default());
        let channel = FakeChannel::new(vec![]);
        let token = CancellationToken::new();
        token.cancel();

        let forwarded = watch_resize(
            &mut NoResize,
            &terminal,
            &channel,
            TerminalSize::default(),
            &token,
        )
        .await;
        assert_eq!(forwarded, 0);
        assert!(channel.resizes().is_empty());
    }
}

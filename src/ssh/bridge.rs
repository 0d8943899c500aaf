// 交互会话桥接
// 连接远端 Shell 与本地控制台：输入、标准输出、标准错误三路转发，
// 同时转发终端尺寸变化，远端 Shell 结束后整体收尾

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::SshClient;
use super::config::SshConfig;
use super::credentials::CredentialResolver;
use super::error::SshError;
use super::resize::{watch_resize, NoResize, OsResizeSignal, ResizeSignal};
use super::session::{PtyRequest, RemoteSession, ShellChannel, ShellEvent};
use crate::models::{ConnectionSettings, Host};
use crate::terminal::{
    Console, ConsoleInput, ConsoleWriter, RawModeGuard, TerminalControl, TerminalSize,
};

/// 一次会话的结果
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// 远端进程退出码（远端未报告时为 None）
    pub exit_status: Option<u32>,
    /// 转发的窗口调整次数
    pub resizes: usize,
}

/// 打开交互会话
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// 运行到会话结束
    async fn launch(&self, host: &Host, console: &mut Console) -> Result<SessionSummary, SshError>;
}

/// 基于 SSH 的会话启动器
pub struct SshBridge {
    settings: ConnectionSettings,
    resolver: CredentialResolver,
    known_hosts_path: Option<PathBuf>,
    terminal: Arc<dyn TerminalControl>,
}

impl SshBridge {
    pub fn new(
        settings: ConnectionSettings,
        resolver: CredentialResolver,
        known_hosts_path: Option<PathBuf>,
        terminal: Arc<dyn TerminalControl>,
    ) -> Self {
        Self {
            settings,
            resolver,
            known_hosts_path,
            terminal,
        }
    }
}

#[async_trait]
impl SessionLauncher for SshBridge {
    async fn launch(&self, host: &Host, console: &mut Console) -> Result<SessionSummary, SshError> {
        // 凭据有问题时不发起任何网络连接
        let auth = self.resolver.resolve(host)?;
        let config = SshConfig::for_host(host, auth, &self.settings, self.known_hosts_path.clone());

        info!("[SSH] Opening session to host #{} ({})", host.id, host.endpoint());
        let session = SshClient::new(config).connect().await?;
        debug!("[SSH] Connected as {}@{}", session.username(), session.host());

        let mut resize: Box<dyn ResizeSignal> = match OsResizeSignal::new() {
            Ok(signal) => Box::new(signal),
            Err(e) => {
                warn!("[Terminal] Window-change notifications unavailable: {}", e);
                Box::new(NoResize)
            }
        };

        attach(
            &session,
            console,
            self.terminal.as_ref(),
            resize.as_mut(),
            &self.settings.term_type,
        )
        .await
    }
}

/// 在已认证的会话上启动 Shell 并转发，直到远端结束
///
/// 本地终端在整个过程中处于 raw 模式，任何返回路径都会恢复原模式。
pub async fn attach<R: RemoteSession>(
    session: &R,
    console: &mut Console,
    terminal: &dyn TerminalControl,
    resize: &mut dyn ResizeSignal,
    term: &str,
) -> Result<SessionSummary, SshError> {
    let _guard = RawModeGuard::enter(terminal)
        .map_err(|e| SshError::Session(format!("cannot enter raw mode: {}", e)))?;

    let size = terminal.size().unwrap_or_else(|e| {
        warn!("[Terminal] Unable to read terminal size, using default: {}", e);
        Default::default()
    });

    let channel = match session.open_shell(PtyRequest::sized(term, size)).await {
        Ok(channel) => channel,
        Err(e) => {
            if let Err(close_err) = session.close().await {
                debug!("[SSH] Close after failed shell request: {}", close_err);
            }
            return Err(e);
        }
    };

    let summary = pump(&channel, console, terminal, resize, size).await;

    if let Err(e) = channel.close().await {
        debug!("[SSH] Channel close: {}", e);
    }
    if let Err(e) = session.close().await {
        debug!("[SSH] Session close: {}", e);
    }
    info!(
        "[SSH] Session ended (exit status {:?}, {} resizes)",
        summary.exit_status, summary.resizes
    );
    Ok(summary)
}

/// 远端输出队列容量，本地终端写得慢时反压远端读取
const OUTPUT_QUEUE: usize = 64;

/// 并发运行各转发循环
///
/// 远端结束、本地输出损坏或转发出错时取消令牌，其余循环随之退出；
/// 本地输入结束时向远端发送 EOF，由远端 Shell 自行退出。
async fn pump<C: ShellChannel>(
    channel: &C,
    console: &mut Console,
    terminal: &dyn TerminalControl,
    resize: &mut dyn ResizeSignal,
    initial: TerminalSize,
) -> SessionSummary {
    let token = CancellationToken::new();
    let (stdout_tx, stdout_rx) = mpsc::channel(OUTPUT_QUEUE);
    let (stderr_tx, stderr_rx) = mpsc::channel(OUTPUT_QUEUE);
    let Console {
        input,
        stdout,
        stderr,
    } = console;

    let (exit_status, (), (), (), resizes) = tokio::join!(
        wait_remote(channel, stdout_tx, stderr_tx, &token),
        copy_input(input, channel, &token),
        copy_output(stdout_rx, stdout, "stdout", &token),
        copy_output(stderr_rx, stderr, "stderr", &token),
        watch_resize(resize, terminal, channel, initial, &token),
    );

    SessionSummary {
        exit_status,
        resizes,
    }
}

/// 读取远端事件，直到通道关闭、出错或会话被取消
async fn wait_remote<C: ShellChannel>(
    channel: &C,
    stdout: mpsc::Sender<Vec<u8>>,
    stderr: mpsc::Sender<Vec<u8>>,
    token: &CancellationToken,
) -> Option<u32> {
    let mut exit_status = None;
    loop {
        let event = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("[SSH] Session cancelled locally");
                break;
            }
            event = channel.read() => event,
        };
        match event {
            // 接收端已退出时丢弃
            Ok(ShellEvent::Stdout(data)) => {
                let _ = stdout.send(data).await;
            }
            Ok(ShellEvent::Stderr(data)) => {
                let _ = stderr.send(data).await;
            }
            Ok(ShellEvent::ExitStatus(code)) => {
                debug!("[SSH] Remote exit status {}", code);
                exit_status = Some(code);
            }
            Ok(ShellEvent::Eof) => debug!("[SSH] Remote sent EOF"),
            Ok(ShellEvent::Closed) => break,
            Err(e) => {
                warn!("[SSH] Session read failed: {}", e);
                break;
            }
        }
    }
    // 发送端在此处 drop，输出循环写完剩余数据后结束
    token.cancel();
    exit_status
}

/// 本地输入 -> 远端标准输入
async fn copy_input<C: ShellChannel>(
    input: &mut ConsoleInput,
    channel: &C,
    token: &CancellationToken,
) {
    loop {
        let chunk = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            chunk = input.next_chunk() => chunk,
        };
        let Some(data) = chunk else {
            break;
        };
        if let Err(e) = channel.write(&data).await {
            warn!("[SSH] Failed to forward input: {}", e);
            token.cancel();
            return;
        }
    }

    debug!("[SSH] Local input closed, sending EOF");
    if let Err(e) = channel.eof().await {
        warn!("[SSH] Failed to send EOF: {}", e);
        token.cancel();
    }
}

/// 远端输出 -> 本地；写入失败时结束整个会话
async fn copy_output(
    mut rx: mpsc::Receiver<Vec<u8>>,
    writer: &mut ConsoleWriter,
    name: &str,
    token: &CancellationToken,
) {
    while let Some(data) = rx.recv().await {
        if let Err(e) = write_flush(writer, &data).await {
            warn!("[SSH] Local {} write failed: {}", name, e);
            token.cancel();
            return;
        }
    }
}

async fn write_flush(writer: &mut ConsoleWriter, data: &[u8]) -> std::io::Result<()> {
    writer.write_all(data).await?;
    writer.flush().await
}

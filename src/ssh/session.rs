// SSH 会话管理
// 连接成功后的会话对象，以及交互式 Shell 通道

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::{ChannelMsg, ChannelReadHalf, ChannelWriteHalf, Disconnect};
use tokio::sync::Mutex;
use tracing::debug;

use super::error::SshError;
use super::handler::SshClientHandler;
use crate::terminal::TerminalSize;

/// PTY 请求参数
#[derive(Clone, Debug)]
pub struct PtyRequest {
    /// 终端类型
    pub term: String,
    /// 列数
    pub col_width: u32,
    /// 行数
    pub row_height: u32,
    /// 终端模式
    pub modes: Vec<(russh::Pty, u32)>,
}

impl PtyRequest {
    /// 按本地终端尺寸构建
    pub fn sized(term: &str, size: TerminalSize) -> Self {
        Self {
            term: term.to_string(),
            col_width: size.cols as u32,
            row_height: size.rows as u32,
            modes: vec![],
        }
    }
}

/// 远端 Shell 产生的事件
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellEvent {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    /// 远端进程退出码
    ExitStatus(u32),
    /// 远端不再发送数据，通道尚未关闭
    Eof,
    /// 通道已关闭
    Closed,
}

/// 交互式 Shell 通道
#[async_trait]
pub trait ShellChannel: Send + Sync {
    /// 写入远端标准输入
    async fn write(&self, data: &[u8]) -> Result<(), SshError>;
    /// 读取下一个事件
    async fn read(&self) -> Result<ShellEvent, SshError>;
    /// 调整远端 PTY 尺寸
    async fn resize(&self, size: TerminalSize) -> Result<(), SshError>;
    /// 通知远端本地输入已结束
    async fn eof(&self) -> Result<(), SshError>;
    async fn close(&self) -> Result<(), SshError>;
}

/// 已认证的远端会话
#[async_trait]
pub trait RemoteSession: Send + Sync {
    type Channel: ShellChannel;

    /// 打开通道、请求 PTY 并启动 Shell
    async fn open_shell(&self, pty: PtyRequest) -> Result<Self::Channel, SshError>;
    /// 关闭连接
    async fn close(&self) -> Result<(), SshError>;
}

/// SSH 会话（连接成功后）
pub struct SshSession {
    /// 共享的 russh Handle
    handle: Arc<Handle<SshClientHandler>>,
    /// 服务器主机名
    host: String,
    /// 用户名
    username: String,
    /// 连接状态
    is_connected: AtomicBool,
}

impl SshSession {
    pub fn new(handle: Arc<Handle<SshClientHandler>>, host: String, username: String) -> Self {
        Self {
            handle,
            host,
            username,
            is_connected: AtomicBool::new(true),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// 检查会话是否活跃
    pub fn is_alive(&self) -> bool {
        self.is_connected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    type Channel = TerminalChannel;

    async fn open_shell(&self, pty: PtyRequest) -> Result<TerminalChannel, SshError> {
        if !self.is_alive() {
            return Err(SshError::Disconnected(
                "Session is disconnected".to_string(),
            ));
        }

        // 打开会话通道
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SshError::Session(format!("failed to open channel: {}", e)))?;

        // 应答到达前收到的数据先缓存，交给后续读取
        let mut pending = VecDeque::new();

        // 请求 PTY
        channel
            .request_pty(
                true,
                &pty.term,
                pty.col_width,
                pty.row_height,
                0,
                0,
                &pty.modes,
            )
            .await
            .map_err(|e| SshError::Session(format!("pty request failed: {}", e)))?;
        wait_reply(&mut channel, "pty", &mut pending).await?;

        // 请求 Shell
        channel
            .request_shell(true)
            .await
            .map_err(|e| SshError::Session(format!("shell request failed: {}", e)))?;
        wait_reply(&mut channel, "shell", &mut pending).await?;

        debug!(
            "[SSH] Shell started on {}@{} ({}x{})",
            self.username, self.host, pty.col_width, pty.row_height
        );
        Ok(TerminalChannel::new(channel, self.handle.clone(), pending))
    }

    async fn close(&self) -> Result<(), SshError> {
        self.is_connected.store(false, Ordering::Relaxed);
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(SshError::from)
    }
}

// 使用 russh::client::Msg 作为消息类型
type RusshChannel = russh::Channel<Msg>;

/// 通道请求的应答
#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Accepted,
    Refused,
    /// 应答之前到达的 Shell 事件
    Event(ShellEvent),
    /// 与应答无关的消息
    Ignored,
}

fn classify_reply(msg: Option<ChannelMsg>) -> Reply {
    match msg {
        Some(ChannelMsg::Success) => Reply::Accepted,
        Some(ChannelMsg::Failure) => Reply::Refused,
        other => match shell_event(other) {
            Some(event) => Reply::Event(event),
            None => Reply::Ignored,
        },
    }
}

/// 等待请求应答，期间的输出事件放入 pending
async fn wait_reply(
    channel: &mut RusshChannel,
    what: &str,
    pending: &mut VecDeque<ShellEvent>,
) -> Result<(), SshError> {
    loop {
        match classify_reply(channel.wait().await) {
            Reply::Accepted => return Ok(()),
            Reply::Refused => {
                return Err(SshError::Session(format!("{} request refused", what)));
            }
            Reply::Event(ShellEvent::Closed) => {
                return Err(SshError::Session(format!(
                    "channel closed before {} reply",
                    what
                )));
            }
            Reply::Event(event) => pending.push_back(event),
            Reply::Ignored => {}
        }
    }
}

/// 通道消息 -> Shell 事件；与字节流无关的消息返回 None
fn shell_event(msg: Option<ChannelMsg>) -> Option<ShellEvent> {
    match msg {
        Some(ChannelMsg::Data { data }) => Some(ShellEvent::Stdout(data.to_vec())),
        Some(ChannelMsg::ExtendedData { data, .. }) => Some(ShellEvent::Stderr(data.to_vec())),
        Some(ChannelMsg::ExitStatus { exit_status }) => Some(ShellEvent::ExitStatus(exit_status)),
        Some(ChannelMsg::Eof) => Some(ShellEvent::Eof),
        Some(ChannelMsg::Close) | None => Some(ShellEvent::Closed),
        Some(_) => None,
    }
}

/// 终端通道
/// 拆分读写两半以避免死锁：
/// - 读：需要 wait()，持有读半部的锁
/// - 写：直接使用 handle.data()
/// - 调整尺寸、EOF、关闭：经写半部发出，不需要锁
pub struct TerminalChannel {
    id: russh::ChannelId,
    handle: Arc<Handle<SshClientHandler>>,
    reader: Mutex<ChannelReadHalf>,
    writer: ChannelWriteHalf<Msg>,
    pending: std::sync::Mutex<VecDeque<ShellEvent>>,
}

impl TerminalChannel {
    fn new(
        channel: RusshChannel,
        handle: Arc<Handle<SshClientHandler>>,
        pending: VecDeque<ShellEvent>,
    ) -> Self {
        let id = channel.id();
        let (reader, writer) = channel.split();
        Self {
            id,
            handle,
            reader: Mutex::new(reader),
            writer,
            pending: std::sync::Mutex::new(pending),
        }
    }

    fn take_pending(&self) -> Option<ShellEvent> {
        self.pending.lock().ok().and_then(|mut queue| queue.pop_front())
    }
}

#[async_trait]
impl ShellChannel for TerminalChannel {
    async fn write(&self, data: &[u8]) -> Result<(), SshError> {
        self.handle
            .data(self.id, data.to_vec().into())
            .await
            .map_err(|_| SshError::Channel("Failed to send data to channel".to_string()))
    }

    async fn read(&self) -> Result<ShellEvent, SshError> {
        if let Some(event) = self.take_pending() {
            return Ok(event);
        }
        let mut reader = self.reader.lock().await;
        loop {
            // 其余消息（窗口调整、请求应答等）不影响字节流
            if let Some(event) = shell_event(reader.wait().await) {
                return Ok(event);
            }
        }
    }

    async fn resize(&self, size: TerminalSize) -> Result<(), SshError> {
        self.writer
            .window_change(size.cols as u32, size.rows as u32, 0, 0)
            .await
            .map_err(|e| SshError::Channel(format!("window-change failed: {}", e)))
    }

    async fn eof(&self) -> Result<(), SshError> {
        self.writer
            .eof()
            .await
            .map_err(|e| SshError::Channel(e.to_string()))
    }

    async fn close(&self) -> Result<(), SshError> {
        self.writer
            .close()
            .await
            .map_err(|e| SshError::Channel(e.to_string()))
    }
}

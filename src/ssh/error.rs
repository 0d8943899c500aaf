// SSH 错误类型定义

use thiserror::Error;

/// SSH 错误类型
#[derive(Debug, Error)]
pub enum SshError {
    /// 配置错误（缺少默认私钥、无法获取家目录等）
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 认证失败或凭据不可用
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// 建立连接失败
    #[error("Connection failed: {0}")]
    Connect(String),

    /// 连接超时
    #[error("Connection timeout after {0}s")]
    Timeout(u64),

    /// 主机密钥校验未通过
    #[error("Host key rejected: {0}")]
    HostKeyRejected(String),

    /// SSH 协议错误
    #[error("SSH protocol error: {0}")]
    Protocol(String),

    /// PTY / Shell 请求失败，或本地终端无法进入 raw 模式
    #[error("Session error: {0}")]
    Session(String),

    /// 通道错误
    #[error("Channel error: {0}")]
    Channel(String),

    /// 会话已断开
    #[error("Session disconnected: {0}")]
    Disconnected(String),
}

impl From<russh::Error> for SshError {
    fn from(e: russh::Error) -> Self {
        SshError::Protocol(e.to_string())
    }
}

impl From<russh::keys::Error> for SshError {
    fn from(_: russh::keys::Error) -> Self {
        SshError::Auth("invalid or encrypted key".to_string())
    }
}

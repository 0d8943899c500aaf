// SSH 连接模块
//
// 模块结构:
// - credentials: 凭据解析 (CredentialResolver, AuthMethod)
// - config: 连接配置 (SshConfig)
// - error: 错误类型 (SshError)
// - handler: russh Handler 实现，主机密钥校验
// - client: SSH 客户端核心
// - session: SSH 会话与 Shell 通道 (SshSession, TerminalChannel)
// - resize: 终端尺寸变化转发
// - bridge: 交互会话桥接 (SshBridge)

pub mod bridge;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handler;
pub mod resize;
pub mod session;

// 公开导出
pub use bridge::{SessionLauncher, SshBridge};
pub use credentials::CredentialResolver;
pub use error::SshError;

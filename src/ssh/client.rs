// SSH 客户端核心实现

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use russh::client::{AuthResult, Handle};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::config::SshConfig;
use super::credentials::AuthMethod;
use super::error::SshError;
use super::handler::{Rejection, SshClientHandler};
use super::session::SshSession;

/// SSH 客户端
/// 负责建立 SSH 连接并返回 SshSession
pub struct SshClient {
    /// 连接配置
    config: SshConfig,
}

impl SshClient {
    /// 创建新的 SSH 客户端
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// 执行连接：解析地址、TCP 连接、握手、认证
    pub async fn connect(&self) -> Result<SshSession, SshError> {
        let endpoint = format!("{}:{}", self.config.host, self.config.port);
        debug!(
            "[SSH] Target: {}@{}",
            self.config.username, endpoint
        );

        let connect_timeout = self.config.connect_timeout();

        // 解析地址
        let addrs: Vec<SocketAddr> =
            timeout(connect_timeout, tokio::net::lookup_host(endpoint.as_str()))
                .await
                .map_err(|_| SshError::Timeout(self.config.connect_timeout))?
                .map_err(|e| SshError::Connect(format!("failed to resolve {}: {}", endpoint, e)))?
                .collect();
        if addrs.is_empty() {
            return Err(SshError::Connect(format!("no address found for {}", endpoint)));
        }

        // TCP 连接：依次尝试解析到的各个地址
        info!("[SSH] Connecting to {} ({} addresses)...", endpoint, addrs.len());
        let tcp_stream = timeout(connect_timeout, connect_any(&addrs))
            .await
            .map_err(|_| SshError::Timeout(self.config.connect_timeout))?
            .map_err(|e| SshError::Connect(e.to_string()))?;

        // SSH 握手
        let rejection: Rejection = Arc::new(Mutex::new(None));
        let handler = SshClientHandler::new(
            endpoint.clone(),
            self.config.host_key_policy,
            self.config.known_hosts_path.clone(),
            rejection.clone(),
        );
        let russh_config = Arc::new(self.config.to_russh_config());

        let handshake = timeout(
            connect_timeout,
            russh::client::connect_stream(russh_config, tcp_stream, handler),
        )
        .await
        .map_err(|_| SshError::Timeout(self.config.connect_timeout))?;

        let mut handle = match handshake {
            Ok(handle) => handle,
            Err(e) => {
                let reason = rejection.lock().ok().and_then(|mut slot| slot.take());
                return Err(match reason {
                    Some(reason) => SshError::HostKeyRejected(reason),
                    None => SshError::from(e),
                });
            }
        };
        debug!("[SSH] Handshake with {} completed", endpoint);

        // 认证
        self.authenticate(&mut handle).await?;
        info!(
            "[SSH] Authenticated as '{}' on {}",
            self.config.username, endpoint
        );

        Ok(SshSession::new(
            Arc::new(handle),
            self.config.host.clone(),
            self.config.username.clone(),
        ))
    }

    /// 依次尝试各认证方式，任一成功即可
    async fn authenticate(&self, handle: &mut Handle<SshClientHandler>) -> Result<(), SshError> {
        if self.config.auth.is_empty() {
            return Err(SshError::Auth("no authentication method available".to_string()));
        }

        let mut last_failure = String::new();
        for method in &self.config.auth {
            debug!("[SSH] Trying {} authentication", method.kind());

            let auth_result = match method {
                AuthMethod::Password(password) => {
                    handle
                        .authenticate_password(&self.config.username, password)
                        .await?
                }
                AuthMethod::PublicKey(key) => {
                    let key_with_alg = russh::keys::PrivateKeyWithHashAlg::new(
                        key.clone(),
                        handle.best_supported_rsa_hash().await?.flatten(),
                    );
                    handle
                        .authenticate_publickey(&self.config.username, key_with_alg)
                        .await?
                }
            };

            match auth_result {
                AuthResult::Success => return Ok(()),
                AuthResult::Failure {
                    remaining_methods,
                    partial_success,
                } => {
                    last_failure = if partial_success {
                        "partial authentication - additional auth required".to_string()
                    } else {
                        format!(
                            "{} authentication rejected. Server suggests: {:?}",
                            method.kind(),
                            remaining_methods
                        )
                    };
                    debug!("[SSH] {}", last_failure);
                }
            }
        }

        Err(SshError::Auth(last_failure))
    }
}

/// 按顺序连接，返回第一个成功的连接；全部失败时返回最后一个错误
async fn connect_any(addrs: &[SocketAddr]) -> io::Result<TcpStream> {
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!("[SSH] TCP connected to {}", addr);
                return Ok(stream);
            }
            Err(e) => {
                warn!("[SSH] Connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address to connect")))
}

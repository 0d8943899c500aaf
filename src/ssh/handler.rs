// SSH 客户端 Handler 实现
// 实现 russh::client::Handler trait

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use russh::keys::PublicKey;
use tracing::{debug, info, warn};

use crate::models::{HostKeyPolicy, KeyCheck};
use crate::services::catalog::now;
use crate::services::storage;

/// 主机密钥被拒绝的原因，由 client 取出后转成错误
pub type Rejection = Arc<Mutex<Option<String>>>;

/// SSH 客户端 Handler
/// 处理 SSH 连接过程中的各种回调
pub struct SshClientHandler {
    /// host:port，known_hosts 中的键
    endpoint: String,
    policy: HostKeyPolicy,
    known_hosts_path: Option<PathBuf>,
    rejection: Rejection,
}

impl SshClientHandler {
    /// 创建新的 Handler
    pub fn new(
        endpoint: String,
        policy: HostKeyPolicy,
        known_hosts_path: Option<PathBuf>,
        rejection: Rejection,
    ) -> Self {
        Self {
            endpoint,
            policy,
            known_hosts_path,
            rejection,
        }
    }

    fn reject(&self, reason: String) {
        warn!("[SSH] {}", reason);
        if let Ok(mut slot) = self.rejection.lock() {
            *slot = Some(reason);
        }
    }
}

impl russh::client::Handler for SshClientHandler {
    type Error = russh::Error;

    /// 检查服务器公钥
    fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        let fingerprint = server_public_key
            .fingerprint(russh::keys::ssh_key::HashAlg::Sha256)
            .to_string();
        let key_type = server_public_key.algorithm().to_string();

        debug!(
            "[SSH] Server key for {}: {} {}",
            self.endpoint, key_type, fingerprint
        );

        let accepted = match verify_host_key(
            self.policy,
            self.known_hosts_path.as_ref(),
            &self.endpoint,
            &key_type,
            &fingerprint,
        ) {
            Ok(()) => true,
            Err(reason) => {
                self.reject(reason);
                false
            }
        };

        async move { Ok(accepted) }
    }
}

/// 按策略校验主机密钥；拒绝时返回原因
pub fn verify_host_key(
    policy: HostKeyPolicy,
    known_hosts_path: Option<&PathBuf>,
    endpoint: &str,
    key_type: &str,
    fingerprint: &str,
) -> Result<(), String> {
    if policy == HostKeyPolicy::AcceptAll {
        return Ok(());
    }

    let Some(path) = known_hosts_path else {
        return Err("no known_hosts file configured".to_string());
    };
    let mut known = storage::load_known_hosts(path).map_err(|e| format!("{:#}", e))?;

    match (known.check(endpoint, fingerprint), policy) {
        (KeyCheck::Match, _) => {
            known.remember(endpoint, key_type, fingerprint, &now());
        }
        (KeyCheck::Unknown, HostKeyPolicy::Tofu) => {
            info!("[SSH] Trusting new host {} ({})", endpoint, fingerprint);
            known.remember(endpoint, key_type, fingerprint, &now());
        }
        (KeyCheck::Unknown, _) => {
            return Err(format!("{} is not in known hosts", endpoint));
        }
        (KeyCheck::Mismatch, _) => {
            return Err(format!(
                "host key for {} changed (now {}), possible man-in-the-middle attack",
                endpoint, fingerprint
            ));
        }
    }

    if let Err(e) = storage::save_known_hosts(path, &known) {
        warn!("[SSH] Failed to update known hosts: {:#}", e);
    }
    Ok(())
}

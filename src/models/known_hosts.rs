// Known Hosts 数据模型
// 用于存储和验证 SSH 服务器公钥指纹

use serde::{Deserialize, Serialize};

/// 已知主机条目
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnownHost {
    /// 主机地址（host:port 格式）
    pub host: String,
    /// 密钥类型（ssh-ed25519, ssh-rsa 等）
    pub key_type: String,
    /// SHA256 指纹
    pub fingerprint: String,
    /// 首次连接时间
    pub first_seen: String,
    /// 最后使用时间
    pub last_used: String,
}

/// Known Hosts 配置
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KnownHostsConfig {
    pub hosts: Vec<KnownHost>,
}

/// 指纹比对结果
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCheck {
    /// 与记录一致
    Match,
    /// 未记录
    Unknown,
    /// 与记录不一致
    Mismatch,
}

impl KnownHostsConfig {
    /// 检查 host:port 的指纹
    pub fn check(&self, host: &str, fingerprint: &str) -> KeyCheck {
        match self.hosts.iter().find(|h| h.host == host) {
            Some(known) if known.fingerprint == fingerprint => KeyCheck::Match,
            Some(_) => KeyCheck::Mismatch,
            None => KeyCheck::Unknown,
        }
    }

    /// 记录新主机，或刷新已记录主机的最后使用时间
    pub fn remember(&mut self, host: &str, key_type: &str, fingerprint: &str, now: &str) {
        if let Some(known) = self.hosts.iter_mut().find(|h| h.host == host) {
            known.last_used = now.to_string();
            return;
        }
        self.hosts.push(KnownHost {
            host: host.to_string(),
            key_type: key_type.to_string(),
            fingerprint: fingerprint.to_string(),
            first_seen: now.to_string(),
            last_used: now.to_string(),
        });
    }
}

// Host 数据结构

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PORT, DEFAULT_USER};

/// 主机记录（持久化用）
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Host {
    /// 由目录分配的编号
    pub id: u32,
    /// 主机名（标签）
    pub name: String,
    /// 地址（域名或 IP）
    pub address: String,
    pub port: u16,
    /// 登录用户
    pub user: String,
    pub password: Option<String>,
    /// 私钥内容或路径（支持 ~/ 开头）
    pub private_key: Option<String>,
    /// 私钥密码，仅在配置了私钥时有意义
    pub key_passphrase: Option<String>,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub last_connected_at: Option<String>,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            address: String::new(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: None,
            private_key: None,
            key_passphrase: None,
            description: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
            last_connected_at: None,
        }
    }
}

impl Host {
    /// 非空密码
    pub fn password(&self) -> Option<&str> {
        non_empty(&self.password)
    }

    /// 非空私钥
    pub fn private_key(&self) -> Option<&str> {
        non_empty(&self.private_key)
    }

    /// 非空私钥密码
    pub fn key_passphrase(&self) -> Option<&str> {
        non_empty(&self.key_passphrase)
    }

    /// host:port
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// 填充缺省端口与用户
    pub fn apply_defaults(&mut self) {
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
        if self.user.trim().is_empty() {
            self.user = DEFAULT_USER.to_string();
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// 凭据永远不进入日志
impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Host")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("private_key", &redact(&self.private_key))
            .field("key_passphrase", &redact(&self.key_passphrase))
            .field("description", &self.description)
            .finish()
    }
}

/// 主机目录文件的根结构
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct HostCatalog {
    pub hosts: Vec<Host>,
}

// 凭据解析
// 根据主机记录决定认证方式：密码优先，其次私钥，最后默认私钥

use std::path::{Path, PathBuf};
use std::sync::Arc;

use russh::keys::PrivateKey;
use tracing::debug;

use super::error::SshError;
use crate::constants::DEFAULT_PRIVATE_KEY;
use crate::models::Host;

/// 认证方式（按顺序尝试）
#[derive(Clone)]
pub enum AuthMethod {
    /// 密码认证
    Password(String),
    /// 公钥认证（已解析的私钥）
    PublicKey(Arc<PrivateKey>),
}

impl AuthMethod {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthMethod::Password(_) => "password",
            AuthMethod::PublicKey(_) => "publickey",
        }
    }
}

// 不输出凭据内容
impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthMethod::{}", self.kind())
    }
}

/// 凭据解析器
#[derive(Clone, Debug)]
pub struct CredentialResolver {
    home: Option<PathBuf>,
}

impl CredentialResolver {
    /// 使用当前用户家目录
    pub fn from_env() -> Self {
        Self {
            home: dirs::home_dir(),
        }
    }

    /// 指定家目录（测试或嵌入使用）
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    fn home(&self) -> Result<&Path, SshError> {
        self.home
            .as_deref()
            .ok_or_else(|| SshError::Config("cannot determine home directory".to_string()))
    }

    /// 解析主机的认证方式
    pub fn resolve(&self, host: &Host) -> Result<Vec<AuthMethod>, SshError> {
        if let Some(password) = host.password() {
            debug!("[SSH] Host #{} uses password authentication", host.id);
            return Ok(vec![AuthMethod::Password(password.to_string())]);
        }

        let material = match host.private_key() {
            Some(key) => self.key_material(key)?,
            None => {
                let path = self.home()?.join(DEFAULT_PRIVATE_KEY);
                debug!("[SSH] Host #{} uses default key {:?}", host.id, path);
                std::fs::read_to_string(&path).map_err(|_| {
                    SshError::Config(format!("no private key found at {}", path.display()))
                })?
            }
        };

        let key = parse_key(&material, host.key_passphrase())?;
        Ok(vec![AuthMethod::PublicKey(Arc::new(key))])
    }

    /// ~/ 开头且文件存在时读取文件，否则把字符串本身当作私钥内容
    fn key_material(&self, key: &str) -> Result<String, SshError> {
        let path = match key.strip_prefix("~/") {
            Some(rest) => Some(self.home()?.join(rest)),
            None => None,
        };

        match path {
            Some(path) if path.exists() => {
                debug!("[SSH] Loading private key from {:?}", path);
                std::fs::read_to_string(&path).map_err(|e| {
                    SshError::Auth(format!("failed to read key file {}: {}", path.display(), e))
                })
            }
            _ => Ok(key.to_string()),
        }
    }
}

fn parse_key(material: &str, passphrase: Option<&str>) -> Result<PrivateKey, SshError> {
    russh::keys::decode_secret_key(material, passphrase).map_err(SshError::from)
}

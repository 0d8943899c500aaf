// SSH 连接配置

use std::path::PathBuf;
use std::time::Duration;

use super::credentials::AuthMethod;
use crate::models::{ConnectionSettings, Host, HostKeyPolicy};

/// SSH 连接配置
#[derive(Clone, Debug)]
pub struct SshConfig {
    /// 目标主机
    pub host: String,
    /// 端口
    pub port: u16,
    /// 用户名
    pub username: String,
    /// 认证方式，按顺序尝试
    pub auth: Vec<AuthMethod>,
    /// 连接超时（秒）
    pub connect_timeout: u64,
    /// 心跳配置
    pub keepalive: KeepaliveConfig,
    /// 主机密钥校验策略
    pub host_key_policy: HostKeyPolicy,
    /// known_hosts 文件
    pub known_hosts_path: Option<PathBuf>,
}

/// 心跳配置
#[derive(Clone, Debug)]
pub struct KeepaliveConfig {
    /// 是否启用心跳
    pub enabled: bool,
    /// 心跳间隔（秒）
    pub interval: u64,
    /// 最大重试次数
    pub max_retries: u32,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 60,
            max_retries: 3,
        }
    }
}

impl SshConfig {
    /// 从主机记录与连接设置构建
    pub fn for_host(
        host: &Host,
        auth: Vec<AuthMethod>,
        settings: &ConnectionSettings,
        known_hosts_path: Option<PathBuf>,
    ) -> Self {
        Self {
            host: host.address.clone(),
            port: host.port,
            username: host.user.clone(),
            auth,
            connect_timeout: settings.connect_timeout_secs.max(1),
            keepalive: KeepaliveConfig {
                enabled: settings.keepalive_interval_secs > 0,
                interval: settings.keepalive_interval_secs,
                max_retries: 3,
            },
            host_key_policy: settings.host_key_policy,
            known_hosts_path,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// 构建 russh 配置
    pub fn to_russh_config(&self) -> russh::client::Config {
        let mut config = russh::client::Config::default();
        // 交互会话可以长时间空闲，不设置不活动超时，由心跳探测断线
        config.inactivity_timeout = None;
        if self.keepalive.enabled {
            config.keepalive_interval = Some(Duration::from_secs(self.keepalive.interval));
            config.keepalive_max = self.keepalive.max_retries as usize;
        }
        config
    }
}

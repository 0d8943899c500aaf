// Settings 配置数据结构

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TERM;

// ======================== 主配置结构 ========================

/// 应用设置（持久化用）
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    pub connection: ConnectionSettings,
    pub matching: MatchSettings,
    pub logging: LogSettings,
    pub catalog: CatalogSettings,
}

// ======================== 连接设置 ========================

/// 主机密钥校验策略
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// 不校验（与历史行为一致）
    #[default]
    AcceptAll,
    /// 首次连接时记录，之后校验
    Tofu,
    /// 仅接受已记录的主机
    Strict,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// TCP 连接与握手超时（秒）
    pub connect_timeout_secs: u64,
    /// 心跳间隔（秒），0 表示关闭
    pub keepalive_interval_secs: u64,
    /// 远端 PTY 终端类型
    pub term_type: String,
    pub host_key_policy: HostKeyPolicy,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 1,
            keepalive_interval_secs: 60,
            term_type: DEFAULT_TERM.to_string(),
            host_key_policy: HostKeyPolicy::AcceptAll,
        }
    }
}

// ======================== 匹配设置 ========================

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MatchSettings {
    /// 模糊搜索是否区分大小写（精确匹配始终区分）
    pub case_sensitive: bool,
}

// ======================== 日志设置 ========================

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    /// 日志文件路径，缺省写入配置目录
    pub file: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// ======================== 目录设置 ========================

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CatalogSettings {
    /// 主机目录文件路径，缺省位于配置目录
    pub path: Option<String>,
}

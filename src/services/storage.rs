// 本地数据持久化服务

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_DIR, CONFIG_DIR_ENV, HOSTS_FILE, KNOWN_HOSTS_FILE, LOG_FILE, SETTINGS_FILE,
};
use crate::models::{AppSettings, KnownHostsConfig};

/// 获取配置目录路径
/// 优先使用 $JUMP_CONFIG_DIR，否则：
/// macOS: ~/Library/Application Support/jump
/// Linux: ~/.config/jump
/// Windows: C:\Users\<用户名>\AppData\Roaming\jump
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::config_dir()
            .context("无法获取系统配置目录")?
            .join(APP_DIR),
    };
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir).context("无法创建配置目录")?;
    }
    Ok(config_dir)
}

/// 主机目录文件路径（可被设置覆盖）
pub fn get_hosts_file(settings: &AppSettings) -> Result<PathBuf> {
    match &settings.catalog.path {
        Some(path) => Ok(expand_home(path)),
        None => Ok(get_config_dir()?.join(HOSTS_FILE)),
    }
}

/// 日志文件路径（可被设置覆盖）
pub fn get_log_file(settings: &AppSettings) -> Result<PathBuf> {
    match &settings.logging.file {
        Some(path) => Ok(expand_home(path)),
        None => Ok(get_config_dir()?.join(LOG_FILE)),
    }
}

pub fn get_known_hosts_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(KNOWN_HOSTS_FILE))
}

// ======================== Settings 配置持久化 ========================

pub fn get_settings_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(SETTINGS_FILE))
}

/// 加载应用设置
pub fn load_settings() -> Result<AppSettings> {
    load_settings_from(&get_settings_file()?)
}

pub fn load_settings_from(path: &Path) -> Result<AppSettings> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let content = fs::read_to_string(path).context("无法读取设置配置文件")?;
    let settings: AppSettings = serde_json::from_str(&content).context("无法解析设置配置文件")?;
    Ok(settings)
}

// ======================== Known Hosts 持久化 ========================

/// 加载已知主机，文件不存在时返回空配置
pub fn load_known_hosts(path: &Path) -> Result<KnownHostsConfig> {
    if !path.exists() {
        return Ok(KnownHostsConfig::default());
    }
    let content = fs::read_to_string(path).context("无法读取 known_hosts 文件")?;
    let config: KnownHostsConfig =
        serde_json::from_str(&content).context("无法解析 known_hosts 文件")?;
    Ok(config)
}

pub fn save_known_hosts(path: &Path, config: &KnownHostsConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("无法创建 known_hosts 目录")?;
    }
    let content = serde_json::to_string_pretty(config).context("无法序列化 known_hosts")?;
    fs::write(path, content).context("无法写入 known_hosts 文件")?;
    Ok(())
}

/// 展开 ~/ 前缀；无法获取家目录时原样返回
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

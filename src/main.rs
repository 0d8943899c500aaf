// jump - 本地版跳板机
// 应用入口

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod constants;
mod dispatcher;
mod models;
mod services;
mod ssh;
mod terminal;

#[cfg(test)]
mod test_utils;

use dispatcher::Dispatcher;
use models::AppSettings;
use services::{storage, JsonCatalog};
use ssh::{CredentialResolver, SshBridge};
use terminal::{Console, CrosstermTerminal};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[App] Fatal: {:#}", e);
            eprintln!("jump: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let settings = storage::load_settings()?;
    init_logging(&settings);
    info!("[App] Starting jump {}", env!("CARGO_PKG_VERSION"));

    // 终端无法进入 raw 模式时无法承载会话，直接退出
    let terminal = CrosstermTerminal;
    terminal
        .probe()
        .context("当前终端不支持 raw 模式")?;

    let hosts_file = storage::get_hosts_file(&settings)?;
    let catalog = JsonCatalog::open(&hosts_file)
        .with_context(|| format!("无法打开主机目录: {}", hosts_file.display()))?
        .with_case_sensitive(settings.matching.case_sensitive);
    info!("[App] Catalog: {:?}", catalog.path());

    let known_hosts = match storage::get_known_hosts_file() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("[App] Known hosts file unavailable: {:#}", e);
            None
        }
    };
    let bridge = SshBridge::new(
        settings.connection.clone(),
        CredentialResolver::from_env(),
        known_hosts,
        Arc::new(terminal),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("jump-worker")
        .build()
        .context("无法创建异步运行时")?;

    runtime.block_on(async {
        let mut console = Console::stdio().context("无法打开标准输入")?;
        let mut dispatcher = Dispatcher::new(catalog, bridge);
        dispatcher
            .run(&mut console)
            .await
            .context("终端读写失败")
    })?;

    info!("[App] Bye");
    Ok(())
}

/// 初始化日志：写入日志文件，打不开时退回标准错误
/// RUST_LOG 优先于设置中的级别，例如：RUST_LOG=debug jump
fn init_logging(settings: &AppSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false); // 不显示 target（模块路径）

    match open_log_file(settings) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(e) => {
            builder.with_writer(std::io::stderr).init();
            warn!("[App] Logging to stderr: {:#}", e);
        }
    }
}

fn open_log_file(settings: &AppSettings) -> Result<std::fs::File> {
    let path: PathBuf = storage::get_log_file(settings)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("无法创建日志目录")?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("无法打开日志文件: {}", path.display()))
}

// 命令分发
// 两种模式：浏览（搜索、登录）与管理（增删改主机）

use std::io;

use tracing::{debug, info, warn};

use crate::constants::{CLEAR_SCREEN, DEFAULT_PORT, PROMPT};
use crate::models::Host;
use crate::services::matcher::{list_by_keyword, match_hosts};
use crate::services::{CatalogStore, StoreError};
use crate::ssh::SessionLauncher;
use crate::terminal::{render, Console};

/// 分发模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Edit,
}

/// 处理一行输入后是否继续
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Dispatcher<S, L> {
    store: S,
    launcher: L,
    mode: Mode,
}

impl<S: CatalogStore, L: SessionLauncher> Dispatcher<S, L> {
    pub fn new(store: S, launcher: L) -> Self {
        Self {
            store,
            launcher,
            mode: Mode::Browse,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// 显示欢迎语后循环读取命令，直到退出或输入结束
    pub async fn run(&mut self, console: &mut Console) -> io::Result<()> {
        console.write_str(&render::banner()).await?;
        loop {
            console.write_str(PROMPT).await?;
            let Some(line) = console.read_line().await else {
                debug!("[Dispatch] End of input");
                console.write_str("\n").await?;
                return Ok(());
            };
            if self.dispatch(&line, console).await? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// 处理一行命令
    pub async fn dispatch(&mut self, line: &str, console: &mut Console) -> io::Result<Flow> {
        let cmd = line.trim();
        debug!("[Dispatch] {:?} <- {:?}", self.mode(), cmd);
        match self.mode() {
            Mode::Browse => self.browse(cmd, console).await,
            Mode::Edit => {
                self.edit(cmd, console).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn browse(&mut self, cmd: &str, console: &mut Console) -> io::Result<Flow> {
        match cmd {
            "" | "p" => self.list(console, "").await?,
            "m" => {
                console.write_str(&render::edit_menu()).await?;
                self.mode = Mode::Edit;
            }
            "h" => console.write_str(&render::main_menu()).await?,
            "q" => return Ok(Flow::Quit),
            "c" => console.write_str(CLEAR_SCREEN).await?,
            _ => match cmd.strip_prefix('/') {
                Some(keyword) => self.list(console, keyword.trim()).await?,
                None => self.jump(console, cmd).await?,
            },
        }
        Ok(Flow::Continue)
    }

    async fn list(&self, console: &mut Console, keyword: &str) -> io::Result<()> {
        match list_by_keyword(&self.store, keyword) {
            Ok(hosts) => console.write_str(&render::host_table(&hosts)).await,
            Err(e) => console.write_str(&render::error_line(&e.to_string())).await,
        }
    }

    /// 唯一命中则登录，多个则列出
    async fn jump(&self, console: &mut Console, keyword: &str) -> io::Result<()> {
        let hosts = match match_hosts(&self.store, keyword) {
            Ok(hosts) => hosts,
            Err(e) => return console.write_str(&render::error_line(&e.to_string())).await,
        };

        match hosts.as_slice() {
            [] => {
                let message = format!("未找到匹配的主机: {}", keyword);
                console.write_str(&render::error_line(&message)).await
            }
            [host] => self.connect(console, host).await,
            _ => console.write_str(&render::host_table(&hosts)).await,
        }
    }

    async fn connect(&self, console: &mut Console, host: &Host) -> io::Result<()> {
        info!("[Dispatch] Connecting to host #{} ({})", host.id, host.name);
        match self.launcher.launch(host, console).await {
            Ok(summary) => {
                debug!("[Dispatch] Session summary: {:?}", summary);
                if let Err(e) = self.store.mark_connected(host.id) {
                    warn!("[Dispatch] Failed to record connection time: {}", e);
                }
                console.write_str("\n").await
            }
            Err(e) => {
                warn!("[Dispatch] Session to host #{} failed: {}", host.id, e);
                let message = format!("连接 {} 失败: {}", host.endpoint(), e);
                console.write_str(&render::error_line(&message)).await
            }
        }
    }

    async fn edit(&mut self, cmd: &str, console: &mut Console) -> io::Result<()> {
        match cmd {
            "a" => self.add_host(console).await,
            "d" => self.delete_host(console).await,
            "u" => self.update_host(console).await,
            "q" => {
                self.mode = Mode::Browse;
                console.write_str(&render::main_menu()).await
            }
            _ => console.write_str(&render::edit_menu()).await,
        }
    }

    async fn add_host(&self, console: &mut Console) -> io::Result<()> {
        let Some(host) = scan_host(console, Host::default(), false).await? else {
            return Ok(());
        };
        match self.store.create(host) {
            Ok(host) => {
                info!("[Dispatch] Added host #{} ({})", host.id, host.name);
                console
                    .write_str(&format!("添加成功，主机ID: {}\n", host.id))
                    .await
            }
            Err(e) => report(console, "添加失败", &e).await,
        }
    }

    async fn delete_host(&self, console: &mut Console) -> io::Result<()> {
        let Some(id) = scan_id(console).await? else {
            return Ok(());
        };
        match self.store.delete(id) {
            Ok(()) => {
                info!("[Dispatch] Deleted host #{}", id);
                console.write_str("删除成功\n").await
            }
            Err(e) => report(console, "删除失败", &e).await,
        }
    }

    async fn update_host(&self, console: &mut Console) -> io::Result<()> {
        let Some(id) = scan_id(console).await? else {
            return Ok(());
        };
        let current = match self.store.get(id) {
            Ok(host) => host,
            Err(e @ StoreError::NotFound(_)) => return report(console, "输入的ID有误", &e).await,
            Err(e) => return report(console, "查找失败", &e).await,
        };

        let Some(host) = scan_host(console, current, true).await? else {
            return Ok(());
        };
        match self.store.update(host) {
            Ok(()) => {
                info!("[Dispatch] Updated host #{}", id);
                console.write_str("更新成功\n").await
            }
            Err(e) => report(console, "更新失败", &e).await,
        }
    }
}

async fn report(console: &mut Console, action: &str, err: &StoreError) -> io::Result<()> {
    warn!("[Dispatch] {}: {}", action, err);
    console
        .write_str(&render::error_line(&format!("{}: {}", action, err)))
        .await
}

/// 读取主机 ID；格式错误时提示并返回 None
async fn scan_id(console: &mut Console) -> io::Result<Option<u32>> {
    let Some(answer) = console.prompt("请输入主机ID").await? else {
        return Ok(None);
    };
    match answer.parse() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            let message = format!("输入的ID有误: {}", answer);
            console.write_str(&render::error_line(&message)).await?;
            Ok(None)
        }
    }
}

/// 提示标签；更新时附带当前值，密文只提示已设置
fn label(tip: &str, current: Option<&str>, secret: bool) -> String {
    match current {
        Some(value) if !value.is_empty() => {
            let shown = if secret { "已设置" } else { value };
            format!("{} [{}]", tip, shown)
        }
        _ => tip.to_string(),
    }
}

/// 读取一个字段；空回答沿用当前值。输入结束返回 None
async fn scan_field(
    console: &mut Console,
    tip: &str,
    current: Option<&str>,
    secret: bool,
    show_current: bool,
) -> io::Result<Option<String>> {
    let shown = if show_current { current } else { None };
    let Some(answer) = console.prompt(&label(tip, shown, secret)).await? else {
        return Ok(None);
    };
    if answer.is_empty() {
        return Ok(Some(current.unwrap_or_default().to_string()));
    }
    Ok(Some(answer))
}

/// 必填字段，空值时重复提示
async fn scan_required(
    console: &mut Console,
    tip: &str,
    current: &str,
    show_current: bool,
) -> io::Result<Option<String>> {
    loop {
        match scan_field(console, tip, Some(current), false, show_current).await? {
            None => return Ok(None),
            Some(value) if !value.is_empty() => return Ok(Some(value)),
            Some(_) => continue,
        }
    }
}

fn optional(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// 逐项读取主机字段
///
/// 新增时以缺省值为起点；更新时以现有记录为起点并显示当前值。
/// 任何一步遇到输入结束都放弃本次编辑。
async fn scan_host(
    console: &mut Console,
    mut host: Host,
    updating: bool,
) -> io::Result<Option<Host>> {
    macro_rules! field {
        ($expr:expr) => {
            match $expr.await? {
                Some(value) => value,
                None => return Ok(None),
            }
        };
    }

    host.name = field!(scan_required(console, "请输入主机名称", &host.name, updating));
    host.address = field!(scan_required(console, "请输入主机ip", &host.address, updating));

    let port_tip = if updating {
        "请输入主机端口".to_string()
    } else {
        format!("请输入主机端口({})", DEFAULT_PORT)
    };
    let port = host.port.to_string();
    let answer = field!(scan_field(console, &port_tip, Some(&port), false, updating));
    host.port = match answer.parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => DEFAULT_PORT,
    };

    let user_tip = if updating {
        "请输入登录用户名"
    } else {
        "请输入登录用户名(root)"
    };
    host.user = field!(scan_field(console, user_tip, Some(&host.user), false, updating));

    let password = field!(scan_field(
        console,
        "请输入登录密码(不填则使用私钥登录)",
        host.password.as_deref(),
        true,
        updating
    ));
    host.password = optional(password);

    // 只有不使用密码时才询问私钥，只有提供了私钥才询问私钥密码
    if host.password.is_none() {
        let key = field!(scan_field(
            console,
            "请输入私钥(不填则使用默认私钥)",
            host.private_key.as_deref(),
            true,
            updating
        ));
        host.private_key = optional(key);

        if host.private_key.is_some() {
            let passphrase = field!(scan_field(
                console,
                "请输入私钥密码",
                host.key_passphrase.as_deref(),
                true,
                updating
            ));
            host.key_passphrase = optional(passphrase);
        } else {
            host.key_passphrase = None;
        }
    }

    host.description = field!(scan_field(
        console,
        "请输入主机描述",
        Some(&host.description),
        false,
        updating
    ));

    host.apply_defaults();
    Ok(Some(host))
}

// 全局常量

/// 应用目录名（位于系统配置目录下）
pub const APP_DIR: &str = "jump";

/// 覆盖配置目录的环境变量
pub const CONFIG_DIR_ENV: &str = "JUMP_CONFIG_DIR";

pub const HOSTS_FILE: &str = "hosts.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const KNOWN_HOSTS_FILE: &str = "known_hosts.json";
pub const LOG_FILE: &str = "jump.log";

/// 主机默认值
pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_USER: &str = "root";

/// 默认私钥（相对用户家目录）
pub const DEFAULT_PRIVATE_KEY: &str = ".ssh/id_rsa";

/// 远端 PTY 终端类型
pub const DEFAULT_TERM: &str = "xterm-256color";

/// 时间戳格式
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 命令提示符
pub const PROMPT: &str = "Opt> ";

/// 清屏控制序列
pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

pub mod menu {
    /// 主菜单：(指令, 说明)
    pub const MAIN: &[(&str, &str)] = &[
        ("ID", "直接登录"),
        ("部分IP、主机名、备注", "进行搜索登录(如果唯一)"),
        ("/ + IP、主机名或备注", "进行搜索，如：/192.168"),
        ("p", "显示主机列表"),
        ("m", "进行主机管理"),
        ("h", "显示帮助"),
        ("q", "退出"),
        ("c", "清屏"),
    ];

    /// 主机管理菜单
    pub const EDIT: &[(&str, &str)] = &[
        ("a", "添加主机"),
        ("d", "删除主机"),
        ("u", "更新主机"),
        ("q", "返回上级"),
    ];
}

// 本地终端控制：尺寸查询与 raw 模式切换

use std::io;

use tracing::{debug, warn};

/// 终端尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

impl TerminalSize {
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

/// 终端能力
pub trait TerminalControl: Send + Sync {
    /// 当前尺寸
    fn size(&self) -> io::Result<TerminalSize>;
    /// 是否处于 raw 模式
    fn is_raw(&self) -> io::Result<bool>;
    fn set_raw(&self, raw: bool) -> io::Result<()>;
}

/// 基于 crossterm 的进程终端
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermTerminal;

impl CrosstermTerminal {
    /// 启动检查：终端必须能进入并退出 raw 模式
    pub fn probe(&self) -> io::Result<()> {
        let was_raw = self.is_raw()?;
        self.set_raw(true)?;
        self.set_raw(was_raw)
    }
}

impl TerminalControl for CrosstermTerminal {
    fn size(&self) -> io::Result<TerminalSize> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok(TerminalSize::new(rows, cols))
    }

    fn is_raw(&self) -> io::Result<bool> {
        crossterm::terminal::is_raw_mode_enabled()
    }

    fn set_raw(&self, raw: bool) -> io::Result<()> {
        if raw {
            crossterm::terminal::enable_raw_mode()
        } else {
            crossterm::terminal::disable_raw_mode()
        }
    }
}

/// raw 模式守卫：进入时记录原模式，drop 时恢复
pub struct RawModeGuard<'a> {
    terminal: &'a dyn TerminalControl,
    previous: bool,
}

impl<'a> RawModeGuard<'a> {
    pub fn enter(terminal: &'a dyn TerminalControl) -> io::Result<Self> {
        let previous = terminal.is_raw()?;
        if !previous {
            terminal.set_raw(true)?;
        }
        debug!("[Terminal] Raw mode on (previous raw={})", previous);
        Ok(Self { terminal, previous })
    }
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        if self.previous {
            return;
        }
        if let Err(e) = self.terminal.set_raw(false) {
            warn!("[Terminal] Failed to restore terminal mode: {}", e);
        } else {
            debug!("[Terminal] Raw mode off");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeTerminal;

    #[test]
    fn test_guard_restores_cooked_mode() {
        let terminal = FakeTerminal::new(TerminalSize::default());
        {
            let _guard = RawModeGuard::enter(&terminal).unwrap();
            assert!(terminal.is_raw().unwrap());
        }
        assert!(!terminal.is_raw().unwrap());
    }

    #[test]
    fn test_guard_keeps_raw_mode_when_already_raw() {
        let terminal = FakeTerminal::new(TerminalSize::default());
        terminal.set_raw(true).unwrap();
        drop(RawModeGuard::enter(&terminal).unwrap());
        assert!(terminal.is_raw().unwrap());
    }

    #[test]
    fn test_guard_fails_when_raw_mode_unavailable() {
        let terminal = FakeTerminal::new(TerminalSize::default()).without_raw_mode();
        assert!(RawModeGuard::enter(&terminal).is_err());
        assert!(!terminal.is_raw().unwrap());
    }

    #[test]
    fn test_default_size() {
        assert_eq!(TerminalSize::default(), TerminalSize::new(24, 80));
    }
}

// 文本渲染：欢迎语、菜单、主机表格、错误提示

use std::fmt::Write as _;

use crossterm::style::Stylize;
use unicode_width::UnicodeWidthStr;

use crate::constants::menu;
use crate::models::Host;

const TABLE_HEADER: [&str; 4] = ["序号", "主机名", "IP", "说明"];

/// 欢迎语 + 主菜单
pub fn banner() -> String {
    let mut out = format!("\t\t{}\n\n", "你好，欢迎使用jump".green().bold());
    out.push_str(&main_menu());
    out
}

pub fn main_menu() -> String {
    render_menu(menu::MAIN, |s| s.green().bold().to_string())
}

/// 主机管理菜单
pub fn edit_menu() -> String {
    render_menu(menu::EDIT, |s| s.yellow().bold().to_string())
}

fn render_menu(items: &[(&str, &str)], paint: impl Fn(&str) -> String) -> String {
    let mut out = String::new();
    for (i, (instruction, help)) in items.iter().enumerate() {
        let _ = writeln!(out, "\t{}) 输入 {} {}.", i + 1, paint(instruction), help);
    }
    out
}

/// 单行错误提示
pub fn error_line(message: &str) -> String {
    format!("{}\n", message.red())
}

/// 主机表格；无主机时返回空串
pub fn host_table(hosts: &[Host]) -> String {
    if hosts.is_empty() {
        return String::new();
    }

    let rows: Vec<[String; 4]> = hosts
        .iter()
        .map(|h| {
            [
                h.id.to_string(),
                h.name.clone(),
                h.endpoint(),
                h.description.clone(),
            ]
        })
        .collect();

    // 列宽按显示宽度计算，中文占两列
    let mut widths = TABLE_HEADER.map(UnicodeWidthStr::width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let border = {
        let mut line = String::from("+");
        for width in widths {
            line.push_str(&"-".repeat(width + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };

    let mut out = border.clone();
    out.push_str(&render_row(&TABLE_HEADER.map(String::from), &widths, false));
    out.push_str(&border);
    for row in &rows {
        out.push_str(&render_row(row, &widths, true));
    }
    out.push_str(&border);
    out
}

fn render_row(cells: &[String; 4], widths: &[usize; 4], highlight_id: bool) -> String {
    let mut line = String::from("|");
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        let padding = " ".repeat(width - cell.width());
        let text = if i == 0 && highlight_id {
            cell.as_str().yellow().to_string()
        } else {
            cell.clone()
        };
        let _ = write!(line, " {}{} |", text, padding);
    }
    line.push('\n');
    line
}

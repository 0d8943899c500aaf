// Terminal 模块 - 本地终端控制、控制台读写与文本渲染

mod console;
mod control;
pub mod render;

pub use console::*;
pub use control::*;

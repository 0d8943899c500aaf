// 控制台句柄
// 标准输入由专用线程读取后送入通道，提示符循环与远端会话轮流消费，
// 会话结束后不会遗留仍在读取标准输入的任务

use std::io::{self, Read};
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

/// 输出端
pub type ConsoleWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// 输入端：原始字节块，以及读行时多读出的剩余部分
pub struct ConsoleInput {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: Vec<u8>,
}

impl ConsoleInput {
    pub fn new(rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            rx,
            pending: Vec::new(),
        }
    }

    /// 下一块输入；先交出缓存的剩余字节。None 表示输入已结束
    pub async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        if !self.pending.is_empty() {
            return Some(std::mem::take(&mut self.pending));
        }
        self.rx.recv().await
    }

    /// 读取一行（不含换行符）；输入结束且没有剩余内容时返回 None
    pub async fn read_line(&mut self) -> Option<String> {
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let rest = self.pending.split_off(pos + 1);
                let line = std::mem::replace(&mut self.pending, rest);
                return Some(decode_line(&line));
            }
            match self.rx.recv().await {
                Some(chunk) => self.pending.extend_from_slice(&chunk),
                None if self.pending.is_empty() => return None,
                None => {
                    let line = std::mem::take(&mut self.pending);
                    return Some(decode_line(&line));
                }
            }
        }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// 控制台：输入 + 标准输出 + 标准错误
pub struct Console {
    pub input: ConsoleInput,
    pub stdout: ConsoleWriter,
    pub stderr: ConsoleWriter,
}

impl Console {
    /// 进程的标准输入输出
    pub fn stdio() -> io::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::Builder::new()
            .name("jump-stdin".to_string())
            .spawn(move || pump_stdin(tx))?;

        Ok(Self::from_parts(
            rx,
            Box::pin(tokio::io::stdout()),
            Box::pin(tokio::io::stderr()),
        ))
    }

    pub fn from_parts(
        rx: mpsc::UnboundedReceiver<Vec<u8>>,
        stdout: ConsoleWriter,
        stderr: ConsoleWriter,
    ) -> Self {
        Self {
            input: ConsoleInput::new(rx),
            stdout,
            stderr,
        }
    }

    pub async fn read_line(&mut self) -> Option<String> {
        self.input.read_line().await
    }

    /// 写入标准输出并立即刷新
    pub async fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.stdout.write_all(text.as_bytes()).await?;
        self.stdout.flush().await
    }

    /// 输出提示并读取一行回答（去掉首尾空白）
    pub async fn prompt(&mut self, tip: &str) -> io::Result<Option<String>> {
        self.write_str(&format!("{}: ", tip)).await?;
        Ok(self.read_line().await.map(|line| line.trim().to_string()))
    }
}

fn pump_stdin(tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut stdin = io::stdin();
    let mut buf = [0u8; 4096];
    loop {
        match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("[Console] stdin closed: {}", e);
                break;
            }
        }
    }
    debug!("[Console] stdin pump stopped");
}

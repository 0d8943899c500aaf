// 主机目录存储
// 整个目录保存为一个 JSON 文件，每次操作读-改-写

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::constants::TIME_FORMAT;
use crate::models::{Host, HostCatalog};

/// 目录错误类型
#[derive(Debug, Error)]
pub enum StoreError {
    /// 记录不存在
    #[error("host #{0} not found")]
    NotFound(u32),

    #[error("catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog file is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("catalog configuration error: {0}")]
    Config(String),
}

/// 主机目录接口
pub trait CatalogStore: Send + Sync {
    /// 全部主机
    fn list(&self) -> Result<Vec<Host>, StoreError>;
    /// id、主机名或地址与关键字完全相等
    fn find_exact(&self, keyword: &str) -> Result<Vec<Host>, StoreError>;
    /// id、主机名、地址或说明包含关键字
    fn find_fuzzy(&self, keyword: &str) -> Result<Vec<Host>, StoreError>;
    /// 新增主机，返回带 id 的记录
    fn create(&self, host: Host) -> Result<Host, StoreError>;
    fn update(&self, host: Host) -> Result<(), StoreError>;
    fn delete(&self, id: u32) -> Result<(), StoreError>;
    fn get(&self, id: u32) -> Result<Host, StoreError>;
    /// 记录最后连接时间
    fn mark_connected(&self, id: u32) -> Result<(), StoreError>;
}

pub(crate) fn now() -> String {
    chrono::Local::now().format(TIME_FORMAT).to_string()
}

/// 精确匹配规则（始终区分大小写）；编号按数值比较，"01" 即 1 号
pub fn is_exact_match(host: &Host, keyword: &str) -> bool {
    keyword.parse::<u32>().is_ok_and(|id| id == host.id)
        || host.name == keyword
        || host.address == keyword
}

/// 模糊匹配规则
pub fn is_fuzzy_match(host: &Host, keyword: &str, case_sensitive: bool) -> bool {
    let fields = [
        host.id.to_string(),
        host.name.clone(),
        host.address.clone(),
        host.description.clone(),
    ];
    if case_sensitive {
        fields.iter().any(|f| f.contains(keyword))
    } else {
        let keyword = keyword.to_lowercase();
        fields.iter().any(|f| f.to_lowercase().contains(&keyword))
    }
}

/// 基于 JSON 文件的主机目录
pub struct JsonCatalog {
    path: PathBuf,
    case_sensitive: bool,
}

impl JsonCatalog {
    /// 打开目录文件；文件不存在时创建空目录
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let catalog = Self {
            path: path.into(),
            case_sensitive: false,
        };
        if catalog.path.is_dir() {
            return Err(StoreError::Config(format!(
                "{} is a directory",
                catalog.path.display()
            )));
        }
        if !catalog.path.exists() {
            if let Some(parent) = catalog.path.parent() {
                fs::create_dir_all(parent)?;
            }
            catalog.save(&HostCatalog::default())?;
        }
        // 尽早发现损坏的文件
        catalog.load()?;
        Ok(catalog)
    }

    /// 模糊搜索是否区分大小写
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HostCatalog, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HostCatalog::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, catalog: &HostCatalog) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(catalog)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn filter(&self, predicate: impl Fn(&Host) -> bool) -> Result<Vec<Host>, StoreError> {
        Ok(self
            .load()?
            .hosts
            .into_iter()
            .filter(|h| predicate(h))
            .collect())
    }
}

impl CatalogStore for JsonCatalog {
    fn list(&self) -> Result<Vec<Host>, StoreError> {
        self.filter(|_| true)
    }

    fn find_exact(&self, keyword: &str) -> Result<Vec<Host>, StoreError> {
        self.filter(|h| is_exact_match(h, keyword))
    }

    fn find_fuzzy(&self, keyword: &str) -> Result<Vec<Host>, StoreError> {
        self.filter(|h| is_fuzzy_match(h, keyword, self.case_sensitive))
    }

    fn create(&self, mut host: Host) -> Result<Host, StoreError> {
        let mut catalog = self.load()?;
        host.id = catalog.hosts.iter().map(|h| h.id).max().unwrap_or(0) + 1;
        host.created_at = now();
        host.updated_at = host.created_at.clone();
        catalog.hosts.push(host.clone());
        self.save(&catalog)?;
        debug!("[Catalog] Created host #{}", host.id);
        Ok(host)
    }

    fn update(&self, mut host: Host) -> Result<(), StoreError> {
        let mut catalog = self.load()?;
        let Some(pos) = catalog.hosts.iter().position(|h| h.id == host.id) else {
            return Err(StoreError::NotFound(host.id));
        };
        host.created_at = catalog.hosts[pos].created_at.clone();
        host.updated_at = now();
        catalog.hosts[pos] = host;
        self.save(&catalog)?;
        Ok(())
    }

    fn delete(&self, id: u32) -> Result<(), StoreError> {
        let mut catalog = self.load()?;
        let before = catalog.hosts.len();
        catalog.hosts.retain(|h| h.id != id);
        if catalog.hosts.len() == before {
            return Err(StoreError::NotFound(id));
        }
        self.save(&catalog)?;
        debug!("[Catalog] Deleted host #{}", id);
        Ok(())
    }

    fn get(&self, id: u32) -> Result<Host, StoreError> {
        self.load()?
            .hosts
            .into_iter()
            .find(|h| h.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn mark_connected(&self, id: u32) -> Result<(), StoreError> {
        let mut catalog = self.load()?;
        let host = catalog
            .hosts
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(StoreError::NotFound(id))?;
        host.last_connected_at = Some(now());
        self.save(&catalog)
    }
}

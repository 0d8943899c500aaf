// 服务层：持久化、主机目录与匹配

pub mod catalog;
pub mod matcher;
pub mod storage;

pub use catalog::{CatalogStore, JsonCatalog, StoreError};

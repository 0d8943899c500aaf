// 数据模型模块

pub mod host;
pub mod known_hosts;
pub mod settings;

pub use host::{Host, HostCatalog};
pub use known_hosts::{KeyCheck, KnownHostsConfig};
pub use settings::{AppSettings, ConnectionSettings, HostKeyPolicy};

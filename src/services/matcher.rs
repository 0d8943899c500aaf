// 主机匹配
// 先精确匹配，唯一命中直接返回；否则退回模糊匹配

use tracing::debug;

use super::catalog::{CatalogStore, StoreError};
use crate::models::Host;

/// 按关键字列出主机，空关键字返回全部
pub fn list_by_keyword<S: CatalogStore + ?Sized>(
    store: &S,
    keyword: &str,
) -> Result<Vec<Host>, StoreError> {
    if keyword.is_empty() {
        return store.list();
    }
    store.find_fuzzy(keyword)
}

/// 解析登录目标
///
/// 返回一个元素时即为唯一目标；多个元素交给用户继续筛选；
/// 没有命中返回空列表。
pub fn match_hosts<S: CatalogStore + ?Sized>(
    store: &S,
    keyword: &str,
) -> Result<Vec<Host>, StoreError> {
    if keyword.is_empty() {
        return store.list();
    }

    let exact = store.find_exact(keyword)?;
    if exact.len() == 1 {
        debug!("[Match] '{}' matched host #{} exactly", keyword, exact[0].id);
        return Ok(exact);
    }

    let fuzzy = store.find_fuzzy(keyword)?;
    debug!(
        "[Match] '{}': {} exact, {} fuzzy candidates",
        keyword,
        exact.len(),
        fuzzy.len()
    );
    Ok(fuzzy)
}

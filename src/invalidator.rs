//! 缓存失效
//!
//! 内容更新时按URL精确失效，语言下线时按语言整体清空，
//! 全量清空留给运维操作。失效操作永远不阻塞内容发布：
//! 存储不可用时记警告并返回0，过期对象由TTL兜底。

use std::sync::Arc;

use futures::future::join_all;

use crate::error::TranslationError;
use crate::key::page_key;
use crate::store::TranslationStore;

/// 缓存失效器
pub struct CacheInvalidator {
    store: Arc<dyn TranslationStore>,
    active_languages: Vec<String>,
}

impl CacheInvalidator {
    pub fn new(store: Arc<dyn TranslationStore>, active_languages: Vec<String>) -> Self {
        Self {
            store,
            active_languages,
        }
    }

    /// 失效一个URL在若干语言下的页面缓存
    ///
    /// 缓存键是内容寻址的，所以需要当前内容来重建键。
    /// `languages` 为 None 时作用于全部启用语言。返回实际
    /// 删除的对象数；存储不可用时记警告并返回0。
    pub async fn invalidate(
        &self,
        url: &str,
        content: &str,
        languages: Option<&[String]>,
    ) -> usize {
        let targets: Vec<&String> = match languages {
            Some(langs) => langs.iter().collect(),
            None => self.active_languages.iter().collect(),
        };

        let deletions = targets.iter().map(|lang| {
            let key = page_key(url, lang, content);
            async move {
                match self.store.delete(lang, key.hex()).await {
                    Ok(removed) => removed as usize,
                    Err(TranslationError::StoreUnavailable(msg)) => {
                        tracing::warn!(url = %url, lang = %lang, "失效时存储不可用: {}", msg);
                        0
                    }
                    Err(e) => {
                        tracing::warn!(url = %url, lang = %lang, "失效失败: {}", e);
                        0
                    }
                }
            }
        });

        let removed: usize = join_all(deletions).await.into_iter().sum();

        tracing::info!(url = %url, removed, "页面缓存失效完成");
        removed
    }

    /// 清空某个语言的全部缓存对象
    ///
    /// 与 `invalidate` 一致，存储不可用时记警告并返回0。
    pub async fn purge_language(&self, target_lang: &str) -> usize {
        let keys = match self.store.list_keys(Some(target_lang)).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(lang = %target_lang, "清空语言缓存时存储不可用: {}", e);
                return 0;
            }
        };
        let removed = self.delete_paths(&keys).await;

        tracing::info!(lang = %target_lang, removed, "语言缓存清空完成");
        removed
    }

    /// 清空全部语言的缓存对象
    pub async fn purge_all(&self) -> usize {
        let keys = match self.store.list_keys(None).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("全量清空时存储不可用: {}", e);
                return 0;
            }
        };
        let removed = self.delete_paths(&keys).await;

        tracing::info!(removed, "全量缓存清空完成");
        removed
    }

    /// 按对象路径逐个删除，单个失败不中断
    async fn delete_paths(&self, paths: &[String]) -> usize {
        let deletions = paths.iter().filter_map(|path| {
            let (lang, key) = split_object_path(path)?;
            Some(async move {
                match self.store.delete(lang, key).await {
                    Ok(removed) => removed as usize,
                    Err(e) => {
                        tracing::warn!(path = %path, "清空时删除失败: {}", e);
                        0
                    }
                }
            })
        });

        join_all(deletions).await.into_iter().sum()
    }
}

/// 拆解 `translations/{lang}/{key}.html` 形式的对象路径
fn split_object_path(path: &str) -> Option<(&str, &str)> {
    let mut parts = path.splitn(3, '/');
    let _prefix = parts.next()?;
    let lang = parts.next()?;
    let file = parts.next()?;
    let key = file.strip_suffix(".html")?;
    Some((lang, key))
}

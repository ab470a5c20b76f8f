//! 内存存储实现
//!
//! 进程内的键值存储，读取时执行TTL检查。既是小规模部署的真实后端，
//! 也是核心逻辑测试用的假实现。

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::config::constants::OBJECT_PREFIX;
use crate::error::{TranslationError, TranslationResult};
use crate::store::{CachePayload, StoreStats, TranslationStore};

/// 内存存储
///
/// 以对象路径（`translations/{lang}/{key}.html`）为主键，与对象存储
/// 后端保持一致的命名空间，统计信息与条目同锁粒度维护。
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CachePayload>>,
    stats: RwLock<StoreStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(StoreStats::default()),
        }
    }

    fn object_path(target_lang: &str, key: &str) -> String {
        format!("{}/{}/{}.html", OBJECT_PREFIX, target_lang, key)
    }

    fn lang_prefix(target_lang: Option<&str>) -> String {
        match target_lang {
            Some(lang) => format!("{}/{}/", OBJECT_PREFIX, lang),
            None => format!("{}/", OBJECT_PREFIX),
        }
    }

    /// 获取统计信息快照
    pub fn stats(&self) -> StoreStats {
        let entries = self.entries.read().expect("存储锁中毒");
        let mut stats = self.stats.read().expect("存储锁中毒").clone();
        stats.total_entries = entries.len();
        stats
    }

    /// 重置统计信息
    pub fn reset_stats(&self) {
        self.stats.write().expect("存储锁中毒").reset();
    }

    /// 当前条目数
    pub fn len(&self) -> usize {
        self.entries.read().expect("存储锁中毒").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清理过期条目，返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().expect("存储锁中毒");
        let initial = entries.len();
        entries.retain(|_, payload| !payload.metadata.is_expired());
        let removed = initial - entries.len();

        let mut stats = self.stats.write().expect("存储锁中毒");
        stats.expired_evictions += removed as u64;
        removed
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationStore for MemoryStore {
    async fn get(&self, target_lang: &str, key: &str) -> TranslationResult<Option<CachePayload>> {
        let path = Self::object_path(target_lang, key);

        // 锁顺序与put/delete保持一致：entries在前，stats在后
        let mut entries = self.entries.write().expect("存储锁中毒");
        let mut stats = self.stats.write().expect("存储锁中毒");
        stats.total_requests += 1;
        if let Some(payload) = entries.get(&path) {
            if payload.metadata.is_expired() {
                // 过期条目按未命中处理并顺手删除
                entries.remove(&path);
                stats.expired_evictions += 1;
                stats.cache_misses += 1;
                return Ok(None);
            }
            stats.cache_hits += 1;
            return Ok(Some(payload.clone()));
        }

        stats.cache_misses += 1;
        Ok(None)
    }

    async fn put(
        &self,
        target_lang: &str,
        key: &str,
        payload: CachePayload,
    ) -> TranslationResult<()> {
        let path = Self::object_path(target_lang, key);

        let mut entries = self.entries.write().expect("存储锁中毒");
        entries.insert(path, payload);

        let mut stats = self.stats.write().expect("存储锁中毒");
        stats.puts += 1;
        stats.total_entries = entries.len();
        Ok(())
    }

    async fn delete(&self, target_lang: &str, key: &str) -> TranslationResult<bool> {
        let path = Self::object_path(target_lang, key);

        let mut entries = self.entries.write().expect("存储锁中毒");
        let removed = entries.remove(&path).is_some();

        if removed {
            let mut stats = self.stats.write().expect("存储锁中毒");
            stats.deletes += 1;
            stats.total_entries = entries.len();
        }
        Ok(removed)
    }

    async fn list_keys(&self, target_lang: Option<&str>) -> TranslationResult<Vec<String>> {
        let prefix = Self::lang_prefix(target_lang);
        let entries = self.entries.read().expect("存储锁中毒");

        Ok(entries
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect())
    }
}

/// 始终不可用的存储
///
/// 模拟凭证缺失或后端宕机，每个操作都返回 `StoreUnavailable`。
/// 用于验证编排层"跳过缓存继续"的降级路径。
pub struct UnavailableStore;

#[async_trait]
impl TranslationStore for UnavailableStore {
    async fn get(&self, _target_lang: &str, _key: &str) -> TranslationResult<Option<CachePayload>> {
        Err(TranslationError::StoreUnavailable(
            "存储后端不可达".to_string(),
        ))
    }

    async fn put(
        &self,
        _target_lang: &str,
        _key: &str,
        _payload: CachePayload,
    ) -> TranslationResult<()> {
        Err(TranslationError::StoreUnavailable(
            "存储后端不可达".to_string(),
        ))
    }

    async fn delete(&self, _target_lang: &str, _key: &str) -> TranslationResult<bool> {
        Err(TranslationError::StoreUnavailable(
            "存储后端不可达".to_string(),
        ))
    }

    async fn list_keys(&self, _target_lang: Option<&str>) -> TranslationResult<Vec<String>> {
        Err(TranslationError::StoreUnavailable(
            "存储后端不可达".to_string(),
        ))
    }
}

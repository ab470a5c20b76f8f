//! 翻译缓存存储
//!
//! 以抽象键值对象存储的形式定义缓存契约，云对象存储、托管KV或
//! 内存实现都满足同一接口，核心逻辑因此可以用内存假实现测试。
//!
//! 失败语义是契约的一部分：后端不可达必须以
//! [`TranslationError::StoreUnavailable`](crate::error::TranslationError)
//! 报告，绝不与真正的缓存未命中（`Ok(None)`）混淆。

pub mod fs;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TranslationResult;

pub use fs::FsStore;
pub use memory::{MemoryStore, UnavailableStore};

/// 缓存条目元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// 内容类型
    pub content_type: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// TTL提示（秒），由存储后端自身的淘汰机制执行
    pub ttl_secs: u64,
}

impl CacheMetadata {
    /// 创建HTML负载的默认元数据
    pub fn html(ttl_secs: u64) -> Self {
        Self {
            content_type: "text/html; charset=utf-8".to_string(),
            created_at: Utc::now(),
            ttl_secs,
        }
    }

    /// 检查条目是否已超过TTL
    pub fn is_expired(&self) -> bool {
        let age = Utc::now().signed_duration_since(self.created_at);
        age.num_seconds() >= 0 && (age.num_seconds() as u64) > self.ttl_secs
    }
}

/// 缓存负载：译文加元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePayload {
    pub body: String,
    pub metadata: CacheMetadata,
}

impl CachePayload {
    pub fn new(body: String, ttl_secs: u64) -> Self {
        Self {
            body,
            metadata: CacheMetadata::html(ttl_secs),
        }
    }
}

/// 翻译缓存存储契约
///
/// - `put` 幂等：同键覆盖写是预期行为（失效后重建），并发写可交换
///   （最后写入者胜出，内容由同一来源确定性派生，结果一致）
/// - `get` 的 `Ok(None)` 是未命中，`Err(StoreUnavailable)` 是后端故障
/// - `list_keys` 用于批量清除和统计
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// 读取缓存条目
    async fn get(&self, target_lang: &str, key: &str) -> TranslationResult<Option<CachePayload>>;

    /// 写入缓存条目（幂等，允许覆盖）
    async fn put(&self, target_lang: &str, key: &str, payload: CachePayload)
        -> TranslationResult<()>;

    /// 删除缓存条目，返回是否确实删除了条目
    async fn delete(&self, target_lang: &str, key: &str) -> TranslationResult<bool>;

    /// 列出对象键
    ///
    /// `Some(lang)` 列出 `translations/{lang}/` 前缀下的对象路径，
    /// `None` 列出全部语言。
    async fn list_keys(&self, target_lang: Option<&str>) -> TranslationResult<Vec<String>>;
}

/// 存储统计信息
#[derive(Debug, Default, Clone)]
pub struct StoreStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub puts: u64,
    pub deletes: u64,
    pub expired_evictions: u64,
    pub total_entries: usize,
}

impl StoreStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }

    /// 重置统计信息
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

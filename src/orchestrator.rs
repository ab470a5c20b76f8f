//! 翻译编排器
//!
//! 串起解析、缓存、翻译服务三层的核心状态机。设计原则是
//! 降级优先：缓存层不可用跳过缓存，翻译服务失败或超时返回
//! 原文，页面永远可以渲染，只是可能没有翻译。
//!
//! 缓存查找顺序：进程内LRU → 持久化存储 → 翻译服务回源。

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::RwLock;

use crate::audit::{AuditRecord, AuditSink, TracingAuditSink};
use crate::config::EngineConfig;
use crate::error::{helpers, TranslationError, TranslationResult};
use crate::key::{page_key, text_key, CacheKey};
use crate::provider::{translate_chunked, TranslationProvider};
use crate::resolver::{LanguageResolver, ResolutionContext};
use crate::store::{CachePayload, TranslationStore};

// ============================================================================
// 统计
// ============================================================================

/// 编排器运行统计
#[derive(Debug, Clone, Default)]
pub struct OrchestratorStats {
    pub local_hits: u64,
    pub store_hits: u64,
    pub provider_calls: u64,
    pub provider_failures: u64,
    pub store_failures: u64,
    pub degraded: u64,
    pub chars_translated: u64,
}

impl OrchestratorStats {
    /// 总请求中不需要回源的比例
    pub fn hit_rate(&self) -> f64 {
        let total = self.local_hits + self.store_hits + self.provider_calls + self.degraded;
        if total == 0 {
            0.0
        } else {
            (self.local_hits + self.store_hits) as f64 / total as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// 编排器
// ============================================================================

/// 翻译编排器
pub struct TranslationOrchestrator {
    store: Arc<dyn TranslationStore>,
    provider: Arc<dyn TranslationProvider>,
    resolver: LanguageResolver,
    config: EngineConfig,
    local_cache: Option<RwLock<LruCache<String, String>>>,
    audit: Arc<dyn AuditSink>,
    stats: RwLock<OrchestratorStats>,
}

impl TranslationOrchestrator {
    /// 创建编排器，审计默认写结构化日志
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn TranslationStore>,
        provider: Arc<dyn TranslationProvider>,
    ) -> Self {
        Self::with_audit(config, store, provider, Arc::new(TracingAuditSink))
    }

    pub fn with_audit(
        config: EngineConfig,
        store: Arc<dyn TranslationStore>,
        provider: Arc<dyn TranslationProvider>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let resolver = LanguageResolver::new(&config);
        let local_cache = if config.local_cache_enabled {
            let capacity = NonZeroUsize::new(config.local_cache_size.max(1))
                .expect("max(1)保证非零");
            Some(RwLock::new(LruCache::new(capacity)))
        } else {
            None
        };

        Self {
            store,
            provider,
            resolver,
            config,
            local_cache,
            audit,
            stats: RwLock::new(OrchestratorStats::default()),
        }
    }

    pub fn resolver(&self) -> &LanguageResolver {
        &self.resolver
    }

    pub async fn stats(&self) -> OrchestratorStats {
        self.stats.read().await.clone()
    }

    pub async fn reset_stats(&self) {
        self.stats.write().await.reset();
    }

    // ------------------------------------------------------------------
    // 页面翻译
    // ------------------------------------------------------------------

    /// 翻译整页内容，永不失败
    ///
    /// 目标语言由请求上下文解析得出。目标语言等于站点默认语言、
    /// 引擎停用或内容为空时原样返回；其余失败路径降级为原文。
    pub async fn translate_page(
        &self,
        ctx: &ResolutionContext,
        url: &str,
        content: &str,
    ) -> String {
        let target_lang = self.resolver.resolve(ctx);

        if !self.config.enabled
            || content.trim().is_empty()
            || target_lang == self.resolver.default_language()
        {
            return content.to_string();
        }

        let key = page_key(url, &target_lang, content);
        let source = self.resolver.default_language().to_string();

        match self
            .translate_keyed(&key, content, &source, &target_lang, Some(url))
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(url = %url, target = %target_lang, "页面翻译降级为原文: {}", e);
                self.stats.write().await.degraded += 1;
                content.to_string()
            }
        }
    }

    // ------------------------------------------------------------------
    // 文本翻译
    // ------------------------------------------------------------------

    /// 翻译单条文本，失败时返回原文
    pub async fn translate_text(&self, text: &str, source_lang: &str, target_lang: &str) -> String {
        match self.try_translate_text(text, source_lang, target_lang).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!(target = %target_lang, "文本翻译降级为原文: {}", e);
                self.stats.write().await.degraded += 1;
                text.to_string()
            }
        }
    }

    /// 翻译单条文本，失败时返回错误
    ///
    /// 需要区分"翻译失败"和"无须翻译"的调用方用这个入口。
    pub async fn try_translate_text(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<String> {
        if text.trim().is_empty() || source_lang == target_lang {
            return Ok(text.to_string());
        }

        if !self.resolver.is_active(target_lang) {
            return Err(TranslationError::InvalidLanguage(target_lang.to_string()));
        }

        let key = text_key(text, source_lang, target_lang);
        self.translate_keyed(&key, text, source_lang, target_lang, None)
            .await
    }

    /// 批量翻译，任一分片失败则整批降级为原文
    pub async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Vec<String> {
        if texts.is_empty() || source_lang == target_lang {
            return texts.to_vec();
        }

        // 先过一遍缓存，只回源真正缺失的条目
        let mut results: Vec<Option<String>> = Vec::with_capacity(texts.len());
        let mut missing_idx = Vec::new();
        let mut missing_texts = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                results.push(Some(text.clone()));
                continue;
            }

            let key = text_key(text, source_lang, target_lang);
            match self.lookup(&key, target_lang).await {
                Some(cached) => results.push(Some(cached)),
                None => {
                    results.push(None);
                    missing_idx.push(i);
                    missing_texts.push(text.clone());
                }
            }
        }

        if !missing_texts.is_empty() {
            let chunk_size = self.config.max_batch_size;
            let outcome = tokio::time::timeout(
                self.config.provider_timeout(),
                translate_chunked(
                    self.provider.as_ref(),
                    &missing_texts,
                    source_lang,
                    target_lang,
                    chunk_size,
                ),
            )
            .await;

            match outcome {
                Ok(Ok(translated)) => {
                    self.stats.write().await.provider_calls += 1;
                    for (slot, (text, result)) in missing_idx
                        .iter()
                        .zip(missing_texts.iter().zip(translated.iter()))
                    {
                        let key = text_key(text, source_lang, target_lang);
                        self.store_best_effort(&key, target_lang, result).await;
                        results[*slot] = Some(result.clone());
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(target = %target_lang, "批量翻译降级为原文: {}", e);
                    let mut stats = self.stats.write().await;
                    stats.provider_failures += 1;
                    stats.degraded += 1;
                }
                Err(_) => {
                    tracing::warn!(target = %target_lang, "批量翻译超时，降级为原文");
                    let mut stats = self.stats.write().await;
                    stats.provider_failures += 1;
                    stats.degraded += 1;
                }
            }
        }

        results
            .into_iter()
            .zip(texts.iter())
            .map(|(slot, original)| slot.unwrap_or_else(|| original.clone()))
            .collect()
    }

    // ------------------------------------------------------------------
    // 内部状态机
    // ------------------------------------------------------------------

    /// 统一的缓存优先翻译路径
    async fn translate_keyed(
        &self,
        key: &CacheKey,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        url: Option<&str>,
    ) -> TranslationResult<String> {
        if let Some(cached) = self.lookup(key, target_lang).await {
            self.audit.record(AuditRecord::new(
                source_lang,
                target_lang,
                text.chars().count(),
                url,
                true,
            ));
            return Ok(cached);
        }

        let outcome = tokio::time::timeout(
            self.config.provider_timeout(),
            self.provider.translate(text, source_lang, target_lang),
        )
        .await;

        let translated = match outcome {
            Ok(Ok(translated)) => translated,
            Ok(Err(e)) => {
                self.stats.write().await.provider_failures += 1;
                return Err(e);
            }
            Err(_) => {
                self.stats.write().await.provider_failures += 1;
                return Err(helpers::timeout_error("翻译服务请求超时"));
            }
        };

        {
            let mut stats = self.stats.write().await;
            stats.provider_calls += 1;
            stats.chars_translated += text.chars().count() as u64;
        }

        self.store_best_effort(key, target_lang, &translated).await;

        self.audit.record(AuditRecord::new(
            source_lang,
            target_lang,
            text.chars().count(),
            url,
            false,
        ));

        Ok(translated)
    }

    /// 两级缓存查找，存储不可用视为未命中
    async fn lookup(&self, key: &CacheKey, target_lang: &str) -> Option<String> {
        let local_key = key.object_path(target_lang);

        if let Some(cache) = &self.local_cache {
            if let Some(hit) = cache.write().await.get(&local_key).cloned() {
                self.stats.write().await.local_hits += 1;
                return Some(hit);
            }
        }

        match self.store.get(target_lang, key.hex()).await {
            Ok(Some(payload)) => {
                if payload.metadata.is_expired() {
                    return None;
                }
                self.stats.write().await.store_hits += 1;
                if let Some(cache) = &self.local_cache {
                    cache.write().await.put(local_key, payload.body.clone());
                }
                Some(payload.body)
            }
            Ok(None) => None,
            Err(TranslationError::StoreUnavailable(msg)) => {
                tracing::warn!("缓存存储不可用，跳过缓存: {}", msg);
                self.stats.write().await.store_failures += 1;
                None
            }
            Err(e) => {
                tracing::warn!("缓存读取失败，按未命中处理: {}", e);
                self.stats.write().await.store_failures += 1;
                None
            }
        }
    }

    /// 尽力写回两级缓存，失败只记日志
    async fn store_best_effort(&self, key: &CacheKey, target_lang: &str, translated: &str) {
        let payload = CachePayload::new(translated.to_string(), self.config.cache_ttl_secs);

        if let Err(e) = self.store.put(target_lang, key.hex(), payload).await {
            tracing::warn!("缓存写入失败，译文仍然返回: {}", e);
            self.stats.write().await.store_failures += 1;
        }

        if let Some(cache) = &self.local_cache {
            cache
                .write()
                .await
                .put(key.object_path(target_lang), translated.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::provider::DetectedLanguage;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TranslationProvider for CountingProvider {
        async fn translate(
            &self,
            text: &str,
            _source_lang: &str,
            target_lang: &str,
        ) -> TranslationResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("[{}]{}", target_lang, text))
        }

        async fn translate_batch(
            &self,
            texts: &[String],
            _source_lang: &str,
            target_lang: &str,
        ) -> TranslationResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| format!("[{}]{}", target_lang, t))
                .collect())
        }

        async fn detect_language(&self, _text: &str) -> TranslationResult<DetectedLanguage> {
            Ok(DetectedLanguage {
                language: "en".to_string(),
                confidence: 1.0,
            })
        }
    }

    fn test_config() -> EngineConfig {
        EngineConfig::with_languages(&["en", "fr", "es"], "en")
    }

    #[tokio::test]
    async fn test_text_translation_caches_second_call() {
        let provider = Arc::new(CountingProvider::new());
        let orchestrator = TranslationOrchestrator::new(
            test_config(),
            Arc::new(MemoryStore::new()),
            provider.clone(),
        );

        let first = orchestrator.translate_text("Hello", "en", "fr").await;
        let second = orchestrator.translate_text("Hello", "en", "fr").await;

        assert_eq!(first, "[fr]Hello");
        assert_eq!(second, first, "cached result must match fresh translation");
        assert_eq!(
            provider.calls.load(Ordering::SeqCst),
            1,
            "second call must be served from cache"
        );
    }

    #[tokio::test]
    async fn test_same_language_short_circuits() {
        let provider = Arc::new(CountingProvider::new());
        let orchestrator = TranslationOrchestrator::new(
            test_config(),
            Arc::new(MemoryStore::new()),
            provider.clone(),
        );

        let result = orchestrator.translate_text("Hello", "en", "en").await;

        assert_eq!(result, "Hello");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inactive_target_rejected_by_try_variant() {
        let orchestrator = TranslationOrchestrator::new(
            test_config(),
            Arc::new(MemoryStore::new()),
            Arc::new(CountingProvider::new()),
        );

        let result = orchestrator.try_translate_text("Hello", "en", "xx").await;

        assert!(matches!(result, Err(TranslationError::InvalidLanguage(_))));
    }

    #[tokio::test]
    async fn test_audit_distinguishes_hit_and_miss() {
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator = TranslationOrchestrator::with_audit(
            test_config(),
            Arc::new(MemoryStore::new()),
            Arc::new(CountingProvider::new()),
            audit.clone(),
        );

        orchestrator.translate_text("Hello", "en", "fr").await;
        orchestrator.translate_text("Hello", "en", "fr").await;

        let records = audit.records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].cache_hit, "first call is a miss");
        assert!(records[1].cache_hit, "second call hits the cache");
    }
}

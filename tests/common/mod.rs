#![allow(dead_code)]
// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use async_trait::async_trait;

use langbridge::error::{helpers, TranslationResult};
use langbridge::provider::{DetectedLanguage, TranslationProvider};
use langbridge::EngineConfig;

static INIT: Once = Once::new();

/// 初始化测试日志（只执行一次，RUST_LOG控制级别）
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// 测试配置构建器
pub struct TestConfigBuilder {
    config: EngineConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::with_languages(&["en", "fr", "es", "de"], "en"),
        }
    }

    pub fn with_languages(mut self, active: &[&str], default_language: &str) -> Self {
        self.config = EngineConfig::with_languages(active, default_language);
        self
    }

    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.config.cache_ttl_secs = ttl_secs;
        self
    }

    pub fn with_local_cache(mut self, enabled: bool) -> Self {
        self.config.local_cache_enabled = enabled;
        self
    }

    pub fn with_provider_timeout_secs(mut self, secs: u64) -> Self {
        self.config.provider_timeout_secs = secs;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}

/// 记录调用次数的模拟翻译服务
///
/// 译文形如 `[target]原文`，方便断言目标语言正确传递。
pub struct MockProvider {
    pub translate_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            translate_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.translate_calls.load(Ordering::SeqCst) + self.batch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn translate(
        &self,
        text: &str,
        _source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<String> {
        self.translate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{}]{}", target_lang, text))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| format!("[{}]{}", target_lang, t))
            .collect())
    }

    async fn detect_language(&self, _text: &str) -> TranslationResult<DetectedLanguage> {
        Ok(DetectedLanguage {
            language: "en".to_string(),
            confidence: 0.99,
        })
    }
}

/// 每次都失败的翻译服务（降级路径测试用）
pub struct FailingProvider;

#[async_trait]
impl TranslationProvider for FailingProvider {
    async fn translate(&self, _t: &str, _s: &str, _l: &str) -> TranslationResult<String> {
        Err(helpers::provider_error("simulated provider outage"))
    }

    async fn translate_batch(
        &self,
        _texts: &[String],
        _s: &str,
        _l: &str,
    ) -> TranslationResult<Vec<String>> {
        Err(helpers::provider_error("simulated provider outage"))
    }

    async fn detect_language(&self, _text: &str) -> TranslationResult<DetectedLanguage> {
        Err(helpers::provider_error("simulated provider outage"))
    }
}

/// 挂起不返回的翻译服务（超时路径测试用）
pub struct HangingProvider;

#[async_trait]
impl TranslationProvider for HangingProvider {
    async fn translate(&self, text: &str, _s: &str, _l: &str) -> TranslationResult<String> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(text.to_string())
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _s: &str,
        _l: &str,
    ) -> TranslationResult<Vec<String>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(texts.to_vec())
    }

    async fn detect_language(&self, _text: &str) -> TranslationResult<DetectedLanguage> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(DetectedLanguage {
            language: "en".to_string(),
            confidence: 0.0,
        })
    }
}

/// 测试数据生成器
pub struct TestDataGenerator;

impl TestDataGenerator {
    pub fn sample_html() -> &'static str {
        "<html><body><h1>Welcome</h1><p>This is a test page.</p></body></html>"
    }

    pub fn sample_texts(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("Sample text {}", i)).collect()
    }
}

//! 翻译服务抽象
//!
//! 定义翻译引擎对上游翻译服务的全部依赖：单条翻译、分片批量
//! 翻译和语言检测。HTTP实现见 `http` 模块，测试桩在集成测试
//! 的 `common` 模块里。

pub mod http;

use async_trait::async_trait;

use crate::config::constants::MAX_BATCH_SIZE;
use crate::error::{TranslationError, TranslationResult};

pub use http::HttpTranslationProvider;

/// 语言检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    /// BCP-47主子标签，如 "en"
    pub language: String,
    /// 置信度 0.0..=1.0
    pub confidence: f32,
}

/// 翻译服务接口
///
/// 实现只负责一个分片内的翻译；跨分片的拆分与重组由
/// [`translate_chunked`] 统一处理，所有调用方共享同一种
/// 分片语义。
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// 翻译单条文本
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<String>;

    /// 翻译一个分片（最多 [`MAX_BATCH_SIZE`] 条）
    ///
    /// 返回值必须与输入一一对应且顺序一致；任何一条失败则
    /// 整个分片失败，不做部分成功。
    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<Vec<String>>;

    /// 检测文本语言
    async fn detect_language(&self, text: &str) -> TranslationResult<DetectedLanguage>;
}

/// 按固定分片大小批量翻译
///
/// 超过 `max_batch_size` 的输入被切成多个分片顺序提交，结果
/// 按原始顺序拼接。任一分片失败则整体失败，已完成分片的结果
/// 被丢弃。
pub async fn translate_chunked(
    provider: &dyn TranslationProvider,
    texts: &[String],
    source_lang: &str,
    target_lang: &str,
    max_batch_size: usize,
) -> TranslationResult<Vec<String>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = if max_batch_size == 0 {
        MAX_BATCH_SIZE
    } else {
        max_batch_size
    };

    let mut results = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(chunk_size) {
        let translated = provider
            .translate_batch(chunk, source_lang, target_lang)
            .await?;

        if translated.len() != chunk.len() {
            return Err(TranslationError::ProviderError(format!(
                "批量翻译结果数量不匹配: 期望 {} 实际 {}",
                chunk.len(),
                translated.len()
            )));
        }

        results.extend(translated);
    }

    Ok(results)
}

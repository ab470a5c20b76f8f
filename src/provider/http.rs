//! HTTP翻译服务实现
//!
//! 对接 Cloud Translation v3 风格的 REST 接口：
//! `POST {endpoint}/v3/projects/{project}:translateText` 与
//! `POST {endpoint}/v3/projects/{project}:detectLanguage`，
//! API密钥通过 `x-goog-api-key` 请求头传递。

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{helpers, TranslationError, TranslationResult};
use crate::provider::{DetectedLanguage, TranslationProvider};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    contents: &'a [String],
    mime_type: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationEntry {
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    languages: Vec<DetectEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectEntry {
    language_code: String,
    #[serde(default)]
    confidence: f32,
}

/// 基于reqwest的翻译服务客户端
pub struct HttpTranslationProvider {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    timeout: Duration,
}

impl HttpTranslationProvider {
    /// 根据引擎配置创建客户端
    ///
    /// 凭据缺失在构造时报 `ConfigurationMissing`，调用路径上
    /// 不再逐次检查。
    pub fn new(config: &EngineConfig) -> TranslationResult<Self> {
        config.require_provider_credentials()?;

        let timeout = config.provider_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| helpers::provider_error(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.provider_endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/v3/projects/{}:{}",
            self.endpoint, self.project_id, method
        )
    }

    /// 配置的请求超时（编排层在外层再套一圈超时用）
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        request: &Req,
    ) -> TranslationResult<Resp> {
        let response = self
            .client
            .post(self.method_url(method))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(helpers::provider_error(format!(
                "翻译服务返回 {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed = response.json::<Resp>().await.map_err(|e| {
            TranslationError::ParseError(format!("解析翻译服务响应失败: {}", e))
        })?;

        Ok(parsed)
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<String> {
        let contents = [text.to_string()];
        let mut results = self
            .translate_batch(&contents, source_lang, target_lang)
            .await?;

        results
            .pop()
            .ok_or_else(|| helpers::provider_error("翻译服务返回空结果"))
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            count = texts.len(),
            source = source_lang,
            target = target_lang,
            "提交批量翻译请求"
        );

        let request = TranslateRequest {
            contents: texts,
            mime_type: "text/html",
            source_language_code: source_lang,
            target_language_code: target_lang,
        };

        let response: TranslateResponse = self.post_json("translateText", &request).await?;

        if response.translations.len() != texts.len() {
            return Err(helpers::provider_error(format!(
                "翻译服务返回条数不匹配: 期望 {} 实际 {}",
                texts.len(),
                response.translations.len()
            )));
        }

        Ok(response
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect())
    }

    async fn detect_language(&self, text: &str) -> TranslationResult<DetectedLanguage> {
        let request = DetectRequest { content: text };
        let response: DetectResponse = self.post_json("detectLanguage", &request).await?;

        let best = response
            .languages
            .into_iter()
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or_else(|| helpers::provider_error("语言检测返回空结果"))?;

        Ok(DetectedLanguage {
            language: best.language_code,
            confidence: best.confidence,
        })
    }
}

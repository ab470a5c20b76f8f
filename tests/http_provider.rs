//! HTTP翻译服务集成测试
//!
//! 用wiremock模拟翻译API，验证请求格式、响应解析和错误映射

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use langbridge::provider::TranslationProvider;
use langbridge::{HttpTranslationProvider, TranslationError};

mod common;

use common::{init_test_logging, TestConfigBuilder};

fn provider_for(server: &MockServer) -> HttpTranslationProvider {
    let mut config = TestConfigBuilder::new().build();
    config.provider_endpoint = server.uri();
    config.project_id = "test-project".to_string();
    config.api_key = "test-key".to_string();
    HttpTranslationProvider::new(&config).expect("credentials are set")
}

/// 测试批量翻译的请求体和响应解析
#[tokio::test]
async fn test_translate_batch_request_shape() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/projects/test-project:translateText"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": ["Hello", "World"],
            "mimeType": "text/html",
            "sourceLanguageCode": "en",
            "targetLanguageCode": "fr",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "translations": [
                { "translatedText": "Bonjour" },
                { "translatedText": "Monde" },
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let texts = vec!["Hello".to_string(), "World".to_string()];
    let results = provider
        .translate_batch(&texts, "en", "fr")
        .await
        .expect("batch should succeed");

    assert_eq!(results, vec!["Bonjour".to_string(), "Monde".to_string()]);

    println!("✅ 批量翻译请求测试通过");
}

/// 测试单条翻译复用批量通道
#[tokio::test]
async fn test_single_translate_uses_batch_endpoint() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/projects/test-project:translateText"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "translations": [{ "translatedText": "Hola" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let result = provider
        .translate("Hello", "en", "es")
        .await
        .expect("translate should succeed");

    assert_eq!(result, "Hola");
}

/// 测试服务端错误映射为ProviderError
#[tokio::test]
async fn test_server_error_maps_to_provider_error() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let result = provider.translate("Hello", "en", "fr").await;

    assert!(matches!(result, Err(TranslationError::ProviderError(_))));
}

/// 测试返回条数不匹配被拒绝
#[tokio::test]
async fn test_count_mismatch_rejected() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "translations": [{ "translatedText": "only one" }]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let texts = vec!["a".to_string(), "b".to_string()];
    let result = provider.translate_batch(&texts, "en", "fr").await;

    assert!(
        matches!(result, Err(TranslationError::ProviderError(_))),
        "short response must not be zipped silently"
    );
}

/// 测试语言检测取置信度最高的候选
#[tokio::test]
async fn test_detect_language_picks_best_candidate() {
    init_test_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/projects/test-project:detectLanguage"))
        .and(body_partial_json(json!({ "content": "Bonjour tout le monde" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "languages": [
                { "languageCode": "en", "confidence": 0.12 },
                { "languageCode": "fr", "confidence": 0.95 },
            ]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let detected = provider
        .detect_language("Bonjour tout le monde")
        .await
        .expect("detection should succeed");

    assert_eq!(detected.language, "fr");
    assert!((detected.confidence - 0.95).abs() < f32::EPSILON);
}

/// 测试凭据缺失在构造时报错
#[tokio::test]
async fn test_missing_credentials_rejected_at_construction() {
    init_test_logging();
    let config = TestConfigBuilder::new().build();

    let result = HttpTranslationProvider::new(&config);

    assert!(
        matches!(result, Err(TranslationError::ConfigurationMissing(_))),
        "missing api key must surface as ConfigurationMissing"
    );
}

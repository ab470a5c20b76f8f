//! 缓存系统集成测试
//!
//! 覆盖缓存键派生、内存存储和文件系统存储的行为一致性

use std::sync::Arc;

use langbridge::key::{content_digest, page_key, text_key};
use langbridge::store::{CachePayload, FsStore, MemoryStore, TranslationStore};
use langbridge::TranslationError;

mod common;

use common::init_test_logging;

/// 测试文本键对输入三元组的敏感性
#[tokio::test]
async fn test_text_key_sensitivity() {
    init_test_logging();

    let base = text_key("Hello world", "en", "fr");

    assert_eq!(
        base.hex(),
        text_key("Hello world", "en", "fr").hex(),
        "same inputs must derive the same key"
    );
    assert_ne!(base.hex(), text_key("Hello world!", "en", "fr").hex());
    assert_ne!(base.hex(), text_key("Hello world", "de", "fr").hex());
    assert_ne!(base.hex(), text_key("Hello world", "en", "es").hex());
}

/// 测试页面键随内容变化，旧内容的键自然失效
#[tokio::test]
async fn test_page_key_changes_with_content() {
    init_test_logging();

    let url = "https://example.com/about?utm=1#section";
    let before = page_key(url, "fr", "<p>old</p>");
    let after = page_key(url, "fr", "<p>new</p>");

    assert_ne!(
        before.hex(),
        after.hex(),
        "content change must produce a fresh key"
    );
    assert_ne!(content_digest("<p>old</p>"), content_digest("<p>new</p>"));

    // 片段不参与规范化URL
    let no_fragment = page_key("https://example.com/about?utm=1", "fr", "<p>old</p>");
    assert_eq!(before.hex(), no_fragment.hex());
}

/// 在两种存储实现上跑同一组基本操作
async fn exercise_store(store: &dyn TranslationStore) {
    let payload = CachePayload::new("<p>bonjour</p>".to_string(), 3600);

    // 初始未命中
    let miss = store.get("fr", "abc123").await.expect("get should not error");
    assert!(miss.is_none(), "store should start empty");

    // 写入后命中
    store
        .put("fr", "abc123", payload.clone())
        .await
        .expect("put should succeed");
    let hit = store
        .get("fr", "abc123")
        .await
        .expect("get should not error")
        .expect("entry should be found");
    assert_eq!(hit.body, "<p>bonjour</p>");
    assert_eq!(hit.metadata.content_type, "text/html; charset=utf-8");

    // 语言命名空间隔离
    let other = store.get("es", "abc123").await.expect("get should not error");
    assert!(other.is_none(), "languages must not share entries");

    // 枚举与删除
    let keys = store
        .list_keys(Some("fr"))
        .await
        .expect("list_keys should succeed");
    assert_eq!(keys, vec!["translations/fr/abc123.html".to_string()]);

    assert!(store.delete("fr", "abc123").await.expect("delete should succeed"));
    assert!(
        !store.delete("fr", "abc123").await.expect("delete should succeed"),
        "second delete must report nothing removed"
    );
}

/// 测试内存存储的基本操作
#[tokio::test]
async fn test_memory_store_operations() {
    init_test_logging();
    let store = MemoryStore::new();
    exercise_store(&store).await;
}

/// 测试文件系统存储的基本操作及磁盘布局
#[tokio::test]
async fn test_fs_store_operations() {
    init_test_logging();
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = FsStore::new(dir.path()).expect("store root exists");

    exercise_store(&store).await;

    // 对象落在 translations/{lang}/{key}.html，元数据在边车文件
    let payload = CachePayload::new("<p>hola</p>".to_string(), 3600);
    store
        .put("es", "deadbeef", payload)
        .await
        .expect("put should succeed");

    let body_path = dir.path().join("translations/es/deadbeef.html");
    let meta_path = dir.path().join("translations/es/deadbeef.meta.json");
    assert!(body_path.is_file(), "body object must exist on disk");
    assert!(meta_path.is_file(), "metadata sidecar must exist on disk");

    let raw_meta = std::fs::read_to_string(&meta_path).expect("sidecar is readable");
    assert!(raw_meta.contains("text/html"));
}

/// 测试文件系统存储在根目录缺失时报存储不可用
#[tokio::test]
async fn test_fs_store_missing_root_is_unavailable() {
    init_test_logging();

    let result = FsStore::new("/nonexistent/langbridge-test-root");
    assert!(
        matches!(result, Err(TranslationError::StoreUnavailable(_))),
        "missing root must be StoreUnavailable, not a silent miss"
    );
}

/// 测试跨语言的全量枚举
#[tokio::test]
async fn test_list_keys_across_languages() {
    init_test_logging();
    let store = Arc::new(MemoryStore::new());

    for (lang, key) in [("fr", "k1"), ("fr", "k2"), ("es", "k3")] {
        store
            .put(lang, key, CachePayload::new("body".to_string(), 3600))
            .await
            .expect("put should succeed");
    }

    let mut all = store.list_keys(None).await.expect("list_keys should succeed");
    all.sort();
    assert_eq!(
        all,
        vec![
            "translations/es/k3.html".to_string(),
            "translations/fr/k1.html".to_string(),
            "translations/fr/k2.html".to_string(),
        ]
    );

    println!("✅ 缓存系统测试通过");
}

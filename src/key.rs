//! 缓存键派生
//!
//! 纯确定性函数：相同输入永远产生相同的键。两种派生方式各司其职：
//! - 文本键：即席字符串翻译，对 (文本, 源语言, 目标语言) 取哈希
//! - 页面键：页面级缓存，对 (规范化URL, 目标语言, 内容哈希) 取哈希，
//!   源内容被编辑后自然产生新键，避免静默提供过期译文

use blake3::Hasher;
use url::Url;

use crate::config::constants::OBJECT_PREFIX;

/// 派生出的缓存键（十六进制哈希）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// 十六进制表示
    pub fn hex(&self) -> &str {
        &self.0
    }

    /// 存储对象路径：`translations/{targetLang}/{cacheKey}.html`
    ///
    /// 与既有部署的对象命名约定保持兼容。
    pub fn object_path(&self, target_lang: &str) -> String {
        format!("{}/{}/{}.html", OBJECT_PREFIX, target_lang, self.0)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 即席文本翻译的缓存键
///
/// digest(text ∥ source_lang ∥ target_lang)
pub fn text_key(text: &str, source_lang: &str, target_lang: &str) -> CacheKey {
    let mut hasher = Hasher::new();
    hasher.update(text.as_bytes());
    hasher.update(&[0]);
    hasher.update(source_lang.as_bytes());
    hasher.update(&[0]);
    hasher.update(target_lang.as_bytes());
    CacheKey(hasher.finalize().to_hex().to_string())
}

/// 页面级缓存键
///
/// digest(canonical_url ∥ target_lang ∥ digest(content))
/// 内容哈希被折叠进键中，编辑源内容会产生新键而不是命中旧缓存。
pub fn page_key(url: &str, target_lang: &str, content: &str) -> CacheKey {
    let canonical = canonicalize_url(url);

    let mut hasher = Hasher::new();
    hasher.update(canonical.as_bytes());
    hasher.update(&[0]);
    hasher.update(target_lang.as_bytes());
    hasher.update(&[0]);
    hasher.update(content_digest(content).as_bytes());
    CacheKey(hasher.finalize().to_hex().to_string())
}

/// 源内容指纹
///
/// 内容源协作方通过它传递内容变更信号。
pub fn content_digest(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// URL规范化
///
/// 主机名小写、丢弃fragment。解析失败时按原样使用字符串，
/// 保证派生函数永远不会失败。
fn canonicalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.to_string(),
    }
}

//! 文件系统存储实现
//!
//! 在本地目录中复刻对象存储的命名空间：
//! `{root}/translations/{lang}/{key}.html` 存放译文本体，
//! `{root}/translations/{lang}/{key}.meta.json` 存放元数据边车。
//! TTL只作为元数据提示记录，淘汰交给部署环境（与对象存储的
//! `cacheControl: max-age` 行为一致）。

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::constants::OBJECT_PREFIX;
use crate::error::{TranslationError, TranslationResult};
use crate::store::{CacheMetadata, CachePayload, TranslationStore};

/// 文件系统对象存储
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// 在指定根目录创建存储
    ///
    /// 根目录不存在或不可写视为配置问题，在构造时报 `StoreUnavailable`，
    /// 而不是等到第一次读写才暴露。
    pub fn new(root: impl Into<PathBuf>) -> TranslationResult<Self> {
        let root = root.into();

        if !root.is_dir() {
            return Err(TranslationError::StoreUnavailable(format!(
                "存储根目录不存在: {}",
                root.display()
            )));
        }

        Ok(Self { root })
    }

    fn body_path(&self, target_lang: &str, key: &str) -> PathBuf {
        self.root
            .join(OBJECT_PREFIX)
            .join(target_lang)
            .join(format!("{}.html", key))
    }

    fn meta_path(&self, target_lang: &str, key: &str) -> PathBuf {
        self.root
            .join(OBJECT_PREFIX)
            .join(target_lang)
            .join(format!("{}.meta.json", key))
    }

    /// 把IO错误映射为存储不可用；NotFound单独处理为未命中
    fn io_unavailable(context: &str, e: std::io::Error) -> TranslationError {
        TranslationError::StoreUnavailable(format!("{}: {}", context, e))
    }
}

#[async_trait]
impl TranslationStore for FsStore {
    async fn get(&self, target_lang: &str, key: &str) -> TranslationResult<Option<CachePayload>> {
        let body_path = self.body_path(target_lang, key);

        let body = match tokio::fs::read_to_string(&body_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_unavailable("读取缓存对象失败", e)),
        };

        // 边车缺失时退化为合理默认值，本体仍然可用
        let metadata = match tokio::fs::read_to_string(self.meta_path(target_lang, key)).await {
            Ok(raw) => serde_json::from_str::<CacheMetadata>(&raw).unwrap_or_else(|e| {
                tracing::warn!("缓存元数据损坏，使用默认值: {}", e);
                CacheMetadata::html(0)
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => CacheMetadata::html(0),
            Err(e) => return Err(Self::io_unavailable("读取缓存元数据失败", e)),
        };

        Ok(Some(CachePayload { body, metadata }))
    }

    async fn put(
        &self,
        target_lang: &str,
        key: &str,
        payload: CachePayload,
    ) -> TranslationResult<()> {
        let body_path = self.body_path(target_lang, key);

        if let Some(parent) = body_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_unavailable("创建语言目录失败", e))?;
        }

        tokio::fs::write(&body_path, payload.body.as_bytes())
            .await
            .map_err(|e| Self::io_unavailable("写入缓存对象失败", e))?;

        let meta = serde_json::to_string_pretty(&payload.metadata)?;
        tokio::fs::write(self.meta_path(target_lang, key), meta.as_bytes())
            .await
            .map_err(|e| Self::io_unavailable("写入缓存元数据失败", e))?;

        Ok(())
    }

    async fn delete(&self, target_lang: &str, key: &str) -> TranslationResult<bool> {
        let body_path = self.body_path(target_lang, key);

        let removed = match tokio::fs::remove_file(&body_path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(Self::io_unavailable("删除缓存对象失败", e)),
        };

        // 边车尽力删除，缺失不算错
        let _ = tokio::fs::remove_file(self.meta_path(target_lang, key)).await;

        Ok(removed)
    }

    async fn list_keys(&self, target_lang: Option<&str>) -> TranslationResult<Vec<String>> {
        let base = self.root.join(OBJECT_PREFIX);

        let lang_dirs: Vec<PathBuf> = match target_lang {
            Some(lang) => vec![base.join(lang)],
            None => {
                let mut dirs = Vec::new();
                let mut reader = match tokio::fs::read_dir(&base).await {
                    Ok(reader) => reader,
                    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                    Err(e) => return Err(Self::io_unavailable("枚举语言目录失败", e)),
                };
                while let Some(entry) = reader
                    .next_entry()
                    .await
                    .map_err(|e| Self::io_unavailable("枚举语言目录失败", e))?
                {
                    if entry.path().is_dir() {
                        dirs.push(entry.path());
                    }
                }
                dirs
            }
        };

        let mut keys = Vec::new();
        for dir in lang_dirs {
            let mut reader = match tokio::fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Self::io_unavailable("枚举缓存对象失败", e)),
            };

            while let Some(entry) = reader
                .next_entry()
                .await
                .map_err(|e| Self::io_unavailable("枚举缓存对象失败", e))?
            {
                let path = entry.path();
                // 只统计译文本体，元数据边车不算独立对象
                if path.extension().and_then(|e| e.to_str()) == Some("html") {
                    if let Ok(rel) = path.strip_prefix(&self.root) {
                        keys.push(rel.to_string_lossy().replace('\\', "/"));
                    }
                }
            }
        }

        Ok(keys)
    }
}

//! 翻译审计
//!
//! 每次完成一次翻译（命中或回源）都产生一条审计记录，
//! 用于用量核算和命中率观察。默认落到结构化日志，测试
//! 里用内存收集器断言。

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单次翻译的审计记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub source_lang: String,
    pub target_lang: String,
    /// 原文字符数（回源时的计费口径）
    pub char_count: usize,
    /// 页面翻译时的页面URL，文本翻译为None
    pub url: Option<String>,
    pub cache_hit: bool,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        source_lang: &str,
        target_lang: &str,
        char_count: usize,
        url: Option<&str>,
        cache_hit: bool,
    ) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            char_count,
            url: url.map(String::from),
            cache_hit,
            recorded_at: Utc::now(),
        }
    }
}

/// 审计记录的落地方式
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

/// 写结构化日志的默认实现
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        tracing::info!(
            source = %record.source_lang,
            target = %record.target_lang,
            chars = record.char_count,
            url = record.url.as_deref().unwrap_or("-"),
            cache_hit = record.cache_hit,
            "翻译审计"
        );
    }
}

/// 收集到内存的实现，测试断言用
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().expect("审计锁中毒").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("审计锁中毒").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().expect("审计锁中毒").push(record);
    }
}

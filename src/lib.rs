//! # Langbridge
//!
//! 多语言站点的翻译缓存与语言解析引擎：解析访客的目标语言，
//! 以内容寻址的缓存键查缓存，缓存未命中时回源翻译服务并写回。
//! 任何下游故障都降级为返回原文，页面渲染永不因翻译失败而中断。
//!
//! ## 模块组织
//!
//! - `config` - 引擎配置与常量
//! - `resolver` - 目标语言解析（Cookie、查询参数、边缘头、子域名、地理、Accept-Language）
//! - `key` - 内容寻址缓存键派生
//! - `store` - 翻译缓存存储抽象及内存/文件系统实现
//! - `provider` - 翻译服务抽象及HTTP实现
//! - `orchestrator` - 缓存优先的翻译编排状态机
//! - `invalidator` - 按URL/语言/全量的缓存失效
//! - `audit` - 翻译用量审计
//! - `error` - 统一错误类型

pub mod audit;
pub mod config;
pub mod error;
pub mod invalidator;
pub mod key;
pub mod orchestrator;
pub mod provider;
pub mod resolver;
pub mod store;

// Re-export commonly used items for convenience
pub use audit::{AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use config::{ConfigManager, EngineConfig};
pub use error::{TranslationError, TranslationResult};
pub use invalidator::CacheInvalidator;
pub use key::{content_digest, page_key, text_key, CacheKey};
pub use orchestrator::{OrchestratorStats, TranslationOrchestrator};
pub use provider::{DetectedLanguage, HttpTranslationProvider, TranslationProvider};
pub use resolver::{LanguageResolver, ResolutionContext};
pub use store::{CacheMetadata, CachePayload, FsStore, MemoryStore, TranslationStore};

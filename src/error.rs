//! 统一错误处理
//!
//! 定义翻译缓存引擎的结构化错误类型和传播策略：
//! 瞬时故障（存储不可用、翻译服务失败）在编排层被吸收并降级，
//! 持久性故障（配置缺失）需要向上层明确暴露。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 必要配置缺失（凭证、项目ID、存储桶等）
    ///
    /// 这是唯一需要向运维层面明确暴露的错误：它是持久性问题，
    /// 静默降级只会掩盖故障。
    #[error("配置缺失: {0}")]
    ConfigurationMissing(String),

    /// 配置存在但无效
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 缓存后端不可达或未正确配置
    ///
    /// 与缓存未命中严格区分：调用方应当"跳过缓存继续"，
    /// 而不是当作"翻译不存在"。
    #[error("缓存存储不可用: {0}")]
    StoreUnavailable(String),

    /// 翻译/检测服务调用失败（认证、配额、网络、响应格式错误）
    #[error("翻译服务错误: {0}")]
    ProviderError(String),

    /// 请求的语言不在活跃语言集内
    ///
    /// 解析器内部的回退标记，永远不会作为错误暴露给调用方。
    #[error("语言未激活: {0}")]
    InvalidLanguage(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 操作超时，降级行为等同于 ProviderError
    #[error("操作超时: {0}")]
    TimeoutError(String),

    /// 缓存读写过程中的非可用性错误
    #[error("缓存错误: {0}")]
    CacheError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::StoreUnavailable(_) => true,
            TranslationError::ProviderError(_) => true,
            TranslationError::TimeoutError(_) => true,
            TranslationError::CacheError(_) => true,
            TranslationError::ConfigurationMissing(_) => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::InvalidLanguage(_) => false,
            TranslationError::InvalidInput(_) => false,
            TranslationError::SerializationError(_) => false,
            TranslationError::ParseError(_) => false,
        }
    }

    /// 检查错误是否为瞬时故障（应在编排层降级而非传播）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TranslationError::StoreUnavailable(_)
                | TranslationError::ProviderError(_)
                | TranslationError::TimeoutError(_)
                | TranslationError::CacheError(_)
        )
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigurationMissing(_) => ErrorSeverity::Critical,
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::StoreUnavailable(_) => ErrorSeverity::Warning,
            TranslationError::ProviderError(_) => ErrorSeverity::Error,
            TranslationError::InvalidLanguage(_) => ErrorSeverity::Info,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::TimeoutError(_) => ErrorSeverity::Warning,
            TranslationError::CacheError(_) => ErrorSeverity::Warning,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigurationMissing(_) => ErrorCategory::Configuration,
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::StoreUnavailable(_) => ErrorCategory::Store,
            TranslationError::CacheError(_) => ErrorCategory::Store,
            TranslationError::ProviderError(_) => ErrorCategory::Provider,
            TranslationError::TimeoutError(_) => ErrorCategory::Timeout,
            TranslationError::InvalidLanguage(_) => ErrorCategory::Language,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Store,
    Provider,
    Timeout,
    Language,
    Input,
    Serialization,
    Parsing,
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::StoreUnavailable(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TranslationError::TimeoutError(format!("请求超时: {}", error))
        } else {
            TranslationError::ProviderError(format!("网络错误: {}", error))
        }
    }
}

impl From<tokio::time::error::Elapsed> for TranslationError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        TranslationError::TimeoutError(format!("异步操作超时: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录并返回错误
    pub fn log_error<T>(error: TranslationError) -> TranslationResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }

        Err(error)
    }

    /// 创建存储不可用错误
    pub fn store_unavailable<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::StoreUnavailable(msg.to_string())
    }

    /// 创建翻译服务错误
    pub fn provider_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ProviderError(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建配置缺失错误
    pub fn configuration_missing<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigurationMissing(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::InvalidInput(msg.to_string())
    }

    /// 创建超时错误
    pub fn timeout_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::TimeoutError(msg.to_string())
    }
}

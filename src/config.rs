//! 配置管理
//!
//! 提供引擎配置的统一接口，支持配置文件、环境变量和默认值。
//! 配置在构造时被显式注入到各组件中，不存在全局可变状态。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TranslationError, TranslationResult};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    /// 单次翻译API调用的最大文本数（外部API限制）
    pub const MAX_BATCH_SIZE: usize = 100;

    /// 默认缓存TTL
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600); // 1小时

    /// 默认翻译服务超时
    pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

    /// 默认本地缓存容量
    pub const DEFAULT_LOCAL_CACHE_SIZE: usize = 1000;

    /// 默认活跃语言集
    pub const DEFAULT_ACTIVE_LANGUAGES: &[&str] = &["en", "fr", "es", "de"];

    /// 默认语言
    pub const DEFAULT_LANGUAGE: &str = "en";

    /// 缓存对象路径前缀（与既有部署兼容）
    pub const OBJECT_PREFIX: &str = "translations";

    /// 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "langbridge.toml",
        ".langbridge.toml",
        "~/.config/langbridge/config.toml",
        "/etc/langbridge/config.toml",
    ];
}

/// 引擎配置
///
/// 活跃语言集、默认语言、翻译服务凭证与缓存参数的单一来源。
/// 只读地被解析器、键派生器和编排器共享。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// 是否启用翻译
    pub enabled: bool,
    /// 活跃语言集（有序，首匹配语义依赖此顺序）
    pub active_languages: Vec<String>,
    /// 默认语言，必须是活跃语言集的成员
    pub default_language: String,

    // 翻译服务配置
    /// 翻译API端点
    pub provider_endpoint: String,
    /// 云项目ID
    pub project_id: String,
    /// API密钥
    pub api_key: String,
    /// 单次API调用超时（秒）
    pub provider_timeout_secs: u64,
    /// 批次翻译的单次调用上限
    pub max_batch_size: usize,

    // 缓存配置
    /// 缓存条目TTL（秒），作为元数据提示写入存储
    pub cache_ttl_secs: u64,
    /// 启用进程内LRU前置缓存
    pub local_cache_enabled: bool,
    /// 本地缓存容量
    pub local_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            active_languages: constants::DEFAULT_ACTIVE_LANGUAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_language: constants::DEFAULT_LANGUAGE.to_string(),

            provider_endpoint: "https://translation.googleapis.com".to_string(),
            project_id: String::new(),
            api_key: String::new(),
            provider_timeout_secs: constants::DEFAULT_PROVIDER_TIMEOUT.as_secs(),
            max_batch_size: constants::MAX_BATCH_SIZE,

            cache_ttl_secs: constants::DEFAULT_CACHE_TTL.as_secs(),
            local_cache_enabled: true,
            local_cache_size: constants::DEFAULT_LOCAL_CACHE_SIZE,
        }
    }
}

impl EngineConfig {
    /// 创建带指定语言集的配置
    pub fn with_languages(active: &[&str], default_language: &str) -> Self {
        let mut config = Self::default();
        config.active_languages = active.iter().map(|s| s.to_string()).collect();
        config.default_language = default_language.to_string();
        config
    }

    /// 验证配置
    ///
    /// 解析器必须永远有可用的默认语言，所以默认语言不在活跃集内时
    /// 将其补入而不是报错。
    pub fn validate(&mut self) -> TranslationResult<()> {
        if self.default_language.trim().is_empty() {
            return Err(TranslationError::ConfigError(
                "默认语言不能为空".to_string(),
            ));
        }

        if self.max_batch_size == 0 {
            return Err(TranslationError::ConfigError(
                "批次大小不能为0".to_string(),
            ));
        }

        if self.local_cache_enabled && self.local_cache_size == 0 {
            return Err(TranslationError::ConfigError(
                "启用本地缓存时缓存容量不能为0".to_string(),
            ));
        }

        // 规范化：去除空白项，统一小写
        self.active_languages = self
            .active_languages
            .iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        self.default_language = self.default_language.trim().to_lowercase();

        if !self.active_languages.contains(&self.default_language) {
            self.active_languages.push(self.default_language.clone());
        }

        Ok(())
    }

    /// 检查翻译服务凭证是否齐备
    ///
    /// 凭证缺失是持久性故障，必须明确暴露而不是静默降级。
    pub fn require_provider_credentials(&self) -> TranslationResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(TranslationError::ConfigurationMissing(
                "project_id 未配置".to_string(),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(TranslationError::ConfigurationMissing(
                "api_key 未配置".to_string(),
            ));
        }
        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        if let Ok(langs) = std::env::var("LANGBRIDGE_ACTIVE_LANGUAGES") {
            self.active_languages = langs.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(default_lang) = std::env::var("LANGBRIDGE_DEFAULT_LANGUAGE") {
            self.default_language = default_lang;
        }

        if let Ok(endpoint) = std::env::var("LANGBRIDGE_PROVIDER_ENDPOINT") {
            tracing::info!("环境变量覆盖翻译API端点: {}", endpoint);
            self.provider_endpoint = endpoint;
        }

        if let Ok(project) = std::env::var("LANGBRIDGE_PROJECT_ID") {
            self.project_id = project;
        }

        if let Ok(key) = std::env::var("LANGBRIDGE_API_KEY") {
            self.api_key = key;
        }

        if let Ok(ttl) = std::env::var("LANGBRIDGE_CACHE_TTL_SECS") {
            if let Ok(secs) = ttl.parse::<u64>() {
                self.cache_ttl_secs = secs;
            }
        }

        if let Ok(enabled) = std::env::var("LANGBRIDGE_ENABLED") {
            self.enabled = matches!(enabled.as_str(), "1" | "true" | "yes");
        }
    }

    /// 转换为Duration类型
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// 配置管理器
///
/// 负责文件查找、解析和环境变量合并，产出经过验证的 [`EngineConfig`]。
pub struct ConfigManager {
    config: EngineConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    ///
    /// 加载顺序：.env 文件 → 配置文件 → 环境变量覆盖 → 验证。
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 消费管理器取出配置
    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<EngineConfig> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(EngineConfig::default())
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &str) -> TranslationResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() {
                if dotenv::from_filename(env_file).is_ok() {
                    tracing::info!("已加载环境变量文件: {}", env_file);
                    break;
                }
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = EngineConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

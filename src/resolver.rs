//! 语言解析
//!
//! 将单个请求携带的多路信号（Cookie、查询参数、边缘组件断言、子域名、
//! IP地理位置、浏览器Accept-Language）收敛为恰好一个目标语言。
//!
//! 解析采用显式的命名策略管道，按固定优先级顺序求值、首匹配即返回，
//! 取代原有按数字优先级隐式链接钩子的做法。解析器永远不会失败，
//! 也永远不返回空值：所有策略都落空时返回配置的默认语言。

use std::sync::OnceLock;

use regex::Regex;

use crate::config::EngineConfig;

/// 单次请求的解析上下文
///
/// 每请求构造，从不持久化。`edge_language` 只能由可信的边缘路由
/// 组件填入（例如反向代理预解析后注入的内部头），公开入口构造
/// 上下文时必须保持 `None`，不得从客户端可控的等价头中取值。
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// 用户Cookie中保存的语言偏好
    pub cookie: Option<String>,
    /// 查询参数 `?lang=`
    pub query: Option<String>,
    /// 上游边缘组件预解析的语言（可信内部信号）
    pub edge_language: Option<String>,
    /// 请求的Host头，用于子域名提取
    pub host: Option<String>,
    /// IP地理定位得到的国家代码（大写ISO-3166）
    pub country: Option<String>,
    /// 浏览器Accept-Language头原文
    pub accept_language: Option<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, lang: &str) -> Self {
        self.cookie = Some(lang.to_string());
        self
    }

    pub fn with_query(mut self, lang: &str) -> Self {
        self.query = Some(lang.to_string());
        self
    }

    pub fn with_edge_language(mut self, lang: &str) -> Self {
        self.edge_language = Some(lang.to_string());
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_uppercase());
        self
    }

    pub fn with_accept_language(mut self, header: &str) -> Self {
        self.accept_language = Some(header.to_string());
        self
    }
}

/// 单个解析策略
///
/// 返回 `Some(lang)` 表示命中（必须已验证属于活跃语言集），
/// `None` 表示落空，交给下一个策略。
trait ResolveStrategy: Send + Sync {
    /// 策略名，用于日志
    fn name(&self) -> &'static str;

    fn resolve(&self, ctx: &ResolutionContext, active: &[String]) -> Option<String>;
}

/// 1. Cookie：用户的显式选择
struct CookieStrategy;

impl ResolveStrategy for CookieStrategy {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn resolve(&self, ctx: &ResolutionContext, active: &[String]) -> Option<String> {
        member_of(ctx.cookie.as_deref(), active)
    }
}

/// 2. 查询参数
struct QueryStrategy;

impl ResolveStrategy for QueryStrategy {
    fn name(&self) -> &'static str {
        "query"
    }

    fn resolve(&self, ctx: &ResolutionContext, active: &[String]) -> Option<String> {
        // 公开入口同样做集合成员校验，防止缓存键被任意字符串污染
        member_of(ctx.query.as_deref(), active)
    }
}

/// 3. 边缘组件预解析的语言（可信内部信号）
struct EdgeStrategy;

impl ResolveStrategy for EdgeStrategy {
    fn name(&self) -> &'static str {
        "edge"
    }

    fn resolve(&self, ctx: &ResolutionContext, active: &[String]) -> Option<String> {
        member_of(ctx.edge_language.as_deref(), active)
    }
}

/// 4. 子域名：`fr.example.com` → fr
struct SubdomainStrategy;

impl ResolveStrategy for SubdomainStrategy {
    fn name(&self) -> &'static str {
        "subdomain"
    }

    fn resolve(&self, ctx: &ResolutionContext, active: &[String]) -> Option<String> {
        let host = ctx.host.as_deref()?;
        let parts: Vec<&str> = host.split('.').collect();

        // 至少需要 subdomain.domain.tld 三段
        if parts.len() < 3 {
            return None;
        }

        member_of(Some(&parts[0].to_lowercase()), active)
    }
}

/// 5. 国家→语言映射（地理定位信号）
struct GeoStrategy;

impl ResolveStrategy for GeoStrategy {
    fn name(&self) -> &'static str {
        "geo"
    }

    fn resolve(&self, ctx: &ResolutionContext, active: &[String]) -> Option<String> {
        let country = ctx.country.as_deref()?;
        let lang = country_to_language(country)?;
        // 映射结果不在活跃集内时落空，交给下一个策略，不直接短路到默认语言
        member_of(Some(lang), active)
    }
}

/// 6. 浏览器Accept-Language
struct AcceptLanguageStrategy;

impl ResolveStrategy for AcceptLanguageStrategy {
    fn name(&self) -> &'static str {
        "accept-language"
    }

    fn resolve(&self, ctx: &ResolutionContext, active: &[String]) -> Option<String> {
        let header = ctx.accept_language.as_deref()?;

        // 按q值降序取第一个基础代码属于活跃集的标签
        for (lang, _q) in parse_accept_language(header) {
            if let Some(hit) = member_of(Some(&lang), active) {
                return Some(hit);
            }
        }

        None
    }
}

/// 集合成员检查，统一小写比较
fn member_of(candidate: Option<&str>, active: &[String]) -> Option<String> {
    let lang = candidate?.trim().to_lowercase();
    if !lang.is_empty() && active.iter().any(|a| a == &lang) {
        Some(lang)
    } else {
        None
    }
}

/// 解析Accept-Language头为按q值降序的 (基础语言代码, q) 列表
///
/// 格式示例：`es-ES,es;q=0.9,en;q=0.5`。区域后缀被剥离，
/// 只保留两字母基础代码；缺省q值为1.0。
pub fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let re = TAG_RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z]{2,3})(?:-[A-Za-z0-9]+)*\s*(?:;\s*q\s*=\s*([0-9.]+))?\s*$")
            .expect("Accept-Language正则必然合法")
    });

    let mut tags: Vec<(String, f32)> = Vec::new();

    for part in header.split(',') {
        if let Some(caps) = re.captures(part) {
            let lang = caps[1].to_lowercase();
            let q = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<f32>().ok())
                .unwrap_or(1.0);
            tags.push((lang, q));
        }
    }

    // 稳定排序：相同q值保持头部原始顺序
    tags.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    tags
}

/// 国家代码→语言代码静态映射
///
/// 故意保持小而静态。未映射的国家返回 None，由后续策略兜底。
pub fn country_to_language(country: &str) -> Option<&'static str> {
    let lang = match country {
        "US" | "GB" | "CA" | "AU" | "NZ" | "IE" | "IN" | "PH" | "SG" | "ZA" => "en",
        "FR" | "BE" | "CH" => "fr",
        "ES" | "MX" | "AR" | "CL" | "CO" | "PE" | "VE" => "es",
        "DE" | "AT" => "de",
        "IT" => "it",
        "PT" | "BR" => "pt",
        "RU" | "UA" => "ru",
        "CN" | "TW" | "HK" => "zh",
        "JP" => "ja",
        "KR" => "ko",
        "NL" => "nl",
        "SE" => "sv",
        "NO" => "no",
        "DK" => "da",
        "FI" => "fi",
        "PL" => "pl",
        "TR" => "tr",
        "GR" => "el",
        "IL" => "he",
        "SA" | "AE" | "EG" => "ar",
        _ => return None,
    };
    Some(lang)
}

/// 语言解析器
///
/// 持有策略管道和注入的语言配置。线程安全、无内部可变状态，
/// 可以在并发请求间共享。
pub struct LanguageResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
    active_languages: Vec<String>,
    default_language: String,
}

impl LanguageResolver {
    /// 从引擎配置创建解析器
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_languages(&config.active_languages, &config.default_language)
    }

    /// 直接指定语言集创建解析器
    pub fn with_languages(active: &[String], default_language: &str) -> Self {
        let strategies: Vec<Box<dyn ResolveStrategy>> = vec![
            Box::new(CookieStrategy),
            Box::new(QueryStrategy),
            Box::new(EdgeStrategy),
            Box::new(SubdomainStrategy),
            Box::new(GeoStrategy),
            Box::new(AcceptLanguageStrategy),
        ];

        // member_of 按小写比较，活跃集在入口统一规范化
        Self {
            strategies,
            active_languages: active.iter().map(|l| l.trim().to_lowercase()).collect(),
            default_language: default_language.to_lowercase(),
        }
    }

    /// 解析目标语言
    ///
    /// 按固定优先级遍历策略管道，首匹配即返回。全部落空（包括活跃
    /// 语言集为空或畸形的情况）时返回默认语言——永不失败，永不为空。
    pub fn resolve(&self, ctx: &ResolutionContext) -> String {
        for strategy in &self.strategies {
            if let Some(lang) = strategy.resolve(ctx, &self.active_languages) {
                tracing::debug!(strategy = strategy.name(), lang = %lang, "语言解析命中");
                return lang;
            }
        }

        tracing::debug!(lang = %self.default_language, "所有策略落空，使用默认语言");
        self.default_language.clone()
    }

    /// 检查语言是否属于活跃集
    pub fn is_active(&self, lang: &str) -> bool {
        let lang = lang.to_lowercase();
        self.active_languages.iter().any(|a| a == &lang)
    }

    /// 默认语言
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// 活跃语言集（配置顺序）
    pub fn active_languages(&self) -> &[String] {
        &self.active_languages
    }
}

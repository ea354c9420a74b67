//! 程序配置
//!
//! 默认值 → TOML 配置文件（`COMPANION_CONFIG`）→ 环境变量，后者覆盖前者。

use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};

/// 检索接口允许的最大返回条数
pub const MAX_SEARCH_LIMIT: usize = 20;

/// 检索方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// 全文检索
    #[default]
    Keyword,
    /// 向量语义检索
    Semantic,
}

impl SearchMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyword" | "fts" => Some(SearchMode::Keyword),
            "semantic" => Some(SearchMode::Semantic),
            _ => None,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 协作方 API 根地址
    pub api_base_url: String,
    /// 每次检索返回的片段数
    pub search_limit: usize,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 检索方式
    pub search_mode: SearchMode,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            search_limit: 6,
            request_timeout_secs: 30,
            search_mode: SearchMode::Keyword,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载
    pub fn load() -> AppResult<Self> {
        match std::env::var("COMPANION_CONFIG") {
            Ok(path) => Self::from_toml_file(Path::new(&path))?.with_env_overrides(),
            Err(_) => Self::from_env(),
        }
    }

    /// 只从环境变量加载（缺省项使用默认值）
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str, origin: &str) -> AppResult<Self> {
        let config: Config =
            toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
                path: origin.to_string(),
                source,
            })?;
        Ok(config.normalized())
    }

    fn with_env_overrides(mut self) -> AppResult<Self> {
        if let Ok(v) = std::env::var("API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = env_parsed::<usize>("SEARCH_LIMIT", "usize")? {
            self.search_limit = v;
        }
        if let Some(v) = env_parsed::<u64>("REQUEST_TIMEOUT_SECS", "u64")? {
            self.request_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("SEARCH_MODE") {
            self.search_mode =
                SearchMode::parse(&v).ok_or_else(|| ConfigError::EnvVarParseFailed {
                    var_name: "SEARCH_MODE".to_string(),
                    value: v.clone(),
                    expected_type: "keyword | semantic".to_string(),
                })?;
        }
        if let Some(v) = env_parsed::<bool>("VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        Ok(self.normalized())
    }

    fn normalized(mut self) -> Self {
        self.search_limit = self.search_limit.clamp(1, MAX_SEARCH_LIMIT);
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self
    }
}

fn env_parsed<T: std::str::FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}

//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API Key（为空则不启用认证）
    #[serde(default)]
    pub api_key: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Yahoo 图表接口（主数据源：价格与成交量）
    #[serde(default = "default_yahoo_chart_url")]
    pub yahoo_chart_url: String,
    /// Yahoo 基本面接口（主数据源：财务数据）
    #[serde(default = "default_yahoo_summary_url")]
    pub yahoo_summary_url: String,
    /// Nasdaq 接口根路径（备用数据源）
    #[serde(default = "default_nasdaq_api_url")]
    pub nasdaq_api_url: String,
    /// 请求 User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 图表时间范围
    #[serde(default = "default_chart_range")]
    pub chart_range: String,
    /// 图表 K 线周期
    #[serde(default = "default_chart_interval")]
    pub chart_interval: String,
    /// 批量查询最多股票数
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// API 配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 数据源配置
    #[serde(default)]
    pub providers: ProviderConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_yahoo_chart_url() -> String { "https://query1.finance.yahoo.com/v8/finance/chart".to_string() }
fn default_yahoo_summary_url() -> String { "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string() }
fn default_nasdaq_api_url() -> String { "https://api.nasdaq.com/api".to_string() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}
fn default_chart_range() -> String { "3mo".to_string() }
fn default_chart_interval() -> String { "1d".to_string() }
fn default_batch_limit() -> usize { 20 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            yahoo_chart_url: default_yahoo_chart_url(),
            yahoo_summary_url: default_yahoo_summary_url(),
            nasdaq_api_url: default_nasdaq_api_url(),
            user_agent: default_user_agent(),
            chart_range: default_chart_range(),
            chart_interval: default_chart_interval(),
            batch_limit: default_batch_limit(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值
    ///
    /// 环境变量 API_KEY 优先于配置文件中的 api_key。
    /// 此时日志系统尚未初始化，加载结果由 `LoadedConfig::log_outcome` 补记
    pub fn load() -> LoadedConfig {
        let mut loaded = Self::load_from(&["config.json", "config/config.json"]);

        if let Ok(api_key) = std::env::var("API_KEY") {
            loaded.config.api.api_key = api_key;
        }

        loaded
    }

    /// 按顺序尝试候选路径，使用第一个可以成功解析的文件
    pub fn load_from<P: AsRef<Path>>(paths: &[P]) -> LoadedConfig {
        let mut failures = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    return LoadedConfig {
                        config,
                        source: Some(path.display().to_string()),
                        failures,
                    };
                }
                Err(e) => failures.push((path.display().to_string(), e.to_string())),
            }
        }

        LoadedConfig {
            config: Self::default(),
            source: None,
            failures,
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 配置加载结果
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// 成功加载的配置文件，`None` 表示使用默认配置
    pub source: Option<String>,
    /// 解析失败的配置文件及错误信息
    pub failures: Vec<(String, String)>,
}

impl LoadedConfig {
    /// 日志系统初始化后输出加载过程
    pub fn log_outcome(&self) {
        for (path, error) in &self.failures {
            log::warn!("加载配置文件 {} 失败: {}", path, error);
        }
        match &self.source {
            Some(path) => log::info!("从 {} 加载配置成功", path),
            None => log::info!("使用默认配置"),
        }
    }
}

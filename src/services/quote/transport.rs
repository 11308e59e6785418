//! HTTP 传输层
//!
//! 报价组装只依赖 `JsonFetcher`，真实请求由 `HttpFetcher` 通过 reqwest 完成，
//! 测试中可替换为内存实现

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::config::{ApiConfig, ProviderConfig};

/// 获取 JSON 文档的传输接口
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// GET `url`（附带查询参数），返回解析后的 JSON
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value>;
}

/// 基于 reqwest 的传输实现
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(api: &ApiConfig, providers: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .user_agent(providers.user_agent.clone())
            .gzip(true)
            .cookie_store(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl JsonFetcher for HttpFetcher {
    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value> {
        log::debug!("📡 请求 URL: {}", url);

        let response = self
            .client
            .get(url)
            .query(query)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let body: Value = response.json().await?;
            return Ok(body);
        }

        // Yahoo 对未知代码返回 404 并附带 chart.error，保留给解析层判断
        if status == StatusCode::NOT_FOUND {
            if let Ok(body) = response.json::<Value>().await {
                if body["chart"]["error"].is_object() {
                    return Ok(body);
                }
            }
        }

        Err(anyhow!("请求 {} 失败: {}", url, status))
    }
}

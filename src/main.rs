//! 详细报价后端服务
//!
//! 提供股票详细报价的 RESTful API 服务
//! 数据来源：Yahoo Finance（主）、Nasdaq（备用）

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;
use crate::services::quote::{HttpFetcher, QuoteService};

/// 应用程序入口
///
/// 加载配置后启动 HTTP 服务器，默认监听 0.0.0.0:8080
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let loaded = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(loaded.config.log.level.as_str()));
    loaded.log_outcome();
    let config = loaded.config;

    if config.api.api_key.is_empty() {
        log::warn!("未设置 API Key，接口不做认证");
    }

    let fetcher = HttpFetcher::new(&config.api, &config.providers)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let quote_service = web::Data::new(QuoteService::new(
        Arc::new(fetcher),
        config.providers.clone(),
    ));

    let bind_addr = config.bind_addr();
    let api_key = config.api.api_key.clone();
    log::info!("启动报价后端服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(ApiKeyMiddleware::new(api_key.clone())) // API Key 认证
            .wrap(Logger::default()) // 请求日志
            .app_data(quote_service.clone())
            .configure(handlers::config) // 配置路由
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}

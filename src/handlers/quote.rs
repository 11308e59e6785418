//! 报价接口处理器
//!
//! ## API 列表
//! - GET /quotes/{symbol} - 获取详细报价
//! - GET /quotes?symbols=AAPL,MSFT - 批量获取详细报价

use actix_web::{web, HttpResponse, Result};
use crate::models::{ApiResponse, BatchQuoteItem, BatchQuoteQuery, DetailedQuote};
use crate::services::quote::{DataError, QuoteService};

/// 获取详细报价
///
/// GET /api/v1/quotes/{symbol}
///
/// # 参数
/// - symbol: 股票代码（如 AAPL）
pub async fn get_detailed_quote(
    service: web::Data<QuoteService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();

    match service.get_detailed_quote(&symbol).await {
        Ok(quote) => Ok(HttpResponse::Ok().json(ApiResponse::success(quote))),
        Err(e) => {
            log::warn!("获取 {} 详细报价失败: {}", symbol, e);
            let response = ApiResponse::<DetailedQuote>::error(e.to_string());
            let mut builder = match e {
                DataError::InvalidSymbol(_) => HttpResponse::BadRequest(),
                DataError::SymbolNotFound(_) => HttpResponse::NotFound(),
                _ => HttpResponse::BadGateway(),
            };
            Ok(builder.json(response))
        }
    }
}

/// 批量获取详细报价
///
/// GET /api/v1/quotes?symbols=AAPL,MSFT
///
/// 单个代码失败时在对应项中返回错误信息
pub async fn get_batch_quotes(
    service: web::Data<QuoteService>,
    query: web::Query<BatchQuoteQuery>,
) -> Result<HttpResponse> {
    if query.symbols.trim().is_empty() {
        let response = ApiResponse::<Vec<BatchQuoteItem>>::error("symbols 参数不能为空".to_string());
        return Ok(HttpResponse::BadRequest().json(response));
    }

    let items = service.get_batch_quotes(&query.symbols).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(items)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/quotes")
            .route("", web::get().to(get_batch_quotes))
            .route("/{symbol}", web::get().to(get_detailed_quote)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::services::quote::testing::MockFetcher;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn app_service(fetcher: MockFetcher) -> web::Data<QuoteService> {
        web::Data::new(QuoteService::new(Arc::new(fetcher), ProviderConfig::default()))
    }

    #[actix_web::test]
    async fn test_unknown_symbol_is_404() {
        let fetcher = MockFetcher::default().with(
            "https://query1.finance.yahoo.com/v8/finance/chart/ZZZZ",
            json!({ "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found" } } }),
        );
        let app = test::init_service(
            App::new().app_data(app_service(fetcher)).configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/quotes/ZZZZ").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["data"].is_null());
    }

    #[actix_web::test]
    async fn test_invalid_symbol_is_400() {
        let app = test::init_service(
            App::new().app_data(app_service(MockFetcher::default())).configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/quotes/%3Cscript%3E").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_chart_outage_is_502() {
        let app = test::init_service(
            App::new().app_data(app_service(MockFetcher::default())).configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/quotes/AAPL").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);
    }

    #[actix_web::test]
    async fn test_batch_reports_errors_inline() {
        let app = test::init_service(
            App::new().app_data(app_service(MockFetcher::default())).configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/quotes?symbols=AAPL,MSFT").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        let items = body["data"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|item| item["error"].is_string()));

        let req = test::TestRequest::get().uri("/quotes?symbols=").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}

//! 详细报价服务
//!
//! 把两个结构不同的数据源合并成一条自洽的详细报价
//!
//! ## 数据来源
//! - Yahoo：图表（价格/成交量，必需）和基本面（尽力获取）
//! - Nasdaq：主数据源缺少关键字段时的备用来源
//!
//! ## 处理流程
//! 1. 获取图表数据，失败即返回错误
//! 2. 获取基本面数据，失败降级为空
//! 3. 解析生成报价草稿
//! 4. 关键字段缺失时并发请求备用数据源并填补
//! 5. 计算 VWAP、相对成交量和量价信号，输出结果

mod common;
mod draft;
mod error;
mod extract;
mod nasdaq;
mod signal;
mod transport;
mod ttm;
mod yahoo;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;

use crate::config::ProviderConfig;
use crate::models::{BatchQuoteItem, DetailedQuote};

pub use error::DataError;
pub use transport::{HttpFetcher, JsonFetcher};

use common::{normalize_symbol, YAHOO_SUMMARY_MODULES};
use yahoo::Fundamentals;

/// 详细报价服务
///
/// 无状态：每次请求独立组装，不缓存
#[derive(Clone)]
pub struct QuoteService {
    fetcher: Arc<dyn JsonFetcher>,
    providers: ProviderConfig,
}

impl QuoteService {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, providers: ProviderConfig) -> Self {
        Self { fetcher, providers }
    }

    /// 获取详细报价
    ///
    /// 只有代码无效或图表数据不可用时返回错误，其余数据缺失表现为 0 值字段
    pub async fn get_detailed_quote(&self, symbol: &str) -> Result<DetailedQuote, DataError> {
        let symbol =
            normalize_symbol(symbol).ok_or_else(|| DataError::InvalidSymbol(symbol.to_string()))?;

        let chart_data = self
            .fetcher
            .get_json(
                &yahoo::chart_url(&self.providers.yahoo_chart_url, &symbol),
                &[
                    ("range", self.providers.chart_range.as_str()),
                    ("interval", self.providers.chart_interval.as_str()),
                ],
            )
            .await
            .map_err(|source| DataError::ChartUnavailable {
                symbol: symbol.clone(),
                source,
            })?;
        let chart = yahoo::parse_chart(&symbol, &chart_data)?;

        let fundamentals = self.fetch_fundamentals(&symbol).await;
        let mut draft = yahoo::build_draft(chart, &fundamentals)?;

        let used_fallback = nasdaq::needs_fallback(&draft);
        if used_fallback {
            let bundle =
                nasdaq::fetch_fallback(self.fetcher.as_ref(), &self.providers.nasdaq_api_url, &symbol)
                    .await;
            let patched = nasdaq::apply_fallback(&mut draft, &bundle);
            log::debug!("{} 备用数据源填补字段: {:?}", symbol, patched);

            draft.resolve_pe_eps();
            draft.derive_price_to_sales();
        }

        let vwap = signal::vwap(&draft.history);
        let avg_volume = signal::average_volume(&draft.history);
        let rvol = signal::relative_volume(draft.volume, avg_volume);
        let volume_signal = signal::volume_signal(draft.price, vwap, rvol);

        log::info!(
            "{} 报价组装完成: 价格 {} 信号 {:?} 备用数据源 {}",
            symbol,
            draft.price,
            volume_signal,
            if used_fallback { "已使用" } else { "未使用" }
        );

        Ok(draft.into_quote(avg_volume, vwap, volume_signal))
    }

    /// 批量获取详细报价
    ///
    /// 去重后最多处理 `batch_limit` 个代码，各代码并发独立组装，单个失败不影响其他
    pub async fn get_batch_quotes(&self, symbols: &str) -> Vec<BatchQuoteItem> {
        let mut seen = HashSet::new();
        let symbols: Vec<String> = symbols
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .take(self.providers.batch_limit)
            .collect();

        let tasks = symbols.into_iter().map(|symbol| async move {
            match self.get_detailed_quote(&symbol).await {
                Ok(quote) => BatchQuoteItem {
                    symbol,
                    quote: Some(quote),
                    error: None,
                },
                Err(e) => {
                    log::warn!("批量报价中 {} 失败: {}", symbol, e);
                    BatchQuoteItem {
                        symbol,
                        quote: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        });

        join_all(tasks).await
    }

    /// 获取基本面数据，失败时返回空数据包
    async fn fetch_fundamentals(&self, symbol: &str) -> Fundamentals {
        let url = yahoo::summary_url(&self.providers.yahoo_summary_url, symbol);

        match self
            .fetcher
            .get_json(&url, &[("modules", YAHOO_SUMMARY_MODULES)])
            .await
        {
            Ok(data) => Fundamentals::from_summary(&data),
            Err(e) => {
                log::warn!("{} 基本面数据获取失败，降级为空: {}", symbol, e);
                Fundamentals::default()
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockFetcher;
    use super::*;
    use crate::models::VolumeSignal;
    use serde_json::{json, Value};

    const CHART: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
    const SUMMARY: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
    const NASDAQ: &str = "https://api.nasdaq.com/api";

    fn chart(symbol: &str, price: f64, volume: u64) -> Value {
        json!({
            "chart": { "result": [{
                "meta": {
                    "symbol": symbol,
                    "currency": "USD",
                    "regularMarketPrice": price,
                    "chartPreviousClose": 100.0,
                    "regularMarketVolume": volume
                },
                "timestamp": [1_704_205_800_i64, 1_704_292_200_i64],
                "indicators": { "quote": [{ "close": [100.0, 100.0], "volume": [1000, 1000] }] }
            }], "error": null }
        })
    }

    fn full_summary() -> Value {
        json!({ "quoteSummary": { "result": [{
            "financialData": { "revenueGrowth": { "raw": 0.08 }, "recommendationKey": "hold" },
            "defaultKeyStatistics": {
                "pegRatio": { "raw": 2.0 },
                "trailingEps": { "raw": 5.0 },
                "sharesOutstanding": { "raw": 1000.0 }
            },
            "summaryDetail": { "marketCap": { "raw": 105000.0 } },
            "incomeStatementHistoryQuarterly": { "incomeStatementHistory": [
                { "totalRevenue": { "raw": 100.0 } }
            ]},
            "balanceSheetHistoryQuarterly": { "balanceSheetStatements": [
                { "cash": { "raw": 500.0 } }
            ]}
        }]}})
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn service(fetcher: MockFetcher) -> (QuoteService, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        let service = QuoteService::new(fetcher.clone(), ProviderConfig::default());
        (service, fetcher)
    }

    #[tokio::test]
    async fn test_complete_primary_skips_fallback() {
        let (service, fetcher) = service(
            MockFetcher::default()
                .with(&format!("{}/AAPL", CHART), chart("AAPL", 105.0, 1500))
                .with(&format!("{}/AAPL", SUMMARY), full_summary()),
        );

        let quote = service.get_detailed_quote("aapl").await.unwrap();

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.pe_ratio, 21.0);
        assert_eq!(quote.revenue_growth, 0.08);
        assert_eq!(quote.recommendation_key, "hold");
        assert_eq!(quote.valuation_fields.revenue_ttm, 100.0);
        assert_eq!(quote.valuation_fields.cash_and_equivalents, 500.0);
        assert_eq!(quote.vwap, Some(100.0));
        assert_eq!(quote.avg_volume, 1000.0);
        assert_eq!(quote.volume_signal, VolumeSignal::Bullish);
        assert_eq!(fetcher.requested_count("nasdaq"), 0);

        assert_eq!(
            fetcher.queries_for("/chart/AAPL"),
            vec![pairs(&[("range", "3mo"), ("interval", "1d")])]
        );
        assert_eq!(
            fetcher.queries_for("/quoteSummary/AAPL"),
            vec![pairs(&[("modules", YAHOO_SUMMARY_MODULES)])]
        );
    }

    #[tokio::test]
    async fn test_missing_fundamentals_uses_fallback() {
        let (service, fetcher) = service(
            MockFetcher::default()
                .with(&format!("{}/MSFT", CHART), chart("MSFT", 95.0, 1500))
                .with(
                    &format!("{}/quote/MSFT/summary", NASDAQ),
                    json!({ "data": { "summaryData": { "MarketCap": { "value": "95,000" } } } }),
                )
                .with(
                    &format!("{}/company/MSFT/financials", NASDAQ),
                    json!({ "data": {
                        "incomeStatementTable": { "rows": [{ "value1": "Total Revenue", "value2": "$10" }] },
                        "balanceSheetTable": { "rows": [{ "value1": "Total Cash", "value2": "$3" }] },
                        "cashFlowTable": { "rows": [] }
                    }}),
                ),
        );

        let quote = service.get_detailed_quote("MSFT").await.unwrap();

        assert_eq!(quote.market_cap, 95_000.0);
        assert_eq!(quote.valuation_fields.shares_outstanding, 1_000.0);
        assert_eq!(quote.valuation_fields.revenue_qtr, 10_000.0);
        assert_eq!(quote.valuation_fields.revenue_ttm, 40_000.0);
        assert_eq!(quote.valuation_fields.cash_and_equivalents, 3_000.0);
        // EPS 历史获取失败：不填补，增长率使用默认占位
        assert_eq!(quote.eps, 0.0);
        assert_eq!(quote.revenue_growth, 0.10);
        assert_eq!(quote.recommendation_key, "N/A");
        assert_eq!(quote.volume_signal, VolumeSignal::Bearish);
        assert_eq!(fetcher.requested_count("/financials"), 3);
        assert_eq!(fetcher.requested_count("nasdaq"), 5);

        // 三张报表共用同一财报文档，各自请求一次
        let statements = fetcher.queries_for("/financials");
        assert!(statements.iter().all(|q| *q == pairs(&[("frequency", "2")])));
        assert_eq!(
            fetcher.queries_for("/quote/MSFT/summary"),
            vec![pairs(&[("assetclass", "stocks")])]
        );
        assert_eq!(
            fetcher.queries_for("/quote/MSFT/eps"),
            vec![pairs(&[("assetclass", "stocks")])]
        );
    }

    #[tokio::test]
    async fn test_chart_failure_is_hard_error() {
        let (service, _) = service(MockFetcher::default());

        let err = service.get_detailed_quote("NVDA").await.unwrap_err();
        assert!(matches!(err, DataError::ChartUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_symbols() {
        let (service, fetcher) = service(MockFetcher::default().with(
            &format!("{}/ZZZZ", CHART),
            json!({ "chart": { "result": null, "error": { "code": "Not Found", "description": "No data found" } } }),
        ));

        let err = service.get_detailed_quote("zzzz").await.unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound(_)));

        let err = service.get_detailed_quote("not a symbol").await.unwrap_err();
        assert!(matches!(err, DataError::InvalidSymbol(_)));
        assert_eq!(fetcher.requested_count(""), 1);
    }

    #[tokio::test]
    async fn test_batch_quotes_report_failures_inline() {
        let (service, _) = service(
            MockFetcher::default()
                .with(&format!("{}/AAPL", CHART), chart("AAPL", 105.0, 1500))
                .with(&format!("{}/AAPL", SUMMARY), full_summary()),
        );

        let items = service.get_batch_quotes("aapl, NVDA,AAPL,,").await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].symbol, "AAPL");
        assert!(items[0].quote.is_some());
        assert_eq!(items[1].symbol, "NVDA");
        assert!(items[1].error.is_some());
    }
}

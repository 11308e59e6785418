//! Yahoo 主数据源解析
//!
//! - 图表接口：价格、昨收、成交量、日线历史（硬依赖）
//! - 基本面接口：financialData / defaultKeyStatistics / summaryDetail / assetProfile
//!   以及三张季度报表（尽力获取）

use chrono::DateTime;
use serde_json::Value;

use crate::models::QuoteHistoryPoint;

use super::common::{sum_known, HISTORY_WINDOW};
use super::draft::{QuoteDraft, ValuationDraft};
use super::error::DataError;
use super::extract::{raw_value, text_value};
use super::ttm::{annualize_if_empty, latest_quarter, sum_ttm};

// ==================== 报表字段同义词 ====================

const REVENUE: &[&str] = &["totalRevenue", "revenue"];
const NET_INCOME: &[&str] = &[
    "netIncome",
    "netIncomeCommonStockholders",
    "netIncomeContinuousOperations",
];
const OPERATING_CASH_FLOW: &[&str] = &[
    "totalCashFromOperatingActivities",
    "operatingCashFlow",
    "operatingCashflow",
];
const CAPITAL_EXPENDITURE: &[&str] = &["capitalExpenditures", "capitalExpenditure"];
const COST_OF_REVENUE: &[&str] = &["costOfRevenue", "reconciledCostOfRevenue"];
const OPERATING_EXPENSES: &[&str] = &["totalOperatingExpenses", "operatingExpense", "operatingExpenses"];
const OPERATING_INCOME: &[&str] = &["operatingIncome", "totalOperatingIncomeAsReported"];
const CASH: &[&str] = &["cashAndCashEquivalents", "cash", "cashCashEquivalentsAndShortTermInvestments"];
const LONG_TERM_DEBT: &[&str] = &["longTermDebt"];
const SHORT_TERM_DEBT: &[&str] = &["shortLongTermDebt", "currentDebt", "shortTermDebt"];

/// 图表接口 URL
pub fn chart_url(base: &str, symbol: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), symbol)
}

/// 基本面接口 URL
pub fn summary_url(base: &str, symbol: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), symbol)
}

/// 图表接口解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub symbol: String,
    pub currency: String,
    pub price: f64,
    pub previous_close: f64,
    pub volume: u64,
    pub history: Vec<QuoteHistoryPoint>,
}

/// 涨跌幅（百分比），昨收为 0 时报错
pub fn percent_change(symbol: &str, price: f64, previous_close: f64) -> Result<f64, DataError> {
    if previous_close == 0.0 || !previous_close.is_finite() {
        return Err(DataError::InvalidPreviousClose(symbol.to_string()));
    }
    Ok((price - previous_close) / previous_close * 100.0)
}

/// 解析图表接口响应
///
/// 响应格式: { chart: { result: [{ meta, timestamp, indicators: { quote: [{ close, volume }] } }], error } }
pub fn parse_chart(symbol: &str, data: &Value) -> Result<ChartSnapshot, DataError> {
    let chart = &data["chart"];

    let error = &chart["error"];
    if error.is_object() {
        let description = error["description"].as_str().unwrap_or("未知错误");
        log::warn!("{} 图表接口返回错误: {}", symbol, description);
        // 只有 Not Found 代表代码不存在，其余错误视为数据源异常
        if error["code"].as_str() == Some("Not Found") {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        return Err(DataError::MalformedChart {
            symbol: symbol.to_string(),
            reason: description.to_string(),
        });
    }

    let result = chart["result"]
        .as_array()
        .and_then(|arr| arr.first())
        .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;

    let meta = &result["meta"];
    let quote = &result["indicators"]["quote"][0];

    let timestamps = number_array(&result["timestamp"]);
    let closes = number_array(&quote["close"]);
    let volumes = number_array(&quote["volume"]);

    // 从后往前找最后一个收盘价和成交量都存在的位置
    let last_valid = closes
        .iter()
        .zip(volumes.iter())
        .rposition(|(c, v)| c.is_some() && v.is_some());

    let price = raw_value(meta, &["regularMarketPrice"])
        .or_else(|| last_valid.and_then(|i| closes[i]))
        .ok_or_else(|| DataError::MalformedChart {
            symbol: symbol.to_string(),
            reason: "缺少 regularMarketPrice".to_string(),
        })?;

    let previous_close = raw_value(meta, &["chartPreviousClose", "previousClose"]).unwrap_or(0.0);

    let volume = raw_value(meta, &["regularMarketVolume"])
        .or_else(|| last_valid.and_then(|i| volumes[i]))
        .map(|v| v.max(0.0) as u64)
        .unwrap_or(0);

    let history = build_history(&timestamps, &closes, &volumes);

    Ok(ChartSnapshot {
        symbol: text_value(meta, "symbol").unwrap_or_else(|| symbol.to_string()),
        currency: text_value(meta, "currency").unwrap_or_else(|| "USD".to_string()),
        price,
        previous_close,
        volume,
        history,
    })
}

fn number_array(node: &Value) -> Vec<Option<f64>> {
    node.as_array()
        .map(|arr| arr.iter().map(Value::as_f64).collect())
        .unwrap_or_default()
}

/// 组合时间戳/收盘价/成交量，保留有效交易日中最近的 30 个
fn build_history(
    timestamps: &[Option<f64>],
    closes: &[Option<f64>],
    volumes: &[Option<f64>],
) -> Vec<QuoteHistoryPoint> {
    let mut history: Vec<QuoteHistoryPoint> = Vec::new();

    for ((ts, close), volume) in timestamps.iter().zip(closes).zip(volumes) {
        let (Some(ts), Some(close), Some(volume)) = (ts, close, volume) else {
            continue;
        };
        if *close <= 0.0 || *volume <= 0.0 {
            continue;
        }
        let Some(date) = DateTime::from_timestamp(*ts as i64, 0) else {
            continue;
        };

        let point = QuoteHistoryPoint {
            date: date.format("%Y-%m-%d").to_string(),
            close: *close,
            volume: *volume as u64,
        };

        // 同一天出现多条（盘中实时 K 线）时保留最后一条
        match history.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => history.push(point),
        }
    }

    let skip = history.len().saturating_sub(HISTORY_WINDOW);
    history.split_off(skip)
}

/// 基本面数据包
///
/// 获取失败时使用 `Default`（全部为空），不影响整体请求
#[derive(Debug, Clone, Default)]
pub struct Fundamentals {
    pub financial_data: Value,
    pub key_statistics: Value,
    pub summary_detail: Value,
    pub asset_profile: Value,
    /// 季度利润表（最新在前）
    pub income: Vec<Value>,
    /// 季度资产负债表（最新在前）
    pub balance: Vec<Value>,
    /// 季度现金流量表（最新在前）
    pub cashflow: Vec<Value>,
}

impl Fundamentals {
    /// 解析基本面接口响应: { quoteSummary: { result: [{ financialData, ... }] } }
    pub fn from_summary(data: &Value) -> Self {
        let Some(result) = data["quoteSummary"]["result"]
            .as_array()
            .and_then(|arr| arr.first())
        else {
            return Self::default();
        };

        let statements = |module: &str, list: &str| -> Vec<Value> {
            result[module][list].as_array().cloned().unwrap_or_default()
        };

        Self {
            financial_data: result["financialData"].clone(),
            key_statistics: result["defaultKeyStatistics"].clone(),
            summary_detail: result["summaryDetail"].clone(),
            asset_profile: result["assetProfile"].clone(),
            income: statements("incomeStatementHistoryQuarterly", "incomeStatementHistory"),
            balance: statements("balanceSheetHistoryQuarterly", "balanceSheetStatements"),
            cashflow: statements("cashflowStatementHistoryQuarterly", "cashflowStatements"),
        }
    }
}

/// 由图表和基本面数据生成报价草稿
pub fn build_draft(chart: ChartSnapshot, fundamentals: &Fundamentals) -> Result<QuoteDraft, DataError> {
    let change_percent = percent_change(&chart.symbol, chart.price, chart.previous_close)?;
    let price = chart.price;

    let financial = &fundamentals.financial_data;
    let stats = &fundamentals.key_statistics;
    let detail = &fundamentals.summary_detail;

    let market_cap = raw_value(detail, &["marketCap"]).or_else(|| raw_value(stats, &["marketCap"]));

    let dividend_rate = raw_value(detail, &["dividendRate"])
        .or_else(|| raw_value(detail, &["dividendYield"]).map(|y| y * price));

    let mut draft = QuoteDraft {
        symbol: chart.symbol,
        currency: chart.currency,
        price,
        change_percent,
        volume: chart.volume,
        history: chart.history,
        market_cap,
        pe_ratio: raw_value(detail, &["trailingPE"])
            .or_else(|| raw_value(detail, &["forwardPE"]))
            .or_else(|| raw_value(stats, &["forwardPE"])),
        peg_ratio: raw_value(stats, &["pegRatio"]),
        eps: raw_value(stats, &["trailingEps"]),
        book_value: raw_value(stats, &["bookValue"]),
        revenue_growth: raw_value(financial, &["revenueGrowth"])
            .or_else(|| raw_value(financial, &["earningsGrowth"])),
        dividend_rate,
        target_mean_price: raw_value(financial, &["targetMeanPrice"]),
        recommendation_key: text_value(financial, "recommendationKey"),
        description: text_value(&fundamentals.asset_profile, "longBusinessSummary"),
        valuation: parse_valuation(fundamentals),
    };

    draft.resolve_pe_eps();
    draft.derive_shares_outstanding();
    draft.derive_price_to_sales();

    Ok(draft)
}

/// 从三张季度报表和汇总数据提取估值字段
fn parse_valuation(fundamentals: &Fundamentals) -> ValuationDraft {
    let income = &fundamentals.income;
    let balance = &fundamentals.balance;
    let cashflow = &fundamentals.cashflow;
    let financial = &fundamentals.financial_data;

    let revenue_qtr = latest_quarter(income, REVENUE);
    let revenue_ttm = annualize_if_empty(sum_ttm(income, REVENUE), revenue_qtr);

    let net_income_ttm = annualize_if_empty(
        sum_ttm(income, NET_INCOME),
        latest_quarter(income, NET_INCOME),
    );

    // 资本支出按惯例为负数，相加即为扣除
    let fcf_ttm = annualize_if_empty(
        sum_known([
            sum_ttm(cashflow, OPERATING_CASH_FLOW),
            sum_ttm(cashflow, CAPITAL_EXPENDITURE),
        ]),
        sum_known([
            latest_quarter(cashflow, OPERATING_CASH_FLOW),
            latest_quarter(cashflow, CAPITAL_EXPENDITURE),
        ]),
    );

    let cash_and_equivalents =
        latest_quarter(balance, CASH).or_else(|| raw_value(financial, &["totalCash"]));

    let total_debt = raw_value(financial, &["totalDebt"]).or_else(|| {
        sum_known([
            latest_quarter(balance, LONG_TERM_DEBT),
            latest_quarter(balance, SHORT_TERM_DEBT),
        ])
    });

    ValuationDraft {
        revenue_qtr,
        revenue_ttm,
        net_income_ttm,
        fcf_ttm,
        cost_of_revenue: latest_quarter(income, COST_OF_REVENUE),
        operating_expenses: latest_quarter(income, OPERATING_EXPENSES),
        operating_income: latest_quarter(income, OPERATING_INCOME),
        cash_and_equivalents,
        total_debt,
        shares_outstanding: raw_value(&fundamentals.key_statistics, &["sharesOutstanding"]),
        price_to_sales: raw_value(
            &fundamentals.summary_detail,
            &["priceToSalesTrailing12Months"],
        ),
    }
}

//! Nasdaq 备用数据源
//!
//! 主数据源缺少关键字段时触发：并发获取摘要、EPS 历史和三张财报，
//! 按标签模糊匹配后只填补仍未解析的字段，已有值一律不覆盖。
//!
//! 财报数值以千为单位，由 `LabeledRows` 统一换算。

use futures::join;
use serde_json::Value;

use super::common::{
    checked_div, parse_display_number, parse_grouped_integer, sum_known, FALLBACK_EPS_GROWTH,
    TTM_QUARTERS,
};
use super::draft::QuoteDraft;
use super::extract::LabeledRows;
use super::transport::JsonFetcher;

/// 财报行标签（模糊匹配，忽略大小写）
pub mod labels {
    pub const TOTAL_REVENUE: &str = "Total Revenue";
    pub const COST_OF_REVENUE: &str = "Cost of Revenue";
    pub const OPERATING_INCOME: &str = "Operating Income";
    pub const RESEARCH_AND_DEVELOPMENT: &str = "Research and Development";
    pub const SGA: &str = "Sales, General and Admin.";
    pub const NET_INCOME: &str = "Net Income";

    pub const TOTAL_CASH: &str = "Total Cash";
    pub const CASH: &[&str] = &["Cash and Cash Equivalents", "Cash"];
    pub const SHORT_TERM_INVESTMENTS: &str = "Short-Term Investments";
    pub const LONG_TERM_DEBT: &str = "Long-Term Debt";
    /// 按顺序取第一个命中的，不累加
    pub const CURRENT_DEBT: &[&str] = &[
        "Current Debt",
        "Short-Term Debt",
        "Current Portion of Long-Term Debt",
    ];

    pub const OPERATING_ACTIVITIES: &str = "Operating Activities";
    pub const CAPITAL_EXPENDITURES: &[&str] = &["Capital Expenditures", "Property, Plant"];
}

/// 财报类型，对应 financials 响应中的表名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Income,
    Balance,
    CashFlow,
}

impl Statement {
    fn table_key(self) -> &'static str {
        match self {
            Statement::Income => "incomeStatementTable",
            Statement::Balance => "balanceSheetTable",
            Statement::CashFlow => "cashFlowTable",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Statement::Income => "利润表",
            Statement::Balance => "资产负债表",
            Statement::CashFlow => "现金流量表",
        }
    }

    /// 读取 `data.<table>.rows`，兼容直接的 `data.rows`
    pub fn rows(self, data: &Value) -> LabeledRows {
        let table_rows = &data["data"][self.table_key()]["rows"];
        if table_rows.is_array() {
            LabeledRows::from_value(table_rows)
        } else {
            LabeledRows::from_value(&data["data"]["rows"])
        }
    }
}

/// 是否需要请求备用数据源
///
/// PEG、PE、最近一季营收、现金、流通股数任一未解析即触发
pub fn needs_fallback(draft: &QuoteDraft) -> bool {
    draft.peg_ratio.is_none()
        || draft.pe_ratio.is_none()
        || draft.valuation.revenue_qtr.is_none()
        || draft.valuation.cash_and_equivalents.is_none()
        || draft.valuation.shares_outstanding.is_none()
}

/// 备用数据源的五个响应，单个失败时为空
#[derive(Debug, Clone, Default)]
pub struct FallbackBundle {
    pub summary: Value,
    pub eps_history: Value,
    pub income: LabeledRows,
    pub balance: LabeledRows,
    pub cashflow: LabeledRows,
}

impl FallbackBundle {
    /// 摘要中的市值，如 "2,876,543,210"
    pub fn market_cap(&self) -> Option<f64> {
        let summary = &self.summary["data"]["summaryData"];
        let cell = summary["MarketCap"]["value"]
            .as_str()
            .or_else(|| summary["MarketCap"].as_str())?;
        parse_grouped_integer(cell).filter(|v| *v > 0.0)
    }

    /// 最近四个有效季度 EPS 之和，不足四个返回 None
    ///
    /// 列表按时间正序排列，跳过未公布（预期）季度
    pub fn trailing_eps(&self) -> Option<f64> {
        let entries = self.eps_history["data"]["earningsPerShare"].as_array()?;

        let valid: Vec<f64> = entries
            .iter()
            .filter(|e| e["type"].as_str() != Some("UpcomingQuarter"))
            .filter_map(|e| match &e["earnings"] {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => parse_display_number(s),
                _ => None,
            })
            .collect();

        if valid.len() < TTM_QUARTERS {
            return None;
        }

        Some(valid[valid.len() - TTM_QUARTERS..].iter().sum())
    }
}

/// 摘要接口 URL
pub fn summary_url(base: &str, symbol: &str) -> String {
    format!("{}/quote/{}/summary", base.trim_end_matches('/'), symbol)
}

/// EPS 历史接口 URL
pub fn eps_url(base: &str, symbol: &str) -> String {
    format!("{}/quote/{}/eps", base.trim_end_matches('/'), symbol)
}

/// 财报接口 URL
pub fn financials_url(base: &str, symbol: &str) -> String {
    format!("{}/company/{}/financials", base.trim_end_matches('/'), symbol)
}

/// 并发获取五个备用响应，单个失败只记录日志
///
/// 利润表、资产负债表、现金流量表都来自同一个季度财报文档（frequency=2），
/// 每张表单独请求一次并只读取自己的表格，某张表请求失败不影响其他两张
pub async fn fetch_fallback(fetcher: &dyn JsonFetcher, base: &str, symbol: &str) -> FallbackBundle {
    let summary_url = summary_url(base, symbol);
    let eps_url = eps_url(base, symbol);
    let financials_url = financials_url(base, symbol);

    let (summary, eps_history, income, balance, cashflow) = join!(
        fetcher.get_json(&summary_url, &[("assetclass", "stocks")]),
        fetcher.get_json(&eps_url, &[("assetclass", "stocks")]),
        fetch_statement(fetcher, &financials_url, symbol, Statement::Income),
        fetch_statement(fetcher, &financials_url, symbol, Statement::Balance),
        fetch_statement(fetcher, &financials_url, symbol, Statement::CashFlow),
    );

    FallbackBundle {
        summary: summary.unwrap_or_else(|e| {
            log::warn!("{} 备用摘要获取失败: {}", symbol, e);
            Value::Null
        }),
        eps_history: eps_history.unwrap_or_else(|e| {
            log::warn!("{} 备用 EPS 历史获取失败: {}", symbol, e);
            Value::Null
        }),
        income,
        balance,
        cashflow,
    }
}

async fn fetch_statement(
    fetcher: &dyn JsonFetcher,
    url: &str,
    symbol: &str,
    statement: Statement,
) -> LabeledRows {
    match fetcher.get_json(url, &[("frequency", "2")]).await {
        Ok(data) => {
            let rows = statement.rows(&data);
            if rows.is_empty() {
                log::debug!("{} 备用{}没有数据行", symbol, statement.name());
            }
            rows
        }
        Err(e) => {
            log::warn!("{} 备用{}获取失败: {}", symbol, statement.name(), e);
            LabeledRows::default()
        }
    }
}

/// 只在 `slot` 未解析时写入，返回是否写入
fn fill(
    slot: &mut Option<f64>,
    value: Option<f64>,
    field: &'static str,
    patched: &mut Vec<&'static str>,
) -> bool {
    if slot.is_some() {
        return false;
    }
    match value {
        Some(v) => {
            log::debug!("备用数据源填补 {} = {}", field, v);
            *slot = Some(v);
            patched.push(field);
            true
        }
        None => false,
    }
}

/// 用备用数据填补草稿，返回被填补的字段名
///
/// 已解析字段不会被覆盖，因此重复调用结果不变
pub fn apply_fallback(draft: &mut QuoteDraft, bundle: &FallbackBundle) -> Vec<&'static str> {
    let mut patched = Vec::new();

    fill(&mut draft.market_cap, bundle.market_cap(), "marketCap", &mut patched);

    if fill(&mut draft.eps, bundle.trailing_eps(), "eps", &mut patched) {
        fill(
            &mut draft.revenue_growth,
            Some(FALLBACK_EPS_GROWTH),
            "revenueGrowth",
            &mut patched,
        );
    }

    let shares = checked_div(draft.market_cap, Some(draft.price));
    let v = &mut draft.valuation;
    fill(&mut v.shares_outstanding, shares, "sharesOutstanding", &mut patched);

    // 利润表
    let income = &bundle.income;
    if fill(&mut v.revenue_qtr, income.lookup(labels::TOTAL_REVENUE), "revenueQtr", &mut patched) {
        // 此路径只有最新一季，按 ×4 年化
        fill(&mut v.revenue_ttm, v.revenue_qtr.map(|q| q * 4.0), "revenueTtm", &mut patched);
    }
    fill(&mut v.cost_of_revenue, income.lookup(labels::COST_OF_REVENUE), "costOfRevenue", &mut patched);
    fill(&mut v.operating_income, income.lookup(labels::OPERATING_INCOME), "operatingIncome", &mut patched);
    fill(
        &mut v.operating_expenses,
        sum_known([
            income.lookup(labels::RESEARCH_AND_DEVELOPMENT),
            income.lookup(labels::SGA),
        ]),
        "operatingExpenses",
        &mut patched,
    );
    fill(
        &mut v.net_income_ttm,
        income.lookup(labels::NET_INCOME).map(|n| n * 4.0),
        "netIncomeTtm",
        &mut patched,
    );

    // 资产负债表
    let balance = &bundle.balance;
    let cash = balance
        .lookup(labels::TOTAL_CASH)
        .filter(|c| *c > 0.0)
        .or_else(|| {
            sum_known([
                balance.lookup_any(labels::CASH),
                balance.lookup(labels::SHORT_TERM_INVESTMENTS),
            ])
            .filter(|c| *c > 0.0)
        });
    fill(&mut v.cash_and_equivalents, cash, "cashAndEquivalents", &mut patched);
    fill(
        &mut v.total_debt,
        sum_known([
            balance.lookup(labels::LONG_TERM_DEBT),
            balance.lookup_any(labels::CURRENT_DEBT),
        ]),
        "totalDebt",
        &mut patched,
    );

    // 现金流量表
    let cashflow = &bundle.cashflow;
    fill(
        &mut v.fcf_ttm,
        sum_known([
            cashflow.lookup(labels::OPERATING_ACTIVITIES),
            cashflow.lookup_any(labels::CAPITAL_EXPENDITURES),
        ])
        .map(|f| f * 4.0),
        "fcfTtm",
        &mut patched,
    );

    patched
}

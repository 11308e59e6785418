//! 详细报价数据模型
//!
//! 定义对外输出的报价结构，包括：
//! - 历史收盘价/成交量序列
//! - 估值字段（营收、利润、现金、负债等）
//! - 组装完成的详细报价

use serde::{Deserialize, Serialize};

/// 单日历史数据点
///
/// 仅保留收盘价和成交量均为正的交易日
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuoteHistoryPoint {
    /// 日期（YYYY-MM-DD）
    pub date: String,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: u64,
}

/// 估值字段
///
/// 所有字段在未知时输出为 0（下游依赖 `=== 0` 判断未解析）
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValuationFields {
    /// 最近一季营收
    pub revenue_qtr: f64,
    /// 近四季（TTM）营收
    pub revenue_ttm: f64,
    /// TTM 净利润
    pub net_income_ttm: f64,
    /// TTM 自由现金流
    pub fcf_ttm: f64,
    /// 营业成本
    pub cost_of_revenue: f64,
    /// 营业费用
    pub operating_expenses: f64,
    /// 营业利润
    pub operating_income: f64,
    /// 现金及等价物
    pub cash_and_equivalents: f64,
    /// 总负债
    pub total_debt: f64,
    /// 流通股数
    pub shares_outstanding: f64,
    /// 市销率
    pub price_to_sales: f64,
}

/// 量价信号
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum VolumeSignal {
    Bullish,
    Bearish,
    Neutral,
}

/// 详细报价
///
/// 每次请求重新计算，不缓存
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DetailedQuote {
    /// 股票代码
    pub symbol: String,
    /// 当前价格
    pub price: f64,
    /// 币种
    pub currency: String,
    /// 相对昨收涨跌幅（百分比）
    pub change_percent: f64,
    /// 当前成交量
    pub volume: u64,
    /// 历史平均成交量
    pub avg_volume: f64,
    /// 总市值
    pub market_cap: f64,
    /// 市盈率
    pub pe_ratio: f64,
    /// PEG
    pub peg_ratio: f64,
    /// 每股收益
    pub eps: f64,
    /// 每股净资产
    pub book_value: f64,
    /// 营收增长率
    pub revenue_growth: f64,
    /// 每股分红
    pub dividend_rate: f64,
    /// 成交量加权均价
    pub vwap: Option<f64>,
    /// 分析师目标均价
    pub target_mean_price: Option<f64>,
    /// 分析师评级（缺失为 "N/A"）
    pub recommendation_key: String,
    /// 公司简介
    pub description: String,
    /// 历史数据（按日期升序，最多 30 条）
    pub history: Vec<QuoteHistoryPoint>,
    /// 量价信号
    pub volume_signal: VolumeSignal,
    /// 估值字段
    pub valuation_fields: ValuationFields,
}

/// 批量报价查询参数
#[derive(Debug, Deserialize)]
pub struct BatchQuoteQuery {
    /// 逗号分隔的股票代码列表
    pub symbols: String,
}

/// 批量报价中的单项结果
#[derive(Debug, Serialize)]
pub struct BatchQuoteItem {
    /// 股票代码
    pub symbol: String,
    /// 成功时的报价
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<DetailedQuote>,
    /// 失败时的错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

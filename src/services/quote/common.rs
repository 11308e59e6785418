//! 公共常量和辅助函数

use regex::Regex;
use std::sync::OnceLock;

// ==================== 数据源常量 ====================

/// Yahoo 基本面接口请求的模块
pub const YAHOO_SUMMARY_MODULES: &str = "financialData,defaultKeyStatistics,summaryDetail,assetProfile,incomeStatementHistoryQuarterly,balanceSheetHistoryQuarterly,cashflowStatementHistoryQuarterly";

/// Nasdaq 财报数值以千为单位
pub const NASDAQ_THOUSANDS: f64 = 1000.0;

/// 历史数据最多保留的交易日
pub const HISTORY_WINDOW: usize = 30;

/// TTM 汇总的季度数
pub const TTM_QUARTERS: usize = 4;

// ==================== 默认值约定 ====================

/// 无法获得增长率时的占位值（并非真实估计）
pub const UNKNOWN_GROWTH: f64 = 0.10;

/// 备用 EPS 路径生效时写入的增长率占位值
pub const FALLBACK_EPS_GROWTH: f64 = 0.15;

/// 标准化并校验股票代码
///
/// 返回大写代码，非法时返回 None
pub fn normalize_symbol(symbol: &str) -> Option<String> {
    static SYMBOL_RE: OnceLock<Regex> = OnceLock::new();
    let re = SYMBOL_RE.get_or_init(|| {
        Regex::new(r"^[A-Z0-9.\-^=]{1,15}$").expect("股票代码正则")
    });

    let symbol = symbol.trim().to_uppercase();
    re.is_match(&symbol).then_some(symbol)
}

/// 解析展示用数字字符串，如 "$1,234.5"、"-3.2%"
///
/// 只保留数字、正负号和小数点，解析失败返回 None
pub fn parse_display_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 解析带千分位的整数字符串，如 "2,876,543,210"
pub fn parse_grouped_integer(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<i64>().ok().map(|v| v as f64)
}

/// 累加已知值，全部未知时返回 None
pub fn sum_known<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// 安全除法，分母为 0 或任一侧未知时返回 None
pub fn checked_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

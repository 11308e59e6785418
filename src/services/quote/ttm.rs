//! 近四季（TTM）汇总
//!
//! 汇总本身只做求和；单季年化（×4）是组装层的策略，见 `annualize_if_empty`

use serde_json::Value;

use super::common::{sum_known, TTM_QUARTERS};
use super::extract::raw_value;

/// 对最近（最多）四个季度的字段求和
///
/// `statements` 按时间倒序（最新在前），不足四季时只汇总已有季度
pub fn sum_ttm(statements: &[Value], keys: &[&str]) -> Option<f64> {
    sum_known(
        statements
            .iter()
            .take(TTM_QUARTERS)
            .map(|statement| raw_value(statement, keys)),
    )
}

/// 最新一季的字段值
pub fn latest_quarter(statements: &[Value], keys: &[&str]) -> Option<f64> {
    statements.first().and_then(|statement| raw_value(statement, keys))
}

/// TTM 为空（未知或恰为 0）且最新一季非 0 时，用最新一季 ×4 代替
pub fn annualize_if_empty(ttm: Option<f64>, latest: Option<f64>) -> Option<f64> {
    let ttm_empty = ttm.map_or(true, |t| t == 0.0);
    match latest {
        Some(q) if ttm_empty && q != 0.0 => Some(q * 4.0),
        _ => ttm,
    }
}

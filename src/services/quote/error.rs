//! 报价组装错误

use thiserror::Error;

/// 报价组装失败
///
/// 只有主数据源（图表）不可用属于硬失败；基本面和备用数据源的问题降级为未知字段
#[derive(Debug, Error)]
pub enum DataError {
    #[error("股票代码格式无效: {0}")]
    InvalidSymbol(String),

    #[error("股票代码 {0} 不存在或已退市")]
    SymbolNotFound(String),

    #[error("获取 {symbol} 图表数据失败: {source}")]
    ChartUnavailable {
        symbol: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{symbol} 图表数据格式异常: {reason}")]
    MalformedChart { symbol: String, reason: String },

    #[error("{0} 昨收价缺失或为 0，无法计算涨跌幅")]
    InvalidPreviousClose(String),
}

//! 组装中的报价记录
//!
//! 组装过程中所有可解析字段都是 `Option<f64>`：None 表示未解析，
//! `Some(0.0)` 表示数据源明确给出 0。只在输出时把 None 写成 0。

use crate::models::{DetailedQuote, QuoteHistoryPoint, ValuationFields, VolumeSignal};

use super::common::{checked_div, UNKNOWN_GROWTH};

/// 估值字段草稿
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuationDraft {
    pub revenue_qtr: Option<f64>,
    pub revenue_ttm: Option<f64>,
    pub net_income_ttm: Option<f64>,
    pub fcf_ttm: Option<f64>,
    pub cost_of_revenue: Option<f64>,
    pub operating_expenses: Option<f64>,
    pub operating_income: Option<f64>,
    pub cash_and_equivalents: Option<f64>,
    pub total_debt: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub price_to_sales: Option<f64>,
}

impl ValuationDraft {
    pub fn to_fields(&self) -> ValuationFields {
        ValuationFields {
            revenue_qtr: self.revenue_qtr.unwrap_or(0.0),
            revenue_ttm: self.revenue_ttm.unwrap_or(0.0),
            net_income_ttm: self.net_income_ttm.unwrap_or(0.0),
            fcf_ttm: self.fcf_ttm.unwrap_or(0.0),
            cost_of_revenue: self.cost_of_revenue.unwrap_or(0.0),
            operating_expenses: self.operating_expenses.unwrap_or(0.0),
            operating_income: self.operating_income.unwrap_or(0.0),
            cash_and_equivalents: self.cash_and_equivalents.unwrap_or(0.0),
            total_debt: self.total_debt.unwrap_or(0.0),
            shares_outstanding: self.shares_outstanding.unwrap_or(0.0),
            price_to_sales: self.price_to_sales.unwrap_or(0.0),
        }
    }
}

/// 报价草稿：主数据源解析完成后生成，备用数据源只填补未解析字段
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteDraft {
    pub symbol: String,
    pub currency: String,
    pub price: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub history: Vec<QuoteHistoryPoint>,

    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub book_value: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub dividend_rate: Option<f64>,
    pub target_mean_price: Option<f64>,
    pub recommendation_key: Option<String>,
    pub description: Option<String>,

    pub valuation: ValuationDraft,
}

impl QuoteDraft {
    /// PE 与 EPS 互推
    ///
    /// 直接报告的值优先；只有一侧缺失且另一侧非 0 时才用价格反推，
    /// 重复调用结果不变
    pub fn resolve_pe_eps(&mut self) {
        let price = Some(self.price);

        if self.pe_ratio.is_none() {
            self.pe_ratio = checked_div(price, self.eps);
        } else if self.eps.is_none() {
            self.eps = checked_div(price, self.pe_ratio);
        }
    }

    /// 流通股数缺失时用 市值 ÷ 价格 推算
    pub fn derive_shares_outstanding(&mut self) {
        if self.valuation.shares_outstanding.is_none() {
            self.valuation.shares_outstanding = checked_div(self.market_cap, Some(self.price));
        }
    }

    /// 市销率缺失时用 市值 ÷ TTM 营收 推算
    pub fn derive_price_to_sales(&mut self) {
        if self.valuation.price_to_sales.is_none() {
            self.valuation.price_to_sales =
                checked_div(self.market_cap, self.valuation.revenue_ttm);
        }
    }

    /// 输出详细报价，未解析字段写为 0
    pub fn into_quote(
        self,
        avg_volume: f64,
        vwap: Option<f64>,
        volume_signal: VolumeSignal,
    ) -> DetailedQuote {
        let valuation_fields = self.valuation.to_fields();

        DetailedQuote {
            symbol: self.symbol,
            price: self.price,
            currency: self.currency,
            change_percent: self.change_percent,
            volume: self.volume,
            avg_volume,
            market_cap: self.market_cap.unwrap_or(0.0),
            pe_ratio: self.pe_ratio.unwrap_or(0.0),
            peg_ratio: self.peg_ratio.unwrap_or(0.0),
            eps: self.eps.unwrap_or(0.0),
            book_value: self.book_value.unwrap_or(0.0),
            revenue_growth: self.revenue_growth.unwrap_or(UNKNOWN_GROWTH),
            dividend_rate: self.dividend_rate.unwrap_or(0.0),
            vwap,
            target_mean_price: self.target_mean_price,
            recommendation_key: self
                .recommendation_key
                .unwrap_or_else(|| "N/A".to_string()),
            description: self.description.unwrap_or_default(),
            history: self.history,
            volume_signal,
            valuation_fields,
        }
    }
}

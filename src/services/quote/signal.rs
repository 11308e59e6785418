//! 量价衍生指标：VWAP、相对成交量、量价信号

use crate::models::{QuoteHistoryPoint, VolumeSignal};

/// 相对成交量超过该倍数时才给出方向性信号
pub const RVOL_THRESHOLD: f64 = 1.2;

/// 成交量加权均价
///
/// 历史为空或总成交量为 0 时返回 None
pub fn vwap(history: &[QuoteHistoryPoint]) -> Option<f64> {
    let (turnover, volume) = history.iter().fold((0.0, 0.0), |(t, v), point| {
        let vol = point.volume as f64;
        (t + point.close * vol, v + vol)
    });

    (volume > 0.0).then(|| turnover / volume)
}

/// 历史平均成交量（分母至少为 1）
pub fn average_volume(history: &[QuoteHistoryPoint]) -> f64 {
    let total: f64 = history.iter().map(|p| p.volume as f64).sum();
    total / history.len().max(1) as f64
}

/// 相对成交量（分母至少为 1）
pub fn relative_volume(current_volume: u64, average_volume: f64) -> f64 {
    current_volume as f64 / average_volume.max(1.0)
}

pub fn volume_signal(price: f64, vwap: Option<f64>, rvol: f64) -> VolumeSignal {
    match vwap {
        Some(v) if rvol > RVOL_THRESHOLD && price > v => VolumeSignal::Bullish,
        Some(v) if rvol > RVOL_THRESHOLD && price < v => VolumeSignal::Bearish,
        _ => VolumeSignal::Neutral,
    }
}

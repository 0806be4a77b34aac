//! Order flow analytics.
//!
//! Tape imbalance, market impact and liquidity stress. Rolling means come
//! from the shared [`WindowStats`].

use crate::window::{safe_div, Field, WindowStats};
use serde::Serialize;
use taq_core::{Bar, MetricSeries, Result};

/// Order flow metrics for a bar sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowMetrics {
    /// `(at_bid - at_ask) / trade_count`, in `[-1, 1]`. Positive: selling absorbed at the bid.
    pub tape_imbalance: MetricSeries,
    /// `(close[i] - close[i - 1]) / volume_normalized`.
    pub market_impact: MetricSeries,
    /// `std_spread / rolling_mean(std_spread)`.
    pub spread_volatility: MetricSeries,
    /// `trade_count / rolling_mean(trade_count)`.
    pub trade_frequency: MetricSeries,
    /// `spread_volatility * trade_frequency`.
    pub liquidity_stress: MetricSeries,
}

impl FlowMetrics {
    /// Named series, in display order.
    pub fn series(&self) -> Vec<(&'static str, &MetricSeries)> {
        vec![
            ("tape_imbalance", &self.tape_imbalance),
            ("market_impact", &self.market_impact),
            ("spread_volatility", &self.spread_volatility),
            ("trade_frequency", &self.trade_frequency),
            ("liquidity_stress", &self.liquidity_stress),
        ]
    }
}

/// Order flow module.
#[derive(Debug, Clone)]
pub struct OrderFlowAnalyzer {
    window: usize,
    epsilon: f64,
}

impl OrderFlowAnalyzer {
    /// Create an order flow analyzer.
    pub fn new(window: usize, epsilon: f64) -> Self {
        Self { window, epsilon }
    }

    /// Rolling statistics this module reads.
    pub fn requirements(&self) -> Vec<(Field, usize)> {
        vec![
            (Field::Volume, self.window),
            (Field::StdSpread, self.window),
            (Field::TradeCount, self.window),
        ]
    }

    /// Compute all order flow metrics.
    pub fn compute(&self, bars: &[Bar], stats: &WindowStats) -> Result<FlowMetrics> {
        let eps = self.epsilon;

        let imbalance = bars
            .iter()
            .map(|b| {
                let net = b.trade_at_bid as f64 - b.trade_at_ask as f64;
                safe_div(net, b.trade_count as f64, eps).map(|r| r.clamp(-1.0, 1.0))
            })
            .collect();

        let volume_normalized = stats.relative_to_mean(Field::Volume, self.window, eps)?;
        let impact = std::iter::once(None)
            .chain(bars.windows(2).map(|w| Some(w[1].close - w[0].close)))
            .zip(&volume_normalized)
            .map(|(change, &normalized)| safe_div(change?, normalized?, eps))
            .collect();

        let spread_volatility = stats.relative_to_mean(Field::StdSpread, self.window, eps)?;
        let trade_frequency = stats.relative_to_mean(Field::TradeCount, self.window, eps)?;
        let stress = spread_volatility
            .iter()
            .zip(&trade_frequency)
            .map(|(&volatility, &frequency)| Some(volatility? * frequency?))
            .collect();

        Ok(FlowMetrics {
            tape_imbalance: MetricSeries::from_values(bars, imbalance),
            market_impact: MetricSeries::from_values(bars, impact),
            spread_volatility: MetricSeries::from_values(bars, spread_volatility),
            trade_frequency: MetricSeries::from_values(bars, trade_frequency),
            liquidity_stress: MetricSeries::from_values(bars, stress),
        })
    }
}

//! Spread analytics.
//!
//! Per-bar squeeze potential, compression, efficiency and liquidity risk,
//! all read straight off each bar's spread fields.

use crate::window::safe_div;
use serde::Serialize;
use taq_core::{Bar, MetricSeries};

/// Spread metrics for a bar sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpreadMetrics {
    /// `(max - min) / max * 100`.
    pub squeeze_potential: MetricSeries,
    /// `avg / max`, clamped to `[0, 1]`.
    pub compression_ratio: MetricSeries,
    /// `(1 - std / avg) * 100`. Negative under high dispersion.
    pub spread_efficiency: MetricSeries,
    /// `std / avg * 100`. Always `100 - spread_efficiency` when defined.
    pub liquidity_risk: MetricSeries,
    /// Widest spread in basis points of the close.
    pub max_spread_bps: MetricSeries,
}

impl SpreadMetrics {
    /// Named series, in display order.
    pub fn series(&self) -> Vec<(&'static str, &MetricSeries)> {
        vec![
            ("squeeze_potential", &self.squeeze_potential),
            ("compression_ratio", &self.compression_ratio),
            ("spread_efficiency", &self.spread_efficiency),
            ("liquidity_risk", &self.liquidity_risk),
            ("max_spread_bps", &self.max_spread_bps),
        ]
    }
}

/// Spread module.
#[derive(Debug, Clone)]
pub struct SpreadAnalyzer {
    epsilon: f64,
}

impl SpreadAnalyzer {
    /// Create a spread analyzer.
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    /// Compute all spread metrics.
    pub fn compute(&self, bars: &[Bar]) -> SpreadMetrics {
        let eps = self.epsilon;

        SpreadMetrics {
            squeeze_potential: per_bar(bars, |b| {
                safe_div(b.spread_range(), b.max_spread, eps).map(|r| r * 100.0)
            }),
            compression_ratio: per_bar(bars, |b| {
                safe_div(b.avg_spread, b.max_spread, eps).map(|r| r.clamp(0.0, 1.0))
            }),
            spread_efficiency: per_bar(bars, |b| {
                safe_div(b.std_spread, b.avg_spread, eps).map(|r| (1.0 - r) * 100.0)
            }),
            liquidity_risk: per_bar(bars, |b| {
                safe_div(b.std_spread, b.avg_spread, eps).map(|r| r * 100.0)
            }),
            max_spread_bps: per_bar(bars, |b| {
                safe_div(b.max_spread, b.close, eps).map(|r| r * 10_000.0)
            }),
        }
    }
}

fn per_bar(bars: &[Bar], f: impl Fn(&Bar) -> Option<f64>) -> MetricSeries {
    MetricSeries::from_values(bars, bars.iter().map(f).collect())
}

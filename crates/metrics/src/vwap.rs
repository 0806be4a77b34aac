//! VWAP execution quality and momentum.

use crate::window::{safe_div, Field, WindowStats};
use serde::Serialize;
use taq_core::{Bar, MetricSeries, Result};

/// VWAP metrics for a bar sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VwapMetrics {
    /// `(close - vwap) / vwap * 100`. Positive: closed above VWAP.
    pub execution_deviation: MetricSeries,
    /// `vwap[i] - vwap[i - 1]`, undefined for the first bar.
    pub weighted_price_change: MetricSeries,
    /// `volume / rolling_mean(volume)`.
    pub volume_intensity: MetricSeries,
    /// `weighted_price_change * volume_intensity`.
    pub momentum_score: MetricSeries,
}

impl VwapMetrics {
    /// Named series, in display order.
    pub fn series(&self) -> Vec<(&'static str, &MetricSeries)> {
        vec![
            ("execution_deviation", &self.execution_deviation),
            ("weighted_price_change", &self.weighted_price_change),
            ("volume_intensity", &self.volume_intensity),
            ("momentum_score", &self.momentum_score),
        ]
    }
}

/// VWAP module.
#[derive(Debug, Clone)]
pub struct VwapAnalyzer {
    window: usize,
    epsilon: f64,
}

impl VwapAnalyzer {
    /// Create a VWAP analyzer over a rolling volume window.
    pub fn new(window: usize, epsilon: f64) -> Self {
        Self { window, epsilon }
    }

    /// Rolling statistics this module reads.
    pub fn requirements(&self) -> Vec<(Field, usize)> {
        vec![(Field::Volume, self.window)]
    }

    /// Compute all VWAP metrics.
    pub fn compute(&self, bars: &[Bar], stats: &WindowStats) -> Result<VwapMetrics> {
        let eps = self.epsilon;

        let deviation = bars
            .iter()
            .map(|b| {
                safe_div(b.close - b.volume_weighted_price, b.volume_weighted_price, eps)
                    .map(|r| r * 100.0)
            })
            .collect();

        let price_change: Vec<Option<f64>> = std::iter::once(None)
            .chain(
                bars.windows(2)
                    .map(|w| Some(w[1].volume_weighted_price - w[0].volume_weighted_price)),
            )
            .take(bars.len())
            .collect();

        // A bar with no volume has no intensity, whatever its neighbours traded.
        let intensity: Vec<Option<f64>> = stats
            .relative_to_mean(Field::Volume, self.window, eps)?
            .into_iter()
            .zip(bars)
            .map(|(ratio, b)| ratio.filter(|_| b.volume as f64 >= eps))
            .collect();

        let momentum = price_change
            .iter()
            .zip(&intensity)
            .map(|(&change, &intensity)| Some(change? * intensity?))
            .collect();

        Ok(VwapMetrics {
            execution_deviation: MetricSeries::from_values(bars, deviation),
            weighted_price_change: MetricSeries::from_values(bars, price_change),
            volume_intensity: MetricSeries::from_values(bars, intensity),
            momentum_score: MetricSeries::from_values(bars, momentum),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bars, bars_with_closes};
    use approx::assert_abs_diff_eq;

    fn compute(sequence: &[Bar], window: usize) -> VwapMetrics {
        let analyzer = VwapAnalyzer::new(window, 1e-9);
        let stats = WindowStats::build(sequence, &analyzer.requirements());
        analyzer.compute(sequence, &stats).unwrap()
    }

    #[test]
    fn test_execution_deviation() {
        let mut sequence = bars(2);
        sequence[0].close = 101.0;
        sequence[1].close = 99.0;
        let metrics = compute(&sequence, 5);

        assert_abs_diff_eq!(metrics.execution_deviation.value(0).unwrap(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.execution_deviation.value(1).unwrap(), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_first_bar_momentum_undefined() {
        let sequence = bars_with_closes(&[100.0, 101.0, 103.0]);
        let metrics = compute(&sequence, 5);

        assert_eq!(metrics.weighted_price_change.value(0), None);
        assert_eq!(metrics.momentum_score.value(0), None);
        // Constant volume: intensity 1, momentum equals the VWAP change.
        assert_abs_diff_eq!(metrics.momentum_score.value(1).unwrap(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.momentum_score.value(2).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_volume_spike_scales_momentum() {
        let mut sequence = bars_with_closes(&[100.0, 100.5]);
        sequence[0].volume = 1_000;
        sequence[1].volume = 3_000;
        sequence[1].buy_volume = 1_500;
        let metrics = compute(&sequence, 2);

        // Mean of 1000 and 3000 is 2000.
        assert_abs_diff_eq!(metrics.volume_intensity.value(1).unwrap(), 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.momentum_score.value(1).unwrap(), 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_volume_propagates_none() {
        let mut sequence = bars_with_closes(&[100.0, 101.0]);
        for bar in &mut sequence {
            bar.volume = 0;
            bar.buy_volume = 0;
            bar.sell_volume = 0;
        }
        let metrics = compute(&sequence, 5);

        assert_eq!(metrics.volume_intensity.value(1), None);
        assert_eq!(metrics.momentum_score.value(1), None);
        assert!(metrics.weighted_price_change.value(1).is_some());
    }

    #[test]
    fn test_zero_volume_bar_after_active_bars() {
        let mut sequence = bars_with_closes(&[100.0, 101.0, 102.0]);
        sequence[2].volume = 0;
        sequence[2].buy_volume = 0;
        sequence[2].sell_volume = 0;
        let metrics = compute(&sequence, 20);

        assert!(metrics.volume_intensity.value(1).is_some());
        assert_eq!(metrics.volume_intensity.value(2), None);
        assert_eq!(metrics.momentum_score.value(2), None);
    }

    #[test]
    fn test_missing_stats_is_error() {
        let sequence = bars(2);
        let analyzer = VwapAnalyzer::new(5, 1e-9);
        let stats = WindowStats::build(&sequence, &[(Field::Volume, 3)]);
        assert!(analyzer.compute(&sequence, &stats).is_err());
    }

    #[test]
    fn test_empty_input() {
        let metrics = compute(&[], 5);
        assert!(metrics.series().iter().all(|(_, s)| s.is_empty()));
    }
}

//! Volume flow analytics.
//!
//! Aggression ratio with its flow regime, algorithmic-flow detection and
//! volume delta. The momentum score is taken from the VWAP module rather
//! than recomputed, so both modules report identical values.

use crate::regime::ThresholdClassifier;
use crate::window::safe_div;
use serde::Serialize;
use taq_core::config::VolumeConfig;
use taq_core::{Bar, FlowRegime, LabelSeries, MetricSeries, Result};

/// Volume metrics for a bar sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeMetrics {
    /// `(buy - sell) / volume`, in `[-1, 1]`.
    pub aggression_ratio: MetricSeries,
    /// Shared with [`VwapMetrics::momentum_score`](crate::vwap::VwapMetrics).
    pub momentum_score: MetricSeries,
    /// Share of the window's trades printed in repeat-pattern bars, in `[0, 1]`.
    pub algo_flow_score: MetricSeries,
    /// `buy - sell` volume.
    pub volume_delta: MetricSeries,
    /// Running sum of `volume_delta` from the first bar.
    pub cumulative_delta: MetricSeries,
    /// Regime of `|aggression_ratio|`.
    pub flow_regime: LabelSeries<FlowRegime>,
}

impl VolumeMetrics {
    /// Named series, in display order.
    pub fn series(&self) -> Vec<(&'static str, &MetricSeries)> {
        vec![
            ("aggression_ratio", &self.aggression_ratio),
            ("momentum_score", &self.momentum_score),
            ("algo_flow_score", &self.algo_flow_score),
            ("volume_delta", &self.volume_delta),
            ("cumulative_delta", &self.cumulative_delta),
        ]
    }

    /// Named regime series.
    pub fn regimes(&self) -> Vec<(&'static str, LabelSeries<&'static str>)> {
        vec![("flow_regime", self.flow_regime.to_tags())]
    }
}

/// Volume module.
#[derive(Debug, Clone)]
pub struct VolumeAnalyzer {
    window: usize,
    repeat_tolerance: f64,
    epsilon: f64,
    classifier: ThresholdClassifier<FlowRegime>,
}

impl VolumeAnalyzer {
    /// Create a volume analyzer.
    pub fn new(config: &VolumeConfig, epsilon: f64) -> Result<Self> {
        let classifier = ThresholdClassifier::new(
            config.cuts(),
            vec![FlowRegime::Mixed, FlowRegime::Retail, FlowRegime::Institutional],
        )?;
        Ok(Self {
            window: config.window.max(1),
            repeat_tolerance: config.repeat_tolerance,
            epsilon,
            classifier,
        })
    }

    /// Compute all volume metrics, reusing the VWAP module's momentum score.
    pub fn compute(&self, bars: &[Bar], momentum_score: &MetricSeries) -> VolumeMetrics {
        let eps = self.epsilon;

        let aggression = MetricSeries::from_values(
            bars,
            bars.iter()
                .map(|b| {
                    safe_div(b.volume_delta(), b.volume as f64, eps).map(|r| r.clamp(-1.0, 1.0))
                })
                .collect(),
        );

        let deltas: Vec<Option<f64>> = bars.iter().map(|b| Some(b.volume_delta())).collect();
        let cumulative = deltas
            .iter()
            .scan(0.0, |total, delta| {
                *total += delta.unwrap_or(0.0);
                Some(Some(*total))
            })
            .collect();

        let flow_regime = self.classifier.classify_series_by(&aggression, f64::abs);

        VolumeMetrics {
            algo_flow_score: MetricSeries::from_values(bars, self.algo_flow(bars)),
            momentum_score: momentum_score.clone(),
            volume_delta: MetricSeries::from_values(bars, deltas),
            cumulative_delta: MetricSeries::from_values(bars, cumulative),
            aggression_ratio: aggression,
            flow_regime,
        }
    }

    /// Trade-weighted share of repeat-pattern bars over the trailing window.
    ///
    /// A bar repeats when both its volume and trade count sit within the
    /// relative tolerance of the previous bar's. Only pairs with both bars
    /// inside the window count.
    fn algo_flow(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let repeats: Vec<bool> = std::iter::once(false)
            .chain(bars.windows(2).map(|w| self.is_repeat(&w[1], &w[0])))
            .take(bars.len())
            .collect();

        (0..bars.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(self.window);
                if i == start {
                    return None;
                }
                let window = &bars[start..=i];
                let total: u64 = window.iter().map(|b| b.trade_count).sum();
                let repeated: u64 = (start + 1..=i)
                    .filter(|&j| repeats[j])
                    .map(|j| bars[j].trade_count)
                    .sum();
                safe_div(repeated as f64, total as f64, self.epsilon)
            })
            .collect()
    }

    fn is_repeat(&self, bar: &Bar, prev: &Bar) -> bool {
        self.within_tolerance(bar.volume as f64, prev.volume as f64)
            && self.within_tolerance(bar.trade_count as f64, prev.trade_count as f64)
    }

    fn within_tolerance(&self, current: f64, previous: f64) -> bool {
        if previous.abs() < self.epsilon {
            return current.abs() < self.epsilon;
        }
        (current - previous).abs() <= self.repeat_tolerance * previous.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bars;
    use approx::assert_abs_diff_eq;

    fn analyzer(window: usize) -> VolumeAnalyzer {
        let config = VolumeConfig {
            window,
            ..VolumeConfig::default()
        };
        VolumeAnalyzer::new(&config, 1e-9).unwrap()
    }

    fn compute(sequence: &[Bar], window: usize) -> VolumeMetrics {
        let momentum = MetricSeries::from_values(sequence, vec![None; sequence.len()]);
        analyzer(window).compute(sequence, &momentum)
    }

    #[test]
    fn test_aggression_ratio() {
        let mut sequence = bars(3);
        sequence[0].buy_volume = 900;
        sequence[0].sell_volume = 100;
        sequence[1].buy_volume = 0;
        sequence[1].sell_volume = 1_000;
        sequence[2].buy_volume = 450;
        sequence[2].sell_volume = 450;
        let metrics = compute(&sequence, 5);

        assert_abs_diff_eq!(metrics.aggression_ratio.value(0).unwrap(), 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.aggression_ratio.value(1).unwrap(), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.aggression_ratio.value(2).unwrap(), 0.0, epsilon = 1e-12);
        for value in metrics.aggression_ratio.defined() {
            assert!((-1.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_flow_regime_labels() {
        let mut sequence = bars(4);
        let splits = [(550, 450), (600, 400), (700, 300), (200, 800)];
        for (bar, (buy, sell)) in sequence.iter_mut().zip(splits) {
            bar.buy_volume = buy;
            bar.sell_volume = sell;
        }
        let metrics = compute(&sequence, 5);

        // Ratios 0.1, 0.2, 0.4, -0.6.
        assert_eq!(metrics.flow_regime.label(0), Some(FlowRegime::Mixed));
        assert_eq!(metrics.flow_regime.label(1), Some(FlowRegime::Retail));
        assert_eq!(metrics.flow_regime.label(2), Some(FlowRegime::Retail));
        assert_eq!(metrics.flow_regime.label(3), Some(FlowRegime::Institutional));
    }

    #[test]
    fn test_zero_volume_is_undefined() {
        let mut sequence = bars(2);
        sequence[1].volume = 0;
        sequence[1].buy_volume = 0;
        sequence[1].sell_volume = 0;
        let metrics = compute(&sequence, 5);

        assert_eq!(metrics.aggression_ratio.value(1), None);
        assert_eq!(metrics.flow_regime.label(1), None);
    }

    #[test]
    fn test_momentum_is_shared() {
        let sequence = bars(3);
        let momentum = MetricSeries::from_values(&sequence, vec![None, Some(0.5), Some(-0.25)]);
        let metrics = analyzer(5).compute(&sequence, &momentum);
        assert_eq!(metrics.momentum_score, momentum);
    }

    #[test]
    fn test_algo_flow_all_repeats() {
        // Identical bars: every pair repeats.
        let sequence = bars(4);
        let metrics = compute(&sequence, 3);

        assert_eq!(metrics.algo_flow_score.value(0), None);
        // Window [0, 1]: bar 1 repeats, 50 of 100 trades.
        assert_abs_diff_eq!(metrics.algo_flow_score.value(1).unwrap(), 0.5, epsilon = 1e-12);
        // Window [1, 3]: bars 2 and 3 count, bar 1's pair left the window.
        assert_abs_diff_eq!(metrics.algo_flow_score.value(3).unwrap(), 100.0 / 150.0, epsilon = 1e-12);
    }

    #[test]
    fn test_algo_flow_tolerance() {
        let mut sequence = bars(3);
        sequence[1].volume = 1_040; // within 5%
        sequence[2].volume = 1_200; // outside 5%
        let metrics = compute(&sequence, 3);

        assert_abs_diff_eq!(metrics.algo_flow_score.value(1).unwrap(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.algo_flow_score.value(2).unwrap(), 50.0 / 150.0, epsilon = 1e-12);
        for value in metrics.algo_flow_score.defined() {
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_algo_flow_zero_trades_undefined() {
        let mut sequence = bars(2);
        for bar in &mut sequence {
            bar.trade_count = 0;
            bar.trade_at_bid = 0;
            bar.trade_at_ask = 0;
        }
        let metrics = compute(&sequence, 3);
        assert_eq!(metrics.algo_flow_score.value(1), None);
    }

    #[test]
    fn test_algo_flow_window_of_one_undefined() {
        let metrics = compute(&bars(3), 1);
        assert!(metrics.algo_flow_score.values().iter().all(Option::is_none));
    }

    #[test]
    fn test_cumulative_delta() {
        let mut sequence = bars(3);
        sequence[1].buy_volume = 100;
        sequence[1].sell_volume = 600;
        let metrics = compute(&sequence, 3);

        assert_eq!(metrics.volume_delta.values(), vec![Some(100.0), Some(-500.0), Some(100.0)]);
        assert_eq!(
            metrics.cumulative_delta.values(),
            vec![Some(100.0), Some(-400.0), Some(-300.0)]
        );
    }
}

//! Threshold-based regime classification.
//!
//! One classifier shared by the volume and liquidity modules: an ascending
//! list of cut points splits the real line into closed-open intervals, each
//! mapped to a label. A value equal to a cut point takes the upper label.

use taq_core::{Error, LabelPoint, LabelSeries, MetricSeries, RegimeLabel, Result};

/// Ordered threshold list mapping a metric value to a label.
#[derive(Debug, Clone)]
pub struct ThresholdClassifier<L> {
    cuts: Vec<f64>,
    labels: Vec<L>,
}

impl<L: RegimeLabel> ThresholdClassifier<L> {
    /// Create a classifier.
    ///
    /// `labels[0]` covers values below `cuts[0]`, `labels[k]` covers
    /// `[cuts[k - 1], cuts[k])`, and the last label everything at or above
    /// the last cut. Requires `labels.len() == cuts.len() + 1` and finite,
    /// strictly ascending cuts.
    pub fn new(cuts: Vec<f64>, labels: Vec<L>) -> Result<Self> {
        if labels.len() != cuts.len() + 1 {
            return Err(Error::config(format!(
                "{} cut points need {} labels, got {}",
                cuts.len(),
                cuts.len() + 1,
                labels.len()
            )));
        }
        if cuts.iter().any(|c| !c.is_finite()) || cuts.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::config(format!(
                "cut points must be finite and strictly ascending, got {cuts:?}"
            )));
        }
        Ok(Self { cuts, labels })
    }

    /// Label for a single value.
    pub fn classify(&self, value: f64) -> L {
        let bucket = self.cuts.partition_point(|&cut| cut <= value);
        self.labels[bucket]
    }

    /// Label every defined point of a series; undefined points stay unlabelled.
    pub fn classify_series(&self, series: &MetricSeries) -> LabelSeries<L> {
        self.classify_series_by(series, |v| v)
    }

    /// Like [`classify_series`](Self::classify_series), classifying `key(value)`.
    pub fn classify_series_by(
        &self,
        series: &MetricSeries,
        key: impl Fn(f64) -> f64,
    ) -> LabelSeries<L> {
        LabelSeries::new(
            series
                .iter()
                .map(|p| LabelPoint {
                    bar_start: p.bar_start,
                    label: p.value.map(|v| self.classify(key(v))),
                })
                .collect(),
        )
    }

    /// Cut points, ascending.
    pub fn cuts(&self) -> &[f64] {
        &self.cuts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bars;
    use taq_core::{FlowRegime, LiquidityRegime};

    fn liquidity() -> ThresholdClassifier<LiquidityRegime> {
        ThresholdClassifier::new(
            vec![50.0, 80.0],
            vec![
                LiquidityRegime::Low,
                LiquidityRegime::Elevated,
                LiquidityRegime::Stressed,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_closed_open_boundaries() {
        let c = liquidity();
        assert_eq!(c.classify(-10.0), LiquidityRegime::Low);
        assert_eq!(c.classify(49.999), LiquidityRegime::Low);
        assert_eq!(c.classify(50.0), LiquidityRegime::Elevated);
        assert_eq!(c.classify(79.999), LiquidityRegime::Elevated);
        assert_eq!(c.classify(80.0), LiquidityRegime::Stressed);
        assert_eq!(c.classify(1e6), LiquidityRegime::Stressed);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(ThresholdClassifier::new(vec![0.5], vec![FlowRegime::Mixed]).is_err());
        assert!(ThresholdClassifier::new(
            vec![0.5, 0.2],
            vec![FlowRegime::Mixed, FlowRegime::Retail, FlowRegime::Institutional],
        )
        .is_err());
        assert!(ThresholdClassifier::new(
            vec![f64::NAN],
            vec![FlowRegime::Mixed, FlowRegime::Retail],
        )
        .is_err());
    }

    #[test]
    fn test_series_keeps_undefined_unlabelled() {
        let sequence = bars(3);
        let series = MetricSeries::from_values(&sequence, vec![Some(10.0), None, Some(90.0)]);
        let labels = liquidity().classify_series(&series);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.label(0), Some(LiquidityRegime::Low));
        assert_eq!(labels.label(1), None);
        assert_eq!(labels.label(2), Some(LiquidityRegime::Stressed));
    }

    #[test]
    fn test_classify_by_magnitude() {
        let c = ThresholdClassifier::new(
            vec![0.2, 0.5],
            vec![FlowRegime::Mixed, FlowRegime::Retail, FlowRegime::Institutional],
        )
        .unwrap();
        let sequence = bars(3);
        let series =
            MetricSeries::from_values(&sequence, vec![Some(-0.7), Some(0.1), Some(-0.3)]);
        let labels = c.classify_series_by(&series, f64::abs);
        assert_eq!(labels.label(0), Some(FlowRegime::Institutional));
        assert_eq!(labels.label(1), Some(FlowRegime::Mixed));
        assert_eq!(labels.label(2), Some(FlowRegime::Retail));
    }
}

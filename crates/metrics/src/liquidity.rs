//! Liquidity risk scoring and regime classification.
//!
//! Combines the spread module's liquidity risk with the order flow module's
//! liquidity stress into one weighted score, then labels each bar.

use crate::regime::ThresholdClassifier;
use crate::window::{Field, WindowStats};
use serde::Serialize;
use taq_core::config::LiquidityConfig;
use taq_core::{Bar, LabelSeries, LiquidityRegime, MetricSeries, Result};

/// Liquidity metrics for a bar sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiquidityMetrics {
    /// Rolling std-dev of close-to-close log returns, per bar interval.
    pub volatility_intensity: MetricSeries,
    /// `nbbo_quote_count / rolling_mean(nbbo_quote_count)`.
    pub quote_intensity: MetricSeries,
    /// `risk_weight * liquidity_risk + stress_weight * liquidity_stress`.
    pub liquidity_risk_score: MetricSeries,
    /// Regime of the composite score.
    pub regime: LabelSeries<LiquidityRegime>,
}

impl LiquidityMetrics {
    /// Named series, in display order.
    pub fn series(&self) -> Vec<(&'static str, &MetricSeries)> {
        vec![
            ("volatility_intensity", &self.volatility_intensity),
            ("quote_intensity", &self.quote_intensity),
            ("liquidity_risk_score", &self.liquidity_risk_score),
        ]
    }

    /// Named regime series.
    pub fn regimes(&self) -> Vec<(&'static str, LabelSeries<&'static str>)> {
        vec![("regime_classification", self.regime.to_tags())]
    }
}

/// Liquidity module.
#[derive(Debug, Clone)]
pub struct LiquidityAnalyzer {
    window: usize,
    risk_weight: f64,
    stress_weight: f64,
    epsilon: f64,
    classifier: ThresholdClassifier<LiquidityRegime>,
}

impl LiquidityAnalyzer {
    /// Create a liquidity analyzer.
    pub fn new(config: &LiquidityConfig, epsilon: f64) -> Result<Self> {
        let classifier = ThresholdClassifier::new(
            config.cuts(),
            vec![
                LiquidityRegime::Low,
                LiquidityRegime::Elevated,
                LiquidityRegime::Stressed,
            ],
        )?;
        Ok(Self {
            window: config.window,
            risk_weight: config.risk_weight,
            stress_weight: config.stress_weight,
            epsilon,
            classifier,
        })
    }

    /// Rolling statistics this module reads.
    pub fn requirements(&self) -> Vec<(Field, usize)> {
        vec![
            (Field::LogReturn, self.window),
            (Field::NbboQuoteCount, self.window),
        ]
    }

    /// Compute all liquidity metrics from the spread risk and flow stress series.
    pub fn compute(
        &self,
        bars: &[Bar],
        stats: &WindowStats,
        liquidity_risk: &MetricSeries,
        liquidity_stress: &MetricSeries,
    ) -> Result<LiquidityMetrics> {
        let volatility = stats.require(Field::LogReturn, self.window)?.std_dev.clone();
        let quotes = stats.relative_to_mean(Field::NbboQuoteCount, self.window, self.epsilon)?;

        let score = liquidity_risk
            .iter()
            .zip(liquidity_stress.iter())
            .map(|(risk, stress)| {
                Some(self.risk_weight * risk.value? + self.stress_weight * stress.value?)
            })
            .collect();
        let score = MetricSeries::from_values(bars, score);
        let regime = self.classifier.classify_series(&score);

        Ok(LiquidityMetrics {
            volatility_intensity: MetricSeries::from_values(bars, volatility),
            quote_intensity: MetricSeries::from_values(bars, quotes),
            liquidity_risk_score: score,
            regime,
        })
    }
}

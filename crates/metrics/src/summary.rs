//! Headline summaries of metric series.

use serde::Serialize;
use statrs::statistics::Statistics;
use taq_core::MetricSeries;

/// Summary statistics of one metric series over its defined values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesSummary {
    /// Number of points, defined or not.
    pub count: usize,
    /// Number of defined points.
    pub defined: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; needs two defined points.
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Most recent defined value.
    pub last: Option<f64>,
}

impl SeriesSummary {
    /// Summarize a series, skipping undefined points.
    pub fn from_series(series: &MetricSeries) -> Self {
        let values: Vec<f64> = series.defined().collect();
        if values.is_empty() {
            return Self {
                count: series.len(),
                ..Self::default()
            };
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            count: series.len(),
            defined: values.len(),
            mean: Some(values.iter().mean()),
            std_dev: (values.len() >= 2).then(|| values.iter().std_dev()),
            min: Some(min),
            max: Some(max),
            last: values.last().copied(),
        }
    }
}

//! Rolling window statistics.
//!
//! Trailing (look-back only) windows over per-bar values. At index `i` the
//! window covers `[max(0, i - w + 1), i]`, so early indices see a partial
//! window. Undefined inputs are skipped; a window with no defined samples
//! yields `None`, and the standard deviation needs at least two samples.

use ordered_float::OrderedFloat;
use statrs::statistics::Statistics;
use std::collections::{HashMap, VecDeque};
use taq_core::{Bar, Error, Result};

/// Divide, yielding `None` when the denominator is within `epsilon` of zero.
#[inline]
pub fn safe_div(numerator: f64, denominator: f64, epsilon: f64) -> Option<f64> {
    if denominator.abs() < epsilon {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// [`safe_div`] over optional operands; `None` propagates.
#[inline]
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>, epsilon: f64) -> Option<f64> {
    safe_div(numerator?, denominator?, epsilon)
}

/// Per-bar series the engine computes rolling statistics over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Volume,
    TradeCount,
    StdSpread,
    NbboQuoteCount,
    /// `ln(close[i] / close[i - 1])`, undefined for the first bar.
    LogReturn,
}

impl Field {
    /// Name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Volume => "volume",
            Field::TradeCount => "trade_count",
            Field::StdSpread => "std_spread",
            Field::NbboQuoteCount => "nbbo_quote_count",
            Field::LogReturn => "log_return",
        }
    }

    /// Extract this field from every bar.
    pub fn extract(self, bars: &[Bar]) -> Vec<Option<f64>> {
        match self {
            Field::Volume => bars.iter().map(|b| Some(b.volume as f64)).collect(),
            Field::TradeCount => bars.iter().map(|b| Some(b.trade_count as f64)).collect(),
            Field::StdSpread => bars.iter().map(|b| Some(b.std_spread)).collect(),
            Field::NbboQuoteCount => bars
                .iter()
                .map(|b| Some(b.nbbo_quote_count as f64))
                .collect(),
            Field::LogReturn => {
                let mut returns = Vec::with_capacity(bars.len());
                if !bars.is_empty() {
                    returns.push(None);
                }
                returns.extend(bars.windows(2).map(|w| {
                    // Validated closes are positive.
                    Some((w[1].close / w[0].close).ln())
                }));
                returns
            }
        }
    }
}

/// Rolling mean, standard deviation, min and max of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingStats {
    window: usize,
    pub mean: Vec<Option<f64>>,
    pub std_dev: Vec<Option<f64>>,
    pub min: Vec<Option<f64>>,
    pub max: Vec<Option<f64>>,
}

impl RollingStats {
    /// Compute all four statistics in one pass.
    ///
    /// A zero window is treated as one.
    pub fn compute(values: &[Option<f64>], window: usize) -> Self {
        let window = window.max(1);
        let n = values.len();

        let mut mean = Vec::with_capacity(n);
        let mut std_dev = Vec::with_capacity(n);
        let mut min = Vec::with_capacity(n);
        let mut max = Vec::with_capacity(n);

        // Monotonic deques of (index, value): front is the window extreme.
        let capacity = window.min(n);
        let mut lows: VecDeque<(usize, OrderedFloat<f64>)> = VecDeque::with_capacity(capacity);
        let mut highs: VecDeque<(usize, OrderedFloat<f64>)> = VecDeque::with_capacity(capacity);

        for i in 0..n {
            let start = (i + 1).saturating_sub(window);

            if let Some(v) = values[i] {
                let v = OrderedFloat(v);
                while lows.back().is_some_and(|&(_, low)| low >= v) {
                    lows.pop_back();
                }
                lows.push_back((i, v));
                while highs.back().is_some_and(|&(_, high)| high <= v) {
                    highs.pop_back();
                }
                highs.push_back((i, v));
            }
            while lows.front().is_some_and(|&(j, _)| j < start) {
                lows.pop_front();
            }
            while highs.front().is_some_and(|&(j, _)| j < start) {
                highs.pop_front();
            }
            min.push(lows.front().map(|&(_, v)| v.into_inner()));
            max.push(highs.front().map(|&(_, v)| v.into_inner()));

            let samples: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
            mean.push(if samples.is_empty() {
                None
            } else {
                Some(samples.iter().mean())
            });
            std_dev.push(if samples.len() < 2 {
                None
            } else {
                Some(samples.iter().std_dev())
            });
        }

        Self {
            window,
            mean,
            std_dev,
            min,
            max,
        }
    }

    /// Window size in bars.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of positions covered.
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether no positions are covered.
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// `value / mean` at each position.
    pub fn ratio_to_mean(&self, values: &[Option<f64>], epsilon: f64) -> Vec<Option<f64>> {
        values
            .iter()
            .zip(&self.mean)
            .map(|(&v, &m)| ratio(v, m, epsilon))
            .collect()
    }
}

/// Rolling statistics for one bar sequence, keyed by field and window.
///
/// Built once per computation and shared read-only by every module, so two
/// modules asking for the same (field, window) see identical numbers.
#[derive(Debug, Clone, Default)]
pub struct WindowStats {
    values: HashMap<Field, Vec<Option<f64>>>,
    stats: HashMap<(Field, usize), RollingStats>,
}

impl WindowStats {
    /// Compute statistics for every distinct requested key.
    pub fn build(bars: &[Bar], requests: &[(Field, usize)]) -> Self {
        let mut stats = HashMap::with_capacity(requests.len());
        let mut values: HashMap<Field, Vec<Option<f64>>> = HashMap::new();

        for &(field, window) in requests {
            if stats.contains_key(&(field, window)) {
                continue;
            }
            let extracted = values.entry(field).or_insert_with(|| field.extract(bars));
            stats.insert((field, window), RollingStats::compute(extracted, window));
        }

        Self { values, stats }
    }

    /// Raw per-bar values of a requested field.
    pub fn values(&self, field: Field) -> Option<&[Option<f64>]> {
        self.values.get(&field).map(Vec::as_slice)
    }

    /// Each bar's value divided by its trailing mean, `None` where the mean is ≈0.
    pub fn relative_to_mean(
        &self,
        field: Field,
        window: usize,
        epsilon: f64,
    ) -> Result<Vec<Option<f64>>> {
        let stats = self.require(field, window)?;
        let values = self.values(field).unwrap_or_default();
        Ok(stats.ratio_to_mean(values, epsilon))
    }

    /// Look up precomputed statistics.
    pub fn get(&self, field: Field, window: usize) -> Option<&RollingStats> {
        self.stats.get(&(field, window))
    }

    /// Look up precomputed statistics, failing if the key was never requested.
    pub fn require(&self, field: Field, window: usize) -> Result<&RollingStats> {
        self.get(field, window).ok_or_else(|| {
            Error::Other(format!(
                "rolling statistics for {} over {} bars were not precomputed",
                field.as_str(),
                window
            ))
        })
    }

    /// Number of distinct (field, window) entries.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether nothing was computed.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

//! Core data types for the TAQ microstructure engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bar start timestamp (UTC).
pub type Timestamp = DateTime<Utc>;

/// One fixed-interval trade-and-quote summary bar for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Instrument symbol.
    pub ticker: String,
    /// Interval start; unique per ticker.
    pub bar_start: Timestamp,
    /// First trade price.
    pub open: f64,
    /// Highest trade price.
    pub high: f64,
    /// Lowest trade price.
    pub low: f64,
    /// Last trade price.
    pub close: f64,
    /// Volume-weighted average trade price.
    pub volume_weighted_price: f64,
    /// Narrowest quoted spread.
    pub min_spread: f64,
    /// Widest quoted spread.
    pub max_spread: f64,
    /// Time-averaged spread.
    pub avg_spread: f64,
    /// Standard deviation of the spread within the bar.
    pub std_spread: f64,
    /// Total traded volume.
    pub volume: u64,
    /// Number of prints.
    pub trade_count: u64,
    /// Buyer-initiated volume.
    pub buy_volume: u64,
    /// Seller-initiated volume.
    pub sell_volume: u64,
    /// Prints at the bid.
    pub trade_at_bid: u64,
    /// Prints at the ask.
    pub trade_at_ask: u64,
    /// NBBO quote updates.
    pub nbbo_quote_count: u64,
}

impl Bar {
    /// Width of the spread range within the bar.
    #[inline]
    pub fn spread_range(&self) -> f64 {
        self.max_spread - self.min_spread
    }

    /// Signed volume delta: buy volume minus sell volume.
    #[inline]
    pub fn volume_delta(&self) -> f64 {
        self.buy_volume as f64 - self.sell_volume as f64
    }

    /// Volume that was neither buyer- nor seller-classified.
    #[inline]
    pub fn unclassified_volume(&self) -> u64 {
        self.volume
            .saturating_sub(self.buy_volume.saturating_add(self.sell_volume))
    }
}

/// Bar field names, used to point at the offending value in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarField {
    Ticker,
    BarStart,
    Open,
    High,
    Low,
    Close,
    VolumeWeightedPrice,
    MinSpread,
    MaxSpread,
    AvgSpread,
    StdSpread,
    Volume,
    TradeCount,
    BuyVolume,
    SellVolume,
    TradeAtBid,
    TradeAtAsk,
    NbboQuoteCount,
}

impl BarField {
    /// Schema name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            BarField::Ticker => "ticker",
            BarField::BarStart => "bar_start",
            BarField::Open => "open",
            BarField::High => "high",
            BarField::Low => "low",
            BarField::Close => "close",
            BarField::VolumeWeightedPrice => "volume_weighted_price",
            BarField::MinSpread => "min_spread",
            BarField::MaxSpread => "max_spread",
            BarField::AvgSpread => "avg_spread",
            BarField::StdSpread => "std_spread",
            BarField::Volume => "volume",
            BarField::TradeCount => "trade_count",
            BarField::BuyVolume => "buy_volume",
            BarField::SellVolume => "sell_volume",
            BarField::TradeAtBid => "trade_at_bid",
            BarField::TradeAtAsk => "trade_at_ask",
            BarField::NbboQuoteCount => "nbbo_quote_count",
        }
    }
}

impl fmt::Display for BarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point of a metric series. `value` is `None` where the formula is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub bar_start: Timestamp,
    pub value: Option<f64>,
}

/// Metric values aligned 1:1 with an input bar sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSeries {
    points: Vec<MetricPoint>,
}

impl MetricSeries {
    /// Pair per-bar values with their bars.
    ///
    /// `values` must have exactly one entry per bar.
    pub fn from_values(bars: &[Bar], values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(bars.len(), values.len(), "series must align with bars");
        let points = bars
            .iter()
            .zip(values)
            .map(|(bar, value)| MetricPoint {
                bar_start: bar.bar_start,
                value,
            })
            .collect();
        Self { points }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value at position `index`, `None` if out of range or undefined.
    pub fn value(&self, index: usize) -> Option<f64> {
        self.points.get(index).and_then(|p| p.value)
    }

    /// All values in order.
    pub fn values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Borrow the points.
    pub fn points(&self) -> &[MetricPoint] {
        &self.points
    }

    /// Iterate over the points.
    pub fn iter(&self) -> impl Iterator<Item = &MetricPoint> {
        self.points.iter()
    }

    /// Iterate over defined values only.
    pub fn defined(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().filter_map(|p| p.value)
    }
}

/// A categorical tag derived from a metric through fixed thresholds.
pub trait RegimeLabel: Copy + fmt::Debug {
    /// Lowercase tag used on the wire.
    fn as_str(&self) -> &'static str;
}

/// Flow regime derived from the magnitude of the aggression ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowRegime {
    /// Two-sided flow, no dominant aggressor.
    Mixed,
    /// Directional but not one-sided.
    Retail,
    /// Strongly one-sided flow.
    Institutional,
}

impl RegimeLabel for FlowRegime {
    fn as_str(&self) -> &'static str {
        match self {
            FlowRegime::Mixed => "mixed",
            FlowRegime::Retail => "retail",
            FlowRegime::Institutional => "institutional",
        }
    }
}

/// Liquidity regime derived from the composite liquidity risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityRegime {
    Low,
    Elevated,
    Stressed,
}

impl RegimeLabel for LiquidityRegime {
    fn as_str(&self) -> &'static str {
        match self {
            LiquidityRegime::Low => "low",
            LiquidityRegime::Elevated => "elevated",
            LiquidityRegime::Stressed => "stressed",
        }
    }
}

/// One point of a label series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelPoint<L> {
    pub bar_start: Timestamp,
    pub label: Option<L>,
}

/// Regime labels aligned 1:1 with an input bar sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSeries<L> {
    points: Vec<LabelPoint<L>>,
}

impl<L> Default for LabelSeries<L> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<L: RegimeLabel> LabelSeries<L> {
    /// Build from a list of (bar_start, label) points.
    pub fn new(points: Vec<LabelPoint<L>>) -> Self {
        Self { points }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Label at position `index`.
    pub fn label(&self, index: usize) -> Option<L> {
        self.points.get(index).and_then(|p| p.label)
    }

    /// Borrow the points.
    pub fn points(&self) -> &[LabelPoint<L>] {
        &self.points
    }

    /// Erase the label type, keeping only the wire tags.
    pub fn to_tags(&self) -> LabelSeries<&'static str> {
        LabelSeries {
            points: self
                .points
                .iter()
                .map(|p| LabelPoint {
                    bar_start: p.bar_start,
                    label: p.label.map(|l| l.as_str()),
                })
                .collect(),
        }
    }
}

impl RegimeLabel for &'static str {
    fn as_str(&self) -> &'static str {
        *self
    }
}

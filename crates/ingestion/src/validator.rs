//! Bar sequence validation.
//!
//! Rejects malformed input before any metric is computed. The first
//! offending bar fails the whole batch; nothing is reordered or repaired.

use taq_core::{Bar, BarField, Error, Result};
use tracing::warn;

/// Validator for an ordered, single-ticker bar sequence.
#[derive(Debug, Clone)]
pub struct BarValidator {
    /// Absolute slack allowed on the `min <= avg <= max` spread ordering.
    spread_slack: f64,
}

impl Default for BarValidator {
    fn default() -> Self {
        Self { spread_slack: 1e-9 }
    }
}

impl BarValidator {
    /// Create a validator with the given spread ordering slack.
    pub fn new(spread_slack: f64) -> Self {
        Self {
            spread_slack: spread_slack.abs(),
        }
    }

    /// Validate a whole sequence. An empty sequence is valid.
    pub fn validate(&self, bars: &[Bar]) -> Result<()> {
        let Some(first) = bars.first() else {
            return Ok(());
        };

        for (index, bar) in bars.iter().enumerate() {
            let checked = self.check_bar(index, bar).and_then(|()| {
                if bar.ticker != first.ticker {
                    return Err(Error::validation(
                        index,
                        bar.bar_start,
                        BarField::Ticker,
                        format!("is {:?}, sequence ticker is {:?}", bar.ticker, first.ticker),
                    ));
                }
                if index > 0 && bar.bar_start <= bars[index - 1].bar_start {
                    return Err(Error::validation(
                        index,
                        bar.bar_start,
                        BarField::BarStart,
                        format!("not after previous bar at {}", bars[index - 1].bar_start),
                    ));
                }
                Ok(())
            });

            if let Err(err) = checked {
                warn!(ticker = %first.ticker, index, error = %err, "rejecting bar sequence");
                return Err(err);
            }
        }

        Ok(())
    }

    /// Field contracts for a single bar.
    pub fn check_bar(&self, index: usize, bar: &Bar) -> Result<()> {
        let fail = |field: BarField, reason: String| {
            Err(Error::validation(index, bar.bar_start, field, reason))
        };

        if bar.ticker.trim().is_empty() {
            return fail(BarField::Ticker, "is empty".to_string());
        }

        for (field, price) in [
            (BarField::Open, bar.open),
            (BarField::High, bar.high),
            (BarField::Low, bar.low),
            (BarField::Close, bar.close),
            (BarField::VolumeWeightedPrice, bar.volume_weighted_price),
        ] {
            if !price.is_finite() || price <= 0.0 {
                return fail(field, format!("must be a positive price, got {price}"));
            }
        }
        if bar.high < bar.low {
            return fail(
                BarField::High,
                format!("{} is below low {}", bar.high, bar.low),
            );
        }

        for (field, spread) in [
            (BarField::MinSpread, bar.min_spread),
            (BarField::MaxSpread, bar.max_spread),
            (BarField::AvgSpread, bar.avg_spread),
            (BarField::StdSpread, bar.std_spread),
        ] {
            if !spread.is_finite() || spread < 0.0 {
                return fail(field, format!("must be non-negative, got {spread}"));
            }
        }
        if bar.min_spread > bar.avg_spread + self.spread_slack {
            return fail(
                BarField::MinSpread,
                format!("{} exceeds avg_spread {}", bar.min_spread, bar.avg_spread),
            );
        }
        if bar.avg_spread > bar.max_spread + self.spread_slack {
            return fail(
                BarField::AvgSpread,
                format!("{} exceeds max_spread {}", bar.avg_spread, bar.max_spread),
            );
        }

        let classified = bar.buy_volume.checked_add(bar.sell_volume);
        if classified.map_or(true, |v| v > bar.volume) {
            return fail(
                BarField::BuyVolume,
                format!(
                    "buy {} + sell {} exceeds volume {}",
                    bar.buy_volume, bar.sell_volume, bar.volume
                ),
            );
        }

        for (field, count) in [
            (BarField::TradeAtBid, bar.trade_at_bid),
            (BarField::TradeAtAsk, bar.trade_at_ask),
        ] {
            if count > bar.trade_count {
                return fail(
                    field,
                    format!("{count} exceeds trade_count {}", bar.trade_count),
                );
            }
        }

        Ok(())
    }
}

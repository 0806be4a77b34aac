//! Well-formed bars for unit tests.

use chrono::{Duration, TimeZone, Utc};
use taq_core::Bar;

/// A quiet, valid 1-minute AAPL bar `minute` minutes after the open.
pub(crate) fn bar(minute: i64) -> Bar {
    Bar {
        ticker: "AAPL".to_string(),
        bar_start: Utc.with_ymd_and_hms(2020, 1, 28, 14, 30, 0).unwrap()
            + Duration::minutes(minute),
        open: 100.0,
        high: 100.5,
        low: 99.5,
        close: 100.0,
        volume_weighted_price: 100.0,
        min_spread: 0.01,
        max_spread: 0.05,
        avg_spread: 0.02,
        std_spread: 0.01,
        volume: 1_000,
        trade_count: 50,
        buy_volume: 500,
        sell_volume: 400,
        trade_at_bid: 20,
        trade_at_ask: 20,
        nbbo_quote_count: 200,
    }
}

/// `n` consecutive quiet bars.
pub(crate) fn bars(n: i64) -> Vec<Bar> {
    (0..n).map(bar).collect()
}

/// Consecutive bars with the given closes; VWAP tracks the close.
pub(crate) fn bars_with_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let mut b = bar(i as i64);
            b.open = close;
            b.high = close + 0.5;
            b.low = close - 0.5;
            b.close = close;
            b.volume_weighted_price = close;
            b
        })
        .collect()
}

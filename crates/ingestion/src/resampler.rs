//! Bar resampling.
//!
//! Rolls a validated 1-minute sequence up into fixed N-minute buckets or
//! one bar per regular trading session.

use crate::validator::BarValidator;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use taq_core::{Bar, Error, Result, Timestamp};
use tracing::debug;

/// Regular trading hours, expressed in a fixed local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHours {
    /// Session open, minutes after local midnight (inclusive).
    pub open_minute: u32,
    /// Session close, minutes after local midnight (exclusive).
    pub close_minute: u32,
    /// Local offset from UTC in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for SessionHours {
    /// 09:30 to 16:00 at UTC-05:00.
    fn default() -> Self {
        Self {
            open_minute: 9 * 60 + 30,
            close_minute: 16 * 60,
            utc_offset_minutes: -5 * 60,
        }
    }
}

impl SessionHours {
    fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            Error::config(format!(
                "utc offset of {} minutes is out of range",
                self.utc_offset_minutes
            ))
        })
    }

    fn contains(&self, minute_of_day: u32) -> bool {
        minute_of_day >= self.open_minute && minute_of_day < self.close_minute
    }

    /// Session open on `date` as a UTC timestamp.
    fn open_on(&self, date: NaiveDate, offset: FixedOffset) -> Result<Timestamp> {
        let local = date
            .and_hms_opt(self.open_minute / 60, self.open_minute % 60, 0)
            .ok_or_else(|| Error::data(format!("no session open on {date}")))?;
        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| Error::data(format!("ambiguous session open on {date}")))
    }
}

/// Target resolution of a resample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Buckets of this many minutes, aligned to the epoch.
    Minutes(u32),
    /// One bar per local date, regular hours only.
    Session(SessionHours),
}

impl FromStr for Resolution {
    type Err = Error;

    /// Parses `"session"` or a minute count such as `"5"`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("session") {
            return Ok(Resolution::Session(SessionHours::default()));
        }
        s.parse::<u32>()
            .map(Resolution::Minutes)
            .map_err(|_| Error::config(format!("unknown resolution {s:?}")))
    }
}

/// Running aggregate of the bars falling into one bucket.
#[derive(Debug, Clone)]
struct BucketAccumulator {
    bar_start: Timestamp,
    ticker: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    vwap_numerator: f64,
    vwap_sum: f64,
    min_spread: f64,
    max_spread: f64,
    avg_spread_sum: f64,
    avg_spread_sq_sum: f64,
    std_spread_sq_sum: f64,
    volume: u64,
    trade_count: u64,
    buy_volume: u64,
    sell_volume: u64,
    trade_at_bid: u64,
    trade_at_ask: u64,
    nbbo_quote_count: u64,
    bars: u32,
}

impl BucketAccumulator {
    fn new(bar_start: Timestamp, first: &Bar) -> Self {
        Self {
            bar_start,
            ticker: first.ticker.clone(),
            open: first.open,
            high: f64::NEG_INFINITY,
            low: f64::INFINITY,
            close: first.close,
            vwap_numerator: 0.0,
            vwap_sum: 0.0,
            min_spread: f64::INFINITY,
            max_spread: f64::NEG_INFINITY,
            avg_spread_sum: 0.0,
            avg_spread_sq_sum: 0.0,
            std_spread_sq_sum: 0.0,
            volume: 0,
            trade_count: 0,
            buy_volume: 0,
            sell_volume: 0,
            trade_at_bid: 0,
            trade_at_ask: 0,
            nbbo_quote_count: 0,
            bars: 0,
        }
    }

    fn add(&mut self, bar: &Bar) {
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.vwap_numerator += bar.volume_weighted_price * bar.volume as f64;
        self.vwap_sum += bar.volume_weighted_price;
        self.min_spread = self.min_spread.min(bar.min_spread);
        self.max_spread = self.max_spread.max(bar.max_spread);
        self.avg_spread_sum += bar.avg_spread;
        self.avg_spread_sq_sum += bar.avg_spread * bar.avg_spread;
        self.std_spread_sq_sum += bar.std_spread * bar.std_spread;
        self.volume += bar.volume;
        self.trade_count += bar.trade_count;
        self.buy_volume += bar.buy_volume;
        self.sell_volume += bar.sell_volume;
        self.trade_at_bid += bar.trade_at_bid;
        self.trade_at_ask += bar.trade_at_ask;
        self.nbbo_quote_count += bar.nbbo_quote_count;
        self.bars += 1;
    }

    fn to_bar(&self) -> Bar {
        let n = f64::from(self.bars.max(1));
        let avg_spread = self.avg_spread_sum / n;
        // Pooled dispersion: within-bar variance plus variance of the bar averages.
        let between = (self.avg_spread_sq_sum / n - avg_spread * avg_spread).max(0.0);
        let std_spread = (self.std_spread_sq_sum / n + between).sqrt();
        let volume_weighted_price = if self.volume > 0 {
            self.vwap_numerator / self.volume as f64
        } else {
            self.vwap_sum / n
        };

        Bar {
            ticker: self.ticker.clone(),
            bar_start: self.bar_start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume_weighted_price,
            min_spread: self.min_spread,
            max_spread: self.max_spread,
            avg_spread: avg_spread.clamp(self.min_spread, self.max_spread),
            std_spread,
            volume: self.volume,
            trade_count: self.trade_count,
            buy_volume: self.buy_volume,
            sell_volume: self.sell_volume,
            trade_at_bid: self.trade_at_bid,
            trade_at_ask: self.trade_at_ask,
            nbbo_quote_count: self.nbbo_quote_count,
        }
    }
}

/// Resampler from fine bars to a coarser [`Resolution`].
#[derive(Debug, Clone)]
pub struct BarResampler {
    resolution: Resolution,
    validator: BarValidator,
}

impl BarResampler {
    /// Create a resampler, rejecting degenerate resolutions.
    pub fn new(resolution: Resolution) -> Result<Self> {
        match resolution {
            Resolution::Minutes(0) => {
                return Err(Error::config("resample interval must be positive"));
            }
            Resolution::Session(hours) => {
                hours.offset()?;
                if hours.open_minute >= hours.close_minute || hours.close_minute > 24 * 60 {
                    return Err(Error::config(format!(
                        "session hours {}..{} are not a valid range",
                        hours.open_minute, hours.close_minute
                    )));
                }
            }
            Resolution::Minutes(_) => {}
        }

        Ok(Self {
            resolution,
            validator: BarValidator::default(),
        })
    }

    /// Target resolution.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Resample a sequence. The input is validated first.
    pub fn resample(&self, bars: &[Bar]) -> Result<Vec<Bar>> {
        self.validator.validate(bars)?;

        let mut out = Vec::new();
        let mut current: Option<(i64, BucketAccumulator)> = None;

        for bar in bars {
            let Some((key, bucket_start)) = self.bucket_of(bar.bar_start)? else {
                continue;
            };

            match current.as_mut() {
                Some((current_key, acc)) if *current_key == key => acc.add(bar),
                _ => {
                    if let Some((_, acc)) = current.take() {
                        out.push(acc.to_bar());
                    }
                    let mut acc = BucketAccumulator::new(bucket_start, bar);
                    acc.add(bar);
                    current = Some((key, acc));
                }
            }
        }

        if let Some((_, acc)) = current {
            out.push(acc.to_bar());
        }

        self.validator.validate(&out)?;
        debug!(
            resolution = ?self.resolution,
            input = bars.len(),
            output = out.len(),
            "resampled bars"
        );
        Ok(out)
    }

    /// Bucket key and bucket start for a bar, `None` when the bar is excluded.
    fn bucket_of(&self, bar_start: Timestamp) -> Result<Option<(i64, Timestamp)>> {
        match self.resolution {
            Resolution::Minutes(minutes) => {
                let width = i64::from(minutes) * 60;
                let key = bar_start.timestamp().div_euclid(width);
                let start = DateTime::<Utc>::from_timestamp(key * width, 0)
                    .ok_or_else(|| Error::data(format!("bucket {key} is out of range")))?;
                Ok(Some((key, start)))
            }
            Resolution::Session(hours) => {
                let offset = hours.offset()?;
                let local = bar_start.with_timezone(&offset);
                let minute_of_day = local.time().num_seconds_from_midnight() / 60;
                if !hours.contains(minute_of_day) {
                    return Ok(None);
                }
                let date = local.date_naive();
                let start = hours.open_on(date, offset)?;
                let key = i64::from(date.num_days_from_ce());
                Ok(Some((key, start)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::Duration;

    fn make_bar(start: Timestamp, close: f64, volume: u64) -> Bar {
        Bar {
            ticker: "AAPL".to_string(),
            bar_start: start,
            open: close - 0.1,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume_weighted_price: close,
            min_spread: 0.01,
            max_spread: 0.05,
            avg_spread: 0.02,
            std_spread: 0.01,
            volume,
            trade_count: 10,
            buy_volume: volume / 2,
            sell_volume: volume / 4,
            trade_at_bid: 3,
            trade_at_ask: 4,
            nbbo_quote_count: 100,
        }
    }

    fn minute_bars(start: Timestamp, count: i64) -> Vec<Bar> {
        (0..count)
            .map(|i| make_bar(start + Duration::minutes(i), 100.0 + i as f64, 100))
            .collect()
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!("15".parse::<Resolution>().unwrap(), Resolution::Minutes(15));
        assert!(matches!(
            "Session".parse::<Resolution>().unwrap(),
            Resolution::Session(_)
        ));
        assert!("hourly".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_zero_minutes_rejected() {
        assert!(BarResampler::new(Resolution::Minutes(0)).is_err());
    }

    #[test]
    fn test_inverted_session_rejected() {
        let hours = SessionHours {
            open_minute: 960,
            close_minute: 570,
            utc_offset_minutes: 0,
        };
        assert!(BarResampler::new(Resolution::Session(hours)).is_err());
    }

    #[test]
    fn test_five_minute_buckets() {
        let start = Utc.with_ymd_and_hms(2020, 1, 28, 14, 30, 0).unwrap();
        let bars = minute_bars(start, 10);
        let resampler = BarResampler::new(Resolution::Minutes(5)).unwrap();
        let out = resampler.resample(&bars).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].bar_start, start);
        assert_eq!(out[1].bar_start, start + Duration::minutes(5));

        let first = &out[0];
        assert_abs_diff_eq!(first.open, 99.9);
        assert_abs_diff_eq!(first.close, 104.0);
        assert_abs_diff_eq!(first.high, 104.5);
        assert_abs_diff_eq!(first.low, 99.5);
        assert_eq!(first.volume, 500);
        assert_eq!(first.trade_count, 50);
        assert_eq!(first.trade_at_ask, 20);
        // Equal volumes: VWAP is the plain mean of 100..=104.
        assert_abs_diff_eq!(first.volume_weighted_price, 102.0, epsilon = 1e-9);
        // Identical bar spreads pool to the same dispersion.
        assert_abs_diff_eq!(first.std_spread, 0.01, epsilon = 1e-12);

        assert!(BarValidator::default().validate(&out).is_ok());
    }

    #[test]
    fn test_unaligned_start_uses_bucket_boundary() {
        let start = Utc.with_ymd_and_hms(2020, 1, 28, 14, 32, 0).unwrap();
        let bars = minute_bars(start, 4);
        let out = BarResampler::new(Resolution::Minutes(5))
            .unwrap()
            .resample(&bars)
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0].bar_start,
            Utc.with_ymd_and_hms(2020, 1, 28, 14, 30, 0).unwrap()
        );
        assert_eq!(out[0].volume, 300);
        assert_eq!(out[1].volume, 100);
    }

    #[test]
    fn test_zero_volume_bucket_vwap_falls_back_to_mean() {
        let start = Utc.with_ymd_and_hms(2020, 1, 28, 14, 30, 0).unwrap();
        let mut bars = minute_bars(start, 2);
        for bar in &mut bars {
            bar.volume = 0;
            bar.buy_volume = 0;
            bar.sell_volume = 0;
        }
        let out = BarResampler::new(Resolution::Minutes(5))
            .unwrap()
            .resample(&bars)
            .unwrap();
        assert_abs_diff_eq!(out[0].volume_weighted_price, 100.5);
    }

    #[test]
    fn test_session_filters_extended_hours() {
        // 14:00 UTC is 09:00 at UTC-5 (pre-market), 14:30 UTC is the open.
        let pre = Utc.with_ymd_and_hms(2020, 1, 28, 14, 0, 0).unwrap();
        let open = Utc.with_ymd_and_hms(2020, 1, 28, 14, 30, 0).unwrap();
        let last = Utc.with_ymd_and_hms(2020, 1, 28, 20, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2020, 1, 28, 21, 0, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2020, 1, 29, 15, 0, 0).unwrap();

        let bars = vec![
            make_bar(pre, 99.0, 1_000),
            make_bar(open, 100.0, 100),
            make_bar(last, 102.0, 300),
            make_bar(after, 103.0, 1_000),
            make_bar(next_day, 104.0, 50),
        ];

        let out = BarResampler::new(Resolution::Session(SessionHours::default()))
            .unwrap()
            .resample(&bars)
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].bar_start, open);
        assert_eq!(out[0].volume, 400);
        assert_abs_diff_eq!(out[0].close, 102.0);
        // (100 * 100 + 102 * 300) / 400
        assert_abs_diff_eq!(out[0].volume_weighted_price, 101.5, epsilon = 1e-9);
        assert_eq!(
            out[1].bar_start,
            Utc.with_ymd_and_hms(2020, 1, 29, 14, 30, 0).unwrap()
        );
        assert_eq!(out[1].volume, 50);
    }

    #[test]
    fn test_pooled_spread_dispersion() {
        let start = Utc.with_ymd_and_hms(2020, 1, 28, 14, 30, 0).unwrap();
        let mut bars = minute_bars(start, 2);
        bars[0].avg_spread = 0.02;
        bars[0].std_spread = 0.0;
        bars[1].avg_spread = 0.04;
        bars[1].std_spread = 0.0;

        let out = BarResampler::new(Resolution::Minutes(5))
            .unwrap()
            .resample(&bars)
            .unwrap();

        assert_abs_diff_eq!(out[0].avg_spread, 0.03, epsilon = 1e-12);
        assert_abs_diff_eq!(out[0].std_spread, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_input_rejected() {
        let start = Utc.with_ymd_and_hms(2020, 1, 28, 14, 30, 0).unwrap();
        let mut bars = minute_bars(start, 3);
        bars.swap(0, 2);
        assert!(BarResampler::new(Resolution::Minutes(5))
            .unwrap()
            .resample(&bars)
            .is_err());
    }
}

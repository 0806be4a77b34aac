//! Configuration structures for the metrics engine.
//!
//! Every tunable the analysis modules consume lives here, with its
//! documented default. Nothing is read from globals.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for the metrics engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine-wide numeric settings.
    pub engine: EngineConfig,
    /// VWAP module configuration.
    pub vwap: VwapConfig,
    /// Volume module configuration.
    pub volume: VolumeConfig,
    /// Order flow module configuration.
    pub order_flow: OrderFlowConfig,
    /// Liquidity module configuration.
    pub liquidity: LiquidityConfig,
}

impl Config {
    /// Set the rolling window of every module at once.
    pub fn with_window(mut self, window: usize) -> Self {
        self.vwap.window = window;
        self.volume.window = window;
        self.order_flow.window = window;
        self.liquidity.window = window;
        self
    }

    /// Check every section, failing on the first bad value.
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        check_window("vwap.window", self.vwap.window)?;
        self.volume.validate()?;
        check_window("order_flow.window", self.order_flow.window)?;
        self.liquidity.validate()
    }
}

/// Engine-wide numeric settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Denominators with magnitude below this are treated as zero.
    pub epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { epsilon: 1e-9 }
    }
}

impl EngineConfig {
    fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(Error::config(format!(
                "engine.epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// VWAP module configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VwapConfig {
    /// Rolling window (bars) for the volume mean behind volume intensity.
    pub window: usize,
}

impl Default for VwapConfig {
    fn default() -> Self {
        Self { window: 20 }
    }
}

/// Volume module configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Rolling window (bars) for algorithmic-flow detection.
    pub window: usize,
    /// Relative tolerance for two bars to count as a repeat pattern.
    pub repeat_tolerance: f64,
    /// |aggression| at or above this is directional (retail).
    pub directional_at: f64,
    /// |aggression| at or above this is institutional.
    pub institutional_at: f64,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            window: 20,
            repeat_tolerance: 0.05,
            directional_at: 0.2,
            institutional_at: 0.5,
        }
    }
}

impl VolumeConfig {
    fn validate(&self) -> Result<()> {
        check_window("volume.window", self.window)?;
        if !(0.0..1.0).contains(&self.repeat_tolerance) {
            return Err(Error::config(format!(
                "volume.repeat_tolerance must be in [0, 1), got {}",
                self.repeat_tolerance
            )));
        }
        check_ascending("volume", &[self.directional_at, self.institutional_at])
    }

    /// Cut points for the aggression regime, ascending.
    pub fn cuts(&self) -> Vec<f64> {
        vec![self.directional_at, self.institutional_at]
    }
}

/// Order flow module configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderFlowConfig {
    /// Rolling window (bars) for volume, spread dispersion and trade count means.
    pub window: usize,
}

impl Default for OrderFlowConfig {
    fn default() -> Self {
        Self { window: 20 }
    }
}

/// Liquidity module configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidityConfig {
    /// Rolling window (bars) for return volatility and quote intensity.
    pub window: usize,
    /// Weight of the spread liquidity risk (percent scale).
    pub risk_weight: f64,
    /// Weight of the liquidity stress ratio (dimensionless, ~1.0 at baseline).
    pub stress_weight: f64,
    /// Composite score at or above this is elevated.
    pub elevated_at: f64,
    /// Composite score at or above this is stressed.
    pub stressed_at: f64,
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self {
            window: 20,
            risk_weight: 0.5,
            stress_weight: 25.0,
            elevated_at: 50.0,
            stressed_at: 80.0,
        }
    }
}

impl LiquidityConfig {
    fn validate(&self) -> Result<()> {
        check_window("liquidity.window", self.window)?;
        for (name, weight) in [
            ("liquidity.risk_weight", self.risk_weight),
            ("liquidity.stress_weight", self.stress_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::config(format!(
                    "{name} must be finite and non-negative, got {weight}"
                )));
            }
        }
        if self.risk_weight == 0.0 && self.stress_weight == 0.0 {
            return Err(Error::config("liquidity weights cannot both be zero"));
        }
        check_ascending("liquidity", &[self.elevated_at, self.stressed_at])
    }

    /// Cut points for the liquidity regime, ascending.
    pub fn cuts(&self) -> Vec<f64> {
        vec![self.elevated_at, self.stressed_at]
    }
}

fn check_window(name: &str, window: usize) -> Result<()> {
    if window == 0 {
        return Err(Error::config(format!("{name} must be positive")));
    }
    Ok(())
}

fn check_ascending(section: &str, cuts: &[f64]) -> Result<()> {
    if cuts.iter().any(|c| !c.is_finite()) {
        return Err(Error::config(format!(
            "{section} thresholds must be finite, got {cuts:?}"
        )));
    }
    if cuts.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::config(format!(
            "{section} thresholds must be strictly ascending, got {cuts:?}"
        )));
    }
    Ok(())
}

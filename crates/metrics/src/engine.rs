//! Metrics computation engine.
//!
//! Validates a bar sequence, computes the shared rolling statistics once
//! and fans out to every analysis module.

use crate::{
    liquidity::{LiquidityAnalyzer, LiquidityMetrics},
    order_flow::{FlowMetrics, OrderFlowAnalyzer},
    spread::{SpreadAnalyzer, SpreadMetrics},
    volume::{VolumeAnalyzer, VolumeMetrics},
    vwap::{VwapAnalyzer, VwapMetrics},
    window::WindowStats,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use taq_core::{Bar, Config, Error, LabelSeries, MetricSeries, Result};
use taq_ingestion::BarValidator;
use tracing::debug;

/// Analysis module selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Spread,
    Vwap,
    Volume,
    OrderFlow,
    Liquidity,
}

impl Module {
    /// Every module, in computation order.
    pub const ALL: [Module; 5] = [
        Module::Spread,
        Module::Vwap,
        Module::Volume,
        Module::OrderFlow,
        Module::Liquidity,
    ];

    /// Lowercase module name.
    pub fn as_str(self) -> &'static str {
        match self {
            Module::Spread => "spread",
            Module::Vwap => "vwap",
            Module::Volume => "volume",
            Module::OrderFlow => "order_flow",
            Module::Liquidity => "liquidity",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spread" => Ok(Module::Spread),
            "vwap" => Ok(Module::Vwap),
            "volume" => Ok(Module::Volume),
            "order_flow" | "order-flow" | "orderflow" => Ok(Module::OrderFlow),
            "liquidity" => Ok(Module::Liquidity),
            other => Err(Error::config(format!("unknown module: {other:?}"))),
        }
    }
}

/// Named metric and regime series of one module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleReport {
    pub module: Module,
    pub metrics: BTreeMap<&'static str, MetricSeries>,
    pub regimes: BTreeMap<&'static str, LabelSeries<&'static str>>,
}

impl ModuleReport {
    fn new(
        module: Module,
        metrics: Vec<(&'static str, &MetricSeries)>,
        regimes: Vec<(&'static str, LabelSeries<&'static str>)>,
    ) -> Self {
        Self {
            module,
            metrics: metrics
                .into_iter()
                .map(|(name, series)| (name, series.clone()))
                .collect(),
            regimes: regimes.into_iter().collect(),
        }
    }
}

/// Every module's metrics for one bar sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineOutput {
    /// Instrument of the sequence, `None` for empty input.
    pub ticker: Option<String>,
    pub bar_count: usize,
    pub spread: SpreadMetrics,
    pub vwap: VwapMetrics,
    pub volume: VolumeMetrics,
    pub order_flow: FlowMetrics,
    pub liquidity: LiquidityMetrics,
}

impl EngineOutput {
    /// Flatten one module into named series.
    pub fn report(&self, module: Module) -> ModuleReport {
        match module {
            Module::Spread => ModuleReport::new(module, self.spread.series(), Vec::new()),
            Module::Vwap => ModuleReport::new(module, self.vwap.series(), Vec::new()),
            Module::Volume => {
                ModuleReport::new(module, self.volume.series(), self.volume.regimes())
            }
            Module::OrderFlow => ModuleReport::new(module, self.order_flow.series(), Vec::new()),
            Module::Liquidity => {
                ModuleReport::new(module, self.liquidity.series(), self.liquidity.regimes())
            }
        }
    }
}

/// Metrics computation engine.
///
/// Holds no state between calls: the same input always yields the same
/// output, and distinct engines may run on distinct threads.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    config: Config,
    validator: BarValidator,
    spread: SpreadAnalyzer,
    vwap: VwapAnalyzer,
    volume: VolumeAnalyzer,
    order_flow: OrderFlowAnalyzer,
    liquidity: LiquidityAnalyzer,
}

impl MetricsEngine {
    /// Create an engine, rejecting an invalid configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let eps = config.engine.epsilon;

        Ok(Self {
            validator: BarValidator::default(),
            spread: SpreadAnalyzer::new(eps),
            vwap: VwapAnalyzer::new(config.vwap.window, eps),
            volume: VolumeAnalyzer::new(&config.volume, eps)?,
            order_flow: OrderFlowAnalyzer::new(config.order_flow.window, eps),
            liquidity: LiquidityAnalyzer::new(&config.liquidity, eps)?,
            config,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compute every module over a validated bar sequence.
    pub fn compute(&self, bars: &[Bar]) -> Result<EngineOutput> {
        self.validator.validate(bars)?;

        let ticker = bars.first().map(|b| b.ticker.clone());
        if bars.is_empty() {
            debug!("empty bar sequence, nothing to compute");
            return Ok(EngineOutput::default());
        }

        let requests: Vec<_> = self
            .vwap
            .requirements()
            .into_iter()
            .chain(self.order_flow.requirements())
            .chain(self.liquidity.requirements())
            .collect();
        let stats = WindowStats::build(bars, &requests);
        debug!(
            ticker = ticker.as_deref().unwrap_or_default(),
            bars = bars.len(),
            rolling_series = stats.len(),
            "computing metrics"
        );

        let spread = self.spread.compute(bars);
        let vwap = self.vwap.compute(bars, &stats)?;
        let volume = self.volume.compute(bars, &vwap.momentum_score);
        let order_flow = self.order_flow.compute(bars, &stats)?;
        let liquidity = self.liquidity.compute(
            bars,
            &stats,
            &spread.liquidity_risk,
            &order_flow.liquidity_stress,
        )?;

        Ok(EngineOutput {
            ticker,
            bar_count: bars.len(),
            spread,
            vwap,
            volume,
            order_flow,
            liquidity,
        })
    }

    /// Compute and report only the requested modules, in request order.
    ///
    /// An empty request selects every module.
    pub fn compute_modules(&self, bars: &[Bar], modules: &[Module]) -> Result<Vec<ModuleReport>> {
        let output = self.compute(bars)?;
        let modules = if modules.is_empty() {
            &Module::ALL[..]
        } else {
            modules
        };
        Ok(modules.iter().map(|&m| output.report(m)).collect())
    }
}

//! Metrics computation for the TAQ microstructure engine.
//!
//! This crate handles:
//! - Rolling window statistics shared by every module
//! - Threshold-based regime classification
//! - Spread, VWAP, volume, order flow and liquidity analytics
//! - The engine that validates a batch and fans out to the modules
//! - Headline summaries of metric series

pub mod window;
pub mod regime;
pub mod spread;
pub mod vwap;
pub mod volume;
pub mod order_flow;
pub mod liquidity;
pub mod engine;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_support;

pub use window::{Field, RollingStats, WindowStats};
pub use regime::ThresholdClassifier;
pub use spread::{SpreadAnalyzer, SpreadMetrics};
pub use vwap::{VwapAnalyzer, VwapMetrics};
pub use volume::{VolumeAnalyzer, VolumeMetrics};
pub use order_flow::{FlowMetrics, OrderFlowAnalyzer};
pub use liquidity::{LiquidityAnalyzer, LiquidityMetrics};
pub use engine::{EngineOutput, MetricsEngine, Module, ModuleReport};
pub use summary::SeriesSummary;

//! Bar intake for the TAQ microstructure engine.
//!
//! This crate handles:
//! - Bar sequence validation (ordering, single ticker, field contracts)
//! - Resampling 1-minute bars to coarser buckets or trading sessions

pub mod validator;
pub mod resampler;

pub use validator::BarValidator;
pub use resampler::{BarResampler, Resolution, SessionHours};

//! Core types and configuration for the TAQ microstructure engine.
//!
//! This crate provides shared types used across all other crates:
//! - The TAQ bar schema
//! - Metric and regime label series
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

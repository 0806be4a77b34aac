//! `taq-metrics`: compute microstructure metrics over a JSON bar file.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use taq_core::{Bar, Config};
use taq_ingestion::{BarResampler, Resolution};
use taq_metrics::{MetricsEngine, Module, ModuleReport, SeriesSummary};
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about = "Microstructure metrics over TAQ summary bars")]
struct Cli {
    /// JSON array of bars; `-` reads stdin
    #[arg(short, long, value_name = "PATH", default_value = "-")]
    input: String,

    /// JSON configuration file; missing keys take their defaults
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Rolling window for every module, overriding the configuration
    #[arg(short, long)]
    window: Option<usize>,

    /// Module to report (repeatable); all modules when omitted
    #[arg(short, long = "module", value_name = "NAME")]
    modules: Vec<Module>,

    /// Resample to N-minute buckets or regular sessions before computing
    #[arg(long, value_name = "N|session")]
    resample: Option<Resolution>,

    /// Emit per-series summaries instead of full series
    #[arg(long)]
    summary: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Serialize)]
struct Report<T> {
    ticker: Option<String>,
    bar_count: usize,
    modules: Vec<T>,
}

#[derive(Debug, Serialize)]
struct ModuleSummary {
    module: Module,
    metrics: BTreeMap<&'static str, SeriesSummary>,
}

impl From<&ModuleReport> for ModuleSummary {
    fn from(report: &ModuleReport) -> Self {
        Self {
            module: report.module,
            metrics: report
                .metrics
                .iter()
                .map(|(&name, series)| (name, SeriesSummary::from_series(series)))
                .collect(),
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let input = read_input(&cli.input)?;
    let output = run(&cli, &input)?;
    println!("{output}");

    Ok(())
}

/// Logs go to stderr so stdout carries only JSON.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read bars from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => Config::default(),
    };
    Ok(match cli.window {
        Some(window) => config.with_window(window),
        None => config,
    })
}

/// Parse, optionally resample, compute and render one document.
fn run(cli: &Cli, input: &str) -> Result<String> {
    let config = load_config(cli)?;
    let engine = MetricsEngine::new(config).context("invalid configuration")?;

    let mut bars: Vec<Bar> = serde_json::from_str(input).context("failed to parse bars")?;
    if let Some(resolution) = cli.resample {
        let before = bars.len();
        bars = BarResampler::new(resolution)?
            .resample(&bars)
            .context("failed to resample bars")?;
        info!(before, after = bars.len(), ?resolution, "resampled bars");
    }

    let reports = engine
        .compute_modules(&bars, &cli.modules)
        .context("failed to compute metrics")?;
    info!(bars = bars.len(), modules = reports.len(), "computed metrics");

    let ticker = bars.first().map(|b| b.ticker.clone());
    let bar_count = bars.len();
    if cli.summary {
        render(
            &Report {
                ticker,
                bar_count,
                modules: reports.iter().map(ModuleSummary::from).collect(),
            },
            cli.pretty,
        )
    } else {
        render(
            &Report {
                ticker,
                bar_count,
                modules: reports,
            },
            cli.pretty,
        )
    }
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

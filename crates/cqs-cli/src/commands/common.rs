//! Shared helpers for CLI commands.

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use num_complex::Complex64;
use serde::Serialize;
use tracing::warn;

use cqs_core::{
    AccessMode, CancellationToken, CirculantModel, CombinationSolver, CqsResult, Orchestrator,
    OverlapSource, RecordSink, SolverStrategy, SourceOptions, StateInput, ThresholdOutcome,
};
use cqs_hal::BackendConfig;

use cqs_cli::default_registry;

/// Build an orchestrator for `access`, configuring the backend in circuit mode.
pub fn build_orchestrator(
    model: CirculantModel,
    state: &StateInput,
    access: &str,
    options: &SourceOptions,
    solver: SolverStrategy,
    backend: Option<BackendConfig>,
) -> Result<Orchestrator> {
    let mut registry = default_registry();
    if let (AccessMode::Circuit(_), Some(config)) = (access.parse::<AccessMode>()?, backend) {
        registry.configure(config);
    }
    let source = OverlapSource::resolve(access, state, options, &registry)?;
    let orchestrator =
        Orchestrator::new(model, source).with_solver(CombinationSolver::new(solver));
    cancel_on_ctrl_c(orchestrator.cancellation_token());
    Ok(orchestrator)
}

/// Cancel `token` on the first Ctrl-C.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling outstanding jobs");
            token.cancel();
        }
    });
}

/// Progress bar over a threshold sweep.
pub fn sweep_progress(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Ticks a progress bar and forwards to an optional inner sink.
pub struct ProgressSink<'a> {
    bar: &'a ProgressBar,
    inner: Option<&'a mut dyn RecordSink>,
}

impl<'a> ProgressSink<'a> {
    pub fn new(bar: &'a ProgressBar, inner: Option<&'a mut dyn RecordSink>) -> Self {
        Self { bar, inner }
    }
}

impl RecordSink for ProgressSink<'_> {
    fn record(&mut self, outcome: &ThresholdOutcome) -> CqsResult<()> {
        if let Some(inner) = self.inner.as_mut() {
            inner.record(outcome)?;
        }
        self.bar.inc(1);
        self.bar
            .set_message(format!("T = {}, loss {:.3e}", outcome.threshold, outcome.result.loss));
        Ok(())
    }
}

/// Summary line per threshold, for JSON output.
#[derive(Debug, Serialize)]
pub struct OutcomeSummary<'a> {
    pub threshold: u32,
    pub loss: f64,
    pub coefficients: &'a [Complex64],
    pub access: &'a str,
    pub shots: Option<u32>,
}

impl<'a> From<&'a ThresholdOutcome> for OutcomeSummary<'a> {
    fn from(outcome: &'a ThresholdOutcome) -> Self {
        Self {
            threshold: outcome.threshold,
            loss: outcome.result.loss,
            coefficients: &outcome.result.coefficients,
            access: &outcome.access_mode,
            shots: outcome.shots,
        }
    }
}

/// Print sweep results as a table or JSON.
pub fn print_outcomes(outcomes: &[ThresholdOutcome], format: &str) -> Result<()> {
    match format.to_lowercase().as_str() {
        "json" => {
            let summary: Vec<OutcomeSummary<'_>> = outcomes.iter().map(Into::into).collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "table" => {
            println!(
                "\n{} Combination results:\n",
                style("✓").green().bold()
            );
            println!("  {:>4}  {:>14}  {}", "T", "loss", "α (first three)");
            for outcome in outcomes {
                let head: Vec<String> = outcome
                    .result
                    .coefficients
                    .iter()
                    .take(3)
                    .map(|c| format!("{:.4}{:+.4}i", c.re, c.im))
                    .collect();
                println!(
                    "  {:>4}  {:>14}  {}",
                    style(outcome.threshold).cyan(),
                    style(format!("{:.6e}", outcome.result.loss)).yellow(),
                    head.join(", ")
                );
            }
        }
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }
    Ok(())
}

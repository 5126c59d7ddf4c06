//! Condition-number report for the heat-transfer family.
//!
//! For each `ξ` the report gives `κ(C)` of `(−2 − ξ)I + Q + Q⁻¹` and the
//! smallest truncation threshold whose loss reaches the tolerance, with `b`
//! the all-zeros basis state.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use cqs_cli::record::MAX_CONDITION_DIM;
use cqs_core::{CirculantModel, SolverStrategy, SourceOptions, StateInput};
use cqs_hal::{BackendConfig, StatePreparation};

use super::common::build_orchestrator;

/// One row of the report.
#[derive(Debug, Serialize)]
pub struct ConditionRow {
    pub xi: f64,
    pub condition_number: Option<f64>,
    /// `None` when no threshold up to the maximum reaches the tolerance.
    pub threshold: Option<u32>,
    pub loss: Option<f64>,
}

/// Execute the cond command.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    xis: &[f64],
    qubits: u32,
    tolerance: f64,
    max_threshold: u32,
    access: &str,
    shots: u32,
    seed: Option<u64>,
    format: &str,
) -> Result<()> {
    if xis.is_empty() {
        anyhow::bail!("No xi values given");
    }
    let prep = StatePreparation::Circuit {
        num_qubits: qubits,
        gates: vec![],
    };
    prep.validate()
        .with_context(|| format!("Cannot prepare b on {qubits} qubits"))?;
    let state = StateInput::Prepared(prep);
    let dim = state.dim();
    let options = SourceOptions {
        shots,
        seed,
        ..SourceOptions::default()
    };

    println!(
        "{} Condition-number report: {} qubits, tolerance {:e}, T ≤ {}",
        style("→").cyan().bold(),
        qubits,
        tolerance,
        max_threshold
    );

    let mut rows = Vec::with_capacity(xis.len());
    for &xi in xis {
        if !xi.is_finite() {
            anyhow::bail!("xi must be finite, got {xi}");
        }
        let model = CirculantModel::heat_transfer(xi);
        let condition_number = if dim <= MAX_CONDITION_DIM {
            Some(model.condition_number(dim)?)
        } else {
            None
        };
        let backend = BackendConfig::new(access.trim());
        let mut orchestrator = build_orchestrator(
            model,
            &state,
            access,
            &options,
            SolverStrategy::default(),
            Some(backend),
        )?;
        let found = orchestrator
            .minimal_threshold(tolerance, max_threshold)
            .await?;
        rows.push(ConditionRow {
            xi,
            condition_number,
            threshold: found.as_ref().map(|o| o.threshold),
            loss: found.as_ref().map(|o| o.result.loss),
        });
    }

    match format.to_lowercase().as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&rows)?),
        "table" => {
            println!();
            println!("  {:>10}  {:>12}  {:>4}  {:>12}", "xi", "kappa", "T", "loss");
            for row in &rows {
                let kappa = row
                    .condition_number
                    .map_or_else(|| "-".to_string(), |k| format!("{k:.4}"));
                let threshold = row
                    .threshold
                    .map_or_else(|| format!(">{max_threshold}"), |t| t.to_string());
                let loss = row
                    .loss
                    .map_or_else(|| "-".to_string(), |l| format!("{l:.3e}"));
                println!(
                    "  {:>10}  {:>12}  {:>4}  {:>12}",
                    row.xi,
                    kappa,
                    style(threshold).cyan(),
                    loss
                );
            }
        }
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }

    Ok(())
}

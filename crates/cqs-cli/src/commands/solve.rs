//! Solve command implementation.

use anyhow::Result;
use console::style;

use cqs_cli::config::{Overrides, ProblemConfig};
use cqs_cli::record::{RecordContext, RecordWriter, default_record_dir, default_record_name};
use cqs_core::RecordSink;

use super::common::{ProgressSink, build_orchestrator, print_outcomes, sweep_progress};

/// Execute the solve command.
pub async fn execute(problem: &str, overrides: Overrides, format: &str) -> Result<()> {
    let mut config = ProblemConfig::from_file(problem)?;
    config.apply(overrides)?;

    println!(
        "{} Solving {} with {} overlaps (T = 1..={})",
        style("→").cyan().bold(),
        style(problem).green(),
        style(&config.access).yellow(),
        config.threshold
    );

    let model = config.model.build()?;
    let state = config.state.to_input()?;
    println!(
        "  Model: {} terms, powers {:?}; b: dimension {}",
        model.term_number(),
        model.pows(),
        state.dim()
    );

    let mut writer = if config.output.enabled {
        let dir = match &config.output.dir {
            Some(dir) => dir.clone(),
            None => default_record_dir()?,
        };
        let name = config
            .output
            .name
            .clone()
            .unwrap_or_else(default_record_name);
        Some(RecordWriter::create(
            &dir,
            &name,
            RecordContext::new(&model, &state),
        )?)
    } else {
        None
    };

    let mut orchestrator = build_orchestrator(
        model,
        &state,
        &config.access,
        &config.source_options()?,
        config.solver.clone(),
        Some(config.backend_config()),
    )?;

    let bar = sweep_progress(u64::from(config.threshold));
    let inner = writer.as_mut().map(|w| w as &mut dyn RecordSink);
    let mut sink = ProgressSink::new(&bar, inner);
    let outcomes = orchestrator
        .sweep(1..=config.threshold, Some(&mut sink))
        .await;
    bar.finish_and_clear();
    let outcomes = outcomes?;

    print_outcomes(&outcomes, format)?;

    if let Some(writer) = &writer {
        println!(
            "\n  Records ({}): {}, {}",
            writer.written(),
            style(writer.text_path().display()).dim(),
            style(writer.json_path().display()).dim()
        );
    }

    Ok(())
}

//! Backends command implementation.

use anyhow::Result;
use console::style;

use cqs_cli::default_registry;

/// Execute the backends command.
pub async fn execute() -> Result<()> {
    println!("{} Overlap access modes:\n", style("CQS").cyan().bold());
    println!("  {} {}    dense inner products", style("●").green(), style("exact").bold());
    println!("  {} {}  Monte-Carlo estimate over |b|²", style("●").green(), style("sampled").bold());
    println!("  {} {}   shifts over the support of b", style("●").green(), style("sparse").bold());
    println!();

    println!("{} Hadamard-test backends:\n", style("CQS").cyan().bold());
    let registry = default_registry();
    for name in registry.available() {
        let backend = registry.resolve(&name)?;
        let caps = backend.capabilities();
        let availability = backend.availability().await?;

        println!(
            "  {} {} {}",
            if availability.is_available {
                style("●").green()
            } else {
                style("○").red()
            },
            style(&name).bold(),
            if caps.is_simulator { "(local)" } else { "" }
        );
        println!("    Qubits: {}", caps.num_qubits);
        println!("    Max shots: {}", caps.max_shots);
        if !caps.features.is_empty() {
            println!("    Features: {}", caps.features.join(", "));
        }
        if let Some(reason) = &availability.status_message {
            println!("    Status: {reason}");
        }
        println!();
    }

    Ok(())
}

//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - circulant linear systems by classical combination of quantum states",
        style("CQS").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  cqs-core         Overlaps, auxiliary system and combination solver");
    println!("  cqs-hal          Hadamard-test backend contracts");
    println!("  cqs-adapter-sim  Local Hadamard-test simulator");
    println!("  cqs-cli          Command-line interface");
    println!();
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}

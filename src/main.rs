// og-editable - scripted click-to-edit sessions from the command line
//
// The library does the work; this binary wires it to the environment:
// - CLI (clap): config management and the demo session
// - Config: env > ~/.config/og-editable/config.toml > defaults
// - Logging (tracing): stderr plus optional rolling JSON file
// - Demo: hover/click/edit walkthrough over a sample page

mod cli;
mod demo;

use anyhow::Result;
use clap::Parser;
use og_editable::config::{Config, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Config subcommands exit early
    if cli::handle_cli(&cli) {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => cli::exit_with_config_error(&e),
    };

    // The guard must be kept alive for the duration of the program to flush logs
    let _log_guard = og_editable::logging::init(&config.logging);
    tracing::info!(version = VERSION, route = %config.route, "og-editable starting");

    let options = cli.demo_options(&config);
    let summary = demo::run_demo(&config, options).await?;
    tracing::info!(
        saved = summary.saved,
        rejected = summary.rejected,
        stored = summary.stored.len(),
        "Demo finished"
    );
    Ok(())
}

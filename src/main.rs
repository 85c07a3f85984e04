//! energy-allocator entry point: CLI wiring, logging, and report output.

use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::filter::EnvFilter;

use energy_allocator::cli::Cli;
use energy_allocator::runner::{RunError, run_scenario};

fn init_logging(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| match EnvFilter::try_new(level) {
            Ok(filter) => Ok(filter),
            Err(e) => {
                eprintln!("invalid log level \"{level}\", using warn: {e}");
                EnvFilter::try_new("warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("failed to init logger: {e}");
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let scenario = cli.load_scenario().context("cannot load scenario")?;

    let outcome = run_scenario(&scenario).map_err(|e| match e {
        // Lists every problem on its own.
        e @ RunError::Config(_) => anyhow::Error::new(e),
        e => anyhow::Error::new(e).context("allocation run failed"),
    })?;

    println!("{outcome}");
    if cli.entries {
        println!();
        print!("{}", outcome.entries_table());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

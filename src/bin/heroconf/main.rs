//! heroconf CLI - probe a C++ toolchain and generate a ninja build file

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use heroconf::core::error::{ConfigureError, ErrorCategory};
use heroconf::util::diagnostic;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();
    let manifest = match cli.command {
        Commands::Configure(ref args) => args.toolchain.manifest.clone(),
        Commands::Probe(ref args) => args.toolchain.manifest.clone(),
    };

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ConfigureError>() {
            Some(err) => {
                let mut diag = err.to_diagnostic();
                if err.category() == ErrorCategory::ConfigurationConsistency {
                    diag = diag.with_location(manifest);
                }
                diagnostic::emit(&diag, color);
            }
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("heroconf=debug")
    } else {
        EnvFilter::new("heroconf=info")
    };

    // stdout is reserved for reports
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Configure(args) => commands::configure::execute(args),
        Commands::Probe(args) => commands::probe::execute(args),
    }
}

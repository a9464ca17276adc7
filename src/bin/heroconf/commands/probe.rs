//! `heroconf probe` command

use anyhow::{Context, Result};

use super::base_options;
use crate::cli::ProbeArgs;
use heroconf::ops::probe::{format_report, probe};

pub fn execute(args: ProbeArgs) -> Result<()> {
    let (opts, _) = base_options(&args.toolchain)?;
    let report = probe(&opts)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize probe report")?;
        println!("{}", json);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}

//! `heroconf configure` command

use anyhow::Result;

use super::{base_options, pick, self_command};
use crate::cli::ConfigureArgs;
use heroconf::core::options::{ModeSelection, OutputKind, Tristate};
use heroconf::ops::configure::configure;

pub fn execute(args: ConfigureArgs) -> Result<()> {
    let (mut opts, settings) = base_options(&args.toolchain)?;

    opts.static_link = args.static_link;
    opts.output_kind = OutputKind::from_flags(args.pie, args.so);
    opts.mode = ModeSelection::parse(&args.mode);
    opts.artifacts = args.artifacts;
    opts.user_ldflags = pick(args.ldflags, settings.ldflags, String::new());
    opts.target_arch = pick(args.target, settings.target, opts.target_arch);
    opts.cc = pick(args.cc, settings.cc, opts.cc);
    opts.dpdk = args.enable_dpdk;
    opts.dpdk_target = args.dpdk_target;
    opts.tests_debuginfo = args.tests_debuginfo == 1;
    opts.static_cxx = args.static_cxx;
    if args.static_boost {
        opts.static_libs.insert("boost".to_string());
    }
    if args.static_yaml_cpp {
        opts.static_libs.insert("yaml-cpp".to_string());
    }
    opts.python = pick(args.python, settings.python, opts.python);
    opts.pkg_config = pick(args.pkg_config, settings.pkg_config, opts.pkg_config);
    opts.features.insert(
        "hwloc".to_string(),
        Tristate::from_flags(args.enable_hwloc, args.disable_hwloc),
    );
    opts.features.insert(
        "xen".to_string(),
        Tristate::from_flags(args.enable_xen, args.disable_xen),
    );
    opts.gcc6_concepts = args.enable_gcc6_concepts;
    opts.alloc_failure_injector = args.enable_alloc_failure_injector;

    // Replayed verbatim by the regeneration rule.
    opts.configure_args = std::env::args().skip(1).collect();
    opts.self_command = self_command();

    let outcome = configure(&opts)?;

    println!(
        "Generated {} ({} artifacts, modes: {})",
        outcome.buildfile.display(),
        outcome.artifacts,
        outcome.modes.join(", ")
    );
    if !outcome.packages.is_empty() {
        println!("Optional packages: {}", outcome.packages.join(", "));
    }
    Ok(())
}

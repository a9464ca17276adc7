//! Implementation of `heroconf configure`.
//!
//! The run is a staged pipeline. Each stage produces an immutable value
//! consumed read-only by the next:
//!
//! 1. manifest + options → validated [`DependencyTable`] (no process started)
//! 2. trial compilations → [`Capabilities`]
//! 3. package registry → [`PackageResolution`]
//! 4. external steps → version defines, sub-project metadata
//! 5. all of the above → [`GraphInputs`] → emitted graph → build file
//!
//! The build file is written last, atomically, so a failing run leaves any
//! previous build file untouched.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use indexmap::IndexMap;

use crate::core::artifact::Artifact;
use crate::core::error::ConfigureError;
use crate::core::manifest::Manifest;
use crate::core::mode::BuildMode;
use crate::core::options::{ConfigureOptions, ModeSelection};
use crate::external::{subproject_configure_flags, ExternalSteps, ProcessSteps, SubprojectMetadata};
use crate::graph::inputs::{
    apply_optimization, framework_libs, global_cxxflags, global_ldflags, global_libs, mode_inputs,
    GraphInputs, SubprojectInputs, RELEASE_MODE,
};
use crate::graph::{emit_graph, write_graph};
use crate::packages::{resolve_packages, PackageRegistry, PackageResolution, PkgConfig};
use crate::resolver::{resolve_dependencies, uncompiled_sources, DependencyTable};
use crate::toolchain::{probe_toolchain, require_library, Capabilities, ProcessTrialCompiler, TrialCompiler};
use crate::util::fs::write_atomic;
use crate::util::host;

/// The processes a configuration run talks to.
pub struct Collaborators<'a> {
    pub compiler: &'a dyn TrialCompiler,
    pub registry: &'a dyn PackageRegistry,
    pub steps: &'a dyn ExternalSteps,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ConfigureOutcome {
    /// The written build file
    pub buildfile: PathBuf,
    /// Emitted modes
    pub modes: Vec<String>,
    /// Number of selected artifacts
    pub artifacts: usize,
    /// Packages that were found
    pub packages: Vec<String>,
    pub capabilities: Capabilities,
}

/// Configure the project at `opts.root` with the real toolchain.
pub fn configure(opts: &ConfigureOptions) -> Result<ConfigureOutcome> {
    let manifest = Manifest::load(&opts.project_path(&opts.manifest_path))?;
    let tmp_dir = opts.project_path(&manifest.project.build_dir).join("tmp");

    let compiler = ProcessTrialCompiler::new(&opts.cxx, opts.user_cflag_list(), tmp_dir);
    let registry = PkgConfig::new(&opts.pkg_config);
    let steps = ProcessSteps::new(&opts.root, &opts.python);

    configure_with(
        opts,
        &manifest,
        &Collaborators {
            compiler: &compiler,
            registry: &registry,
            steps: &steps,
        },
    )
}

/// Run the pipeline against explicit collaborators.
pub fn configure_with(
    opts: &ConfigureOptions,
    manifest: &Manifest,
    collab: &Collaborators<'_>,
) -> Result<ConfigureOutcome> {
    // Stage 1: referential checks, before anything slow runs
    let registry = manifest.registry()?;
    let table = resolve_dependencies(manifest, &registry)?;
    let flagged = manifest
        .extra_cxxflags
        .keys()
        .map(String::as_str)
        .chain(manifest.version.as_ref().map(|v| v.source.as_str()));
    for source in uncompiled_sources(&table, flagged) {
        tracing::warn!("`{}` has extra compiler flags but no artifact compiles it", source);
    }
    let artifacts = registry.select(&opts.artifacts)?;
    let all_modes = manifest.build_modes();
    let selected = select_modes(&all_modes, &opts.mode)?;
    tracing::info!(
        "configuring {} artifacts in modes: {}",
        artifacts.len(),
        selected.join(", ")
    );

    // Stage 2: toolchain
    tracing::info!("probing {}", opts.cxx.display());
    require_library(collab.compiler, &manifest.mandatory_library())?;
    let caps = probe_toolchain(collab.compiler, &manifest.probe, opts.debuginfo)?;

    // Stage 3: packages
    let packages = resolve_packages(collab.registry, &manifest.optional_packages, opts)?;

    // Stage 4: delegated steps
    let all_modes = apply_optimization(all_modes, &caps);
    let extra_cxxflags = extra_cxxflags(manifest, collab.steps)?;
    let (subproject, metadata) = delegate_subproject(opts, manifest, &all_modes, &selected, collab.steps)?;

    // Stage 5: emission
    let inputs = graph_inputs(GraphParts {
        opts,
        manifest,
        caps: &caps,
        packages: &packages,
        table,
        artifacts,
        modes: &all_modes,
        selected: &selected,
        extra_cxxflags,
        subproject,
        metadata: &metadata,
    })?;
    let graph = emit_graph(&inputs)?;

    let buildfile = opts.project_path(&manifest.project.buildfile);
    write_atomic(&buildfile, &write_graph(&graph))?;
    tracing::info!("wrote {}", buildfile.display());

    Ok(ConfigureOutcome {
        buildfile,
        modes: selected,
        artifacts: inputs.artifacts.len(),
        packages: packages.selected,
        capabilities: caps,
    })
}

/// Names of the modes to emit.
pub fn select_modes(modes: &[BuildMode], selection: &ModeSelection) -> Result<Vec<String>, ConfigureError> {
    match selection {
        ModeSelection::All => Ok(modes.iter().map(|m| m.name.clone()).collect()),
        ModeSelection::Only(name) => {
            if modes.iter().any(|m| &m.name == name) {
                Ok(vec![name.clone()])
            } else {
                Err(ConfigureError::UnknownMode {
                    name: name.clone(),
                    known: modes.iter().map(|m| m.name.clone()).collect(),
                })
            }
        }
    }
}

/// Manifest `[extra-cxxflags]` plus the version defines.
fn extra_cxxflags(manifest: &Manifest, steps: &dyn ExternalSteps) -> Result<IndexMap<String, String>> {
    let mut extra = manifest.extra_cxxflags.clone();
    if let Some(ref spec) = manifest.version {
        let info = steps.generate_version(spec)?;
        tracing::info!("version {} release {}", info.version, info.release);
        let defines = info.defines(&spec.define_prefix);
        extra
            .entry(spec.source.clone())
            .and_modify(|flags| {
                flags.push(' ');
                flags.push_str(&defines);
            })
            .or_insert(defines);
    }
    Ok(extra)
}

type SubprojectStage = (Option<SubprojectInputs>, IndexMap<String, SubprojectMetadata>);

fn delegate_subproject(
    opts: &ConfigureOptions,
    manifest: &Manifest,
    modes: &[BuildMode],
    selected: &[String],
    steps: &dyn ExternalSteps,
) -> Result<SubprojectStage> {
    let Some(ref spec) = manifest.subproject else {
        return Ok((None, IndexMap::new()));
    };

    let ninja = steps.find_ninja()?;
    let release_opt = modes
        .iter()
        .find(|m| m.name == RELEASE_MODE)
        .map(|m| m.opt.clone())
        .unwrap_or_default();
    let flags = subproject_configure_flags(opts, spec, &release_opt);
    steps.configure_subproject(spec, &flags)?;
    let metadata = steps.subproject_metadata(spec, &ninja, selected, opts.static_cxx)?;

    Ok((
        Some(SubprojectInputs::new(spec, ninja.display().to_string())),
        metadata,
    ))
}

struct GraphParts<'a> {
    opts: &'a ConfigureOptions,
    manifest: &'a Manifest,
    caps: &'a Capabilities,
    packages: &'a PackageResolution,
    table: DependencyTable,
    artifacts: Vec<Artifact>,
    modes: &'a [BuildMode],
    selected: &'a [String],
    extra_cxxflags: IndexMap<String, String>,
    subproject: Option<SubprojectInputs>,
    metadata: &'a IndexMap<String, SubprojectMetadata>,
}

fn graph_inputs(parts: GraphParts<'_>) -> Result<GraphInputs> {
    let GraphParts {
        opts,
        manifest,
        caps,
        packages,
        table,
        artifacts,
        modes,
        selected,
        extra_cxxflags,
        subproject,
        metadata,
    } = parts;

    let mut include_dirs = manifest.project.include_dirs.clone();
    if let Some(ref spec) = manifest.subproject {
        include_dirs.extend(spec.include_dirs.iter().cloned());
    }

    let mode_list = modes
        .iter()
        .filter(|m| selected.contains(&m.name))
        .map(|m| mode_inputs(m, opts, caps, &include_dirs, metadata.get(&m.name)))
        .collect();

    let configure_args = shlex::try_join(opts.configure_args.iter().map(String::as_str))
        .map_err(|e| anyhow!("cannot quote configure arguments: {}", e))?;
    let self_command = opts.self_command.display().to_string();
    let self_command = shlex::try_quote(&self_command)
        .map_err(|e| anyhow!("cannot quote `{}`: {}", self_command, e))?
        .into_owned();

    Ok(GraphInputs {
        configure_args,
        self_command,
        build_dir: manifest.project.build_dir.clone(),
        buildfile: manifest.project.buildfile.clone(),
        manifest_path: opts.manifest_path.display().to_string(),
        defaults_files: opts
            .defaults_files
            .iter()
            .map(|path| path.strip_prefix(&opts.root).unwrap_or(path).display().to_string())
            .collect(),
        cxx: opts.cxx.display().to_string(),
        cxxflags: global_cxxflags(opts, manifest, caps, packages),
        ldflags: global_ldflags(opts, caps),
        libs: global_libs(opts, manifest, packages),
        modes: mode_list,
        artifacts,
        table,
        framework_libs: framework_libs(opts, manifest),
        extra_cxxflags,
        tests_debuginfo: opts.tests_debuginfo,
        link_pool_depth: host::link_pool_depth(host::total_memory() as i64),
        subproject,
    })
}

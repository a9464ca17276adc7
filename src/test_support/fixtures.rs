//! Test fixtures for common test scenarios.
//!
//! The fixture project `hero` has two apps (`hero`, `libhero.a`), three
//! tests of which `tests/raw_test` bypasses the test framework and
//! `tests/boost_test` is pure-boost, one perf test and one artifact built
//! outside the generated graph (`iotune`).

use std::path::Path;

use crate::core::artifact::{Artifact, ArtifactCategory};
use crate::core::manifest::{Manifest, SubprojectSpec, VersionSpec};
use crate::core::mode::default_modes;
use crate::core::options::ConfigureOptions;
use crate::graph::inputs::{
    framework_libs, global_cxxflags, global_ldflags, global_libs, mode_inputs, GraphInputs,
    SubprojectInputs,
};
use crate::packages::PackageResolution;
use crate::resolver::{resolve_dependencies, DependencyTable, ResolvedArtifact};
use crate::toolchain::Capabilities;

pub const MANIFEST: &str = r#"
[project]
name = "hero"

[artifacts]
apps = ["hero", "libhero.a"]
tests = ["tests/basic_test", "tests/raw_test", "tests/boost_test"]
perf-tests = ["tests/perf/perf_simple"]
other = ["iotune"]

[modules]
core = ["core/server.cc", "core/log.cc"]
test-support = ["tests/test_utils.cc"]
test-framework = ["tests/framework.cc"]
perf-framework = ["tests/perf/perf_main.cc"]

[sources]
hero = ["main.cc", "@core"]
"libhero.a" = ["@core"]

[tests]
bypass-framework = ["tests/raw_test"]
pure-boost = ["tests/boost_test"]
framework-libs = [{ flags = "-lboost_unit_test_framework", static-group = "boost" }]

[[optional-packages]]
alternatives = ["libsystemd", "libsystemd-daemon"]

[[optional-packages]]
alternatives = ["hwloc"]
feature = "hwloc"

[[libs]]
flags = "-lyaml-cpp"
static-group = "yaml-cpp"

[[libs]]
flags = "-lz"
"#;

/// The `hero` fixture manifest.
pub fn manifest() -> Manifest {
    Manifest::parse(MANIFEST, Path::new("Configure.toml")).unwrap()
}

/// A `seastar`-like sub-project.
pub fn subproject() -> SubprojectSpec {
    SubprojectSpec {
        name: "seastar".to_string(),
        dir: "seastar".to_string(),
        configure: "configure.py".to_string(),
        library: "build/{mode}/libseastar.a".to_string(),
        metadata: "build/{mode}/seastar.pc".to_string(),
        generated_headers: vec!["build/{mode}/gen/http/request_parser.hh".to_string()],
        extra_outputs: Vec::new(),
        include_dirs: vec!["seastar".to_string(), "seastar/build/{mode}/gen".to_string()],
        cxx_dialect: "gnu++1z".to_string(),
    }
}

/// Version generator attaching its defines to `core/log.cc`.
pub fn version() -> VersionSpec {
    VersionSpec {
        generator: "VERSION-GEN".to_string(),
        version_file: "build/VERSION-FILE".to_string(),
        release_file: "build/RELEASE-FILE".to_string(),
        source: "core/log.cc".to_string(),
        define_prefix: "HERO".to_string(),
    }
}

/// Default options without the host-dependent target architecture.
pub fn options() -> ConfigureOptions {
    ConfigureOptions {
        target_arch: String::new(),
        ..ConfigureOptions::default()
    }
}

/// Graph inputs for the fixture project in both default modes.
pub fn graph_inputs() -> GraphInputs {
    let manifest = manifest();
    let registry = manifest.registry().unwrap();
    let table = resolve_dependencies(&manifest, &registry).unwrap();
    assemble(&manifest, registry.select(&[]).unwrap(), table, None)
}

/// Graph inputs for apps with the given module lists, bypassing the
/// resolver.
pub fn graph_inputs_with(apps: &[(&str, &[&str])]) -> GraphInputs {
    let mut table = DependencyTable::default();
    let mut artifacts = Vec::new();
    for (name, modules) in apps {
        let artifact = Artifact::new(*name, ArtifactCategory::App);
        table.insert(ResolvedArtifact {
            artifact: artifact.clone(),
            modules: modules.iter().map(|m| m.to_string()).collect(),
            framework_libs: false,
        });
        artifacts.push(artifact);
    }
    assemble(&manifest(), artifacts, table, None)
}

/// [`graph_inputs`] with the [`subproject`] wired in.
pub fn graph_inputs_with_subproject() -> GraphInputs {
    let manifest = manifest();
    let registry = manifest.registry().unwrap();
    let table = resolve_dependencies(&manifest, &registry).unwrap();
    let sub = SubprojectInputs::new(&subproject(), "/usr/bin/ninja");
    assemble(&manifest, registry.select(&[]).unwrap(), table, Some(sub))
}

fn assemble(
    manifest: &Manifest,
    artifacts: Vec<Artifact>,
    table: DependencyTable,
    subproject: Option<SubprojectInputs>,
) -> GraphInputs {
    let opts = options();
    let caps = Capabilities::default();
    let packages = PackageResolution::default();

    let modes = default_modes()
        .iter()
        .map(|m| mode_inputs(m, &opts, &caps, &manifest.project.include_dirs, None))
        .collect();

    GraphInputs {
        configure_args: String::new(),
        self_command: "heroconf".to_string(),
        build_dir: manifest.project.build_dir.clone(),
        buildfile: manifest.project.buildfile.clone(),
        manifest_path: "Configure.toml".to_string(),
        defaults_files: Vec::new(),
        cxx: "g++".to_string(),
        cxxflags: global_cxxflags(&opts, manifest, &caps, &packages),
        ldflags: global_ldflags(&opts, &caps),
        libs: global_libs(&opts, manifest, &packages),
        modes,
        artifacts,
        table,
        framework_libs: framework_libs(&opts, manifest),
        extra_cxxflags: manifest.extra_cxxflags.clone(),
        tests_debuginfo: false,
        link_pool_depth: 2,
        subproject,
    }
}

//! Build graph emission.
//!
//! Per selected mode the emitter declares the mode's variables and four
//! rules (compile, link, stripped link, archive), a phony target covering
//! every selected artifact, one link or archive edge per artifact and one
//! compile edge per distinct object file.

use anyhow::Result;
use indexmap::IndexMap;

use crate::core::artifact::ArtifactKind;
use crate::core::error::ConfigureError;
use crate::resolver::compile_source_stem;

use super::inputs::{join_flags, GraphInputs, ModeInputs, SubprojectInputs};
use super::model::{BuildGraph, Edge, Rule};

pub const LINK_POOL: &str = "link_pool";
pub const SUBPROJECT_POOL: &str = "subproject_pool";

/// Phony target with no inputs, so the sub-project build runs every time
/// and `restat` decides what actually changed.
pub const ALWAYS_DIRTY: &str = "subproject_always_dirty_restat";

const HEADER: &str = "Generated by heroconf. Do not edit: changes are lost on reconfigure.";

/// Output path of an artifact in `mode`.
pub fn artifact_path(mode: &str, artifact: &str) -> String {
    format!("$builddir/{}/{}", mode, artifact)
}

/// Object path of a source module in `mode`.
pub fn object_path(mode: &str, stem: &str) -> String {
    format!("$builddir/{}/{}.o", mode, stem)
}

/// Emit the complete graph.
pub fn emit_graph(inputs: &GraphInputs) -> Result<BuildGraph> {
    let mut graph = BuildGraph::new();
    graph.comment(HEADER);

    emit_globals(&mut graph, inputs)?;
    for mode in &inputs.modes {
        emit_mode(&mut graph, inputs, mode)?;
    }
    emit_trailer(&mut graph, inputs)?;

    Ok(graph)
}

fn emit_globals(graph: &mut BuildGraph, inputs: &GraphInputs) -> Result<()> {
    graph.variable("configure_args", &inputs.configure_args);
    graph.variable("builddir", &inputs.build_dir);
    graph.variable("cxx", &inputs.cxx);
    graph.variable("cxxflags", &inputs.cxxflags);
    graph.variable("ldflags", &inputs.ldflags);
    graph.variable("libs", &inputs.libs);

    graph.pool(LINK_POOL, inputs.link_pool_depth.max(1));

    if let Some(ref sub) = inputs.subproject {
        graph.pool(SUBPROJECT_POOL, 1);
        graph.rule(
            Rule::new("ninja", format!("{} -C $subdir $target", sub.ninja))
                .description("NINJA $out")
                .restat(),
        )?;
    }
    Ok(())
}

fn emit_mode(graph: &mut BuildGraph, inputs: &GraphInputs, mode: &ModeInputs) -> Result<()> {
    let m = mode.name.as_str();
    tracing::debug!("emitting mode {}", m);

    graph.variable(format!("cxxflags_{}", m), &mode.cxxflags);
    graph.variable(format!("libs_{}", m), &mode.libs);

    let mode_cxxflags = format!("$cxxflags_{}", m);
    let mode_libs = format!("$libs_{}", m);
    let link = |strip: &str| {
        join_flags([
            "$cxx",
            mode_cxxflags.as_str(),
            strip,
            mode.sanitize_libs.as_str(),
            "$ldflags",
            mode.subproject_libs.as_str(),
            "-o $out $in $libs",
            mode_libs.as_str(),
        ])
    };
    let compile = format!("$cxxflags {} $obj_cxxflags -c -o $out $in", mode_cxxflags);

    graph.rule(
        Rule::new(
            format!("cxx.{}", m),
            join_flags([
                "$cxx -MD -MT $out -MF $out.d",
                mode.subproject_cflags.as_str(),
                compile.as_str(),
            ]),
        )
        .description("CXX $out")
        .depfile("$out.d"),
    )?;
    graph.rule(
        Rule::new(format!("link.{}", m), link(""))
            .description("LINK $out")
            .pool(LINK_POOL),
    )?;
    graph.rule(
        Rule::new(format!("link_stripped.{}", m), link("-s"))
            .description("LINK (stripped) $out")
            .pool(LINK_POOL),
    )?;
    graph.rule(
        Rule::new(format!("ar.{}", m), "rm -f $out; ar cr $out $in; ranlib $out").description("AR $out"),
    )?;

    graph.edge(Edge::phony(m).inputs(inputs.artifacts.iter().map(|a| artifact_path(m, &a.name))))?;

    let subproject_lib = inputs.subproject.as_ref().map(|s| s.library_path(m));
    let tests_link_rule = if inputs.tests_debuginfo {
        format!("link.{}", m)
    } else {
        format!("link_stripped.{}", m)
    };

    // object path -> its single source module
    let mut compiles: IndexMap<String, String> = IndexMap::new();

    for artifact in inputs.artifacts.iter().filter(|a| a.is_emitted()) {
        let Some(resolved) = inputs.table.get(&artifact.name) else {
            continue;
        };

        let mut objs = Vec::with_capacity(resolved.modules.len());
        for module in &resolved.modules {
            let stem = compile_source_stem(module).ok_or_else(|| ConfigureError::NoRuleForSource {
                source_module: module.clone(),
                artifact: artifact.name.clone(),
            })?;
            let obj = object_path(m, stem);
            let source = compiles.entry(obj.clone()).or_insert_with(|| module.clone());
            if *source != *module {
                return Err(ConfigureError::ObjectCollision {
                    object: format!("{}.o", stem),
                    first: source.clone(),
                    second: module.clone(),
                }
                .into());
            }
            objs.push(obj);
        }

        let output = artifact_path(m, &artifact.name);
        match artifact.kind {
            ArtifactKind::StaticLibrary => {
                graph.edge(Edge::new(output, format!("ar.{}", m)).inputs(objs))?;
            }
            ArtifactKind::Test => {
                let link_inputs: Vec<String> = objs.into_iter().chain(subproject_lib.clone()).collect();
                let libs = if resolved.framework_libs {
                    join_flags(["$libs", inputs.framework_libs.as_str()])
                } else {
                    "$libs".to_string()
                };
                graph.edge(
                    Edge::new(&output, tests_link_rule.as_str())
                        .inputs(link_inputs.iter().cloned())
                        .binding("libs", libs.as_str()),
                )?;
                graph.edge(
                    Edge::new(format!("{}_g", output), format!("link.{}", m))
                        .inputs(link_inputs)
                        .binding("libs", libs),
                )?;
            }
            ArtifactKind::Executable => {
                graph.edge(
                    Edge::new(output, format!("link.{}", m))
                        .inputs(objs.into_iter().chain(subproject_lib.clone())),
                )?;
            }
        }
    }

    let generated_headers = inputs
        .subproject
        .as_ref()
        .map(|s| s.header_paths(m))
        .unwrap_or_default();
    for (obj, src) in &compiles {
        let mut edge = Edge::new(obj.as_str(), format!("cxx.{}", m))
            .inputs([src.as_str()])
            .order_only(generated_headers.iter().cloned());
        if let Some(extra) = inputs.extra_cxxflags.get(src) {
            edge = edge.binding("obj_cxxflags", extra.as_str());
        }
        graph.edge(edge)?;
    }
    tracing::debug!("mode {}: {} compile edges", m, compiles.len());

    if let Some(ref sub) = inputs.subproject {
        emit_subproject(graph, sub, m)?;
    }
    Ok(())
}

fn emit_subproject(graph: &mut BuildGraph, sub: &SubprojectInputs, mode: &str) -> Result<()> {
    let targets = sub.targets(mode);
    let outputs: Vec<String> = targets.iter().map(|t| format!("{}/{}", sub.dir, t)).collect();
    let mut edge = Edge::new(outputs[0].as_str(), "ninja")
        .outputs(outputs[1..].iter().cloned())
        .inputs([ALWAYS_DIRTY])
        .binding("pool", SUBPROJECT_POOL)
        .binding("subdir", sub.dir.as_str())
        .binding("target", targets.join(" "));
    edge.outputs.dedup();
    graph.edge(edge)?;
    Ok(())
}

fn emit_trailer(graph: &mut BuildGraph, inputs: &GraphInputs) -> Result<()> {
    if inputs.subproject.is_some() {
        graph.edge(Edge::phony(ALWAYS_DIRTY))?;
    }

    graph.rule(
        Rule::new("configure", format!("{} $configure_args", inputs.self_command))
            .description("CONFIGURE")
            .generator(),
    )?;

    let mut regen = Edge::new(inputs.buildfile.as_str(), "configure")
        .implicit([inputs.manifest_path.as_str()])
        .implicit(inputs.defaults_files.iter().cloned());
    if let Some(ref sub) = inputs.subproject {
        regen = regen.implicit([sub.configure_script.as_str()]);
    }
    graph.edge(regen)?;

    graph.default_targets(inputs.modes.iter().map(|m| m.name.clone()).collect());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::GraphError;
    use crate::graph::writer::write_graph;
    use crate::test_support::fixtures;
    use pretty_assertions::assert_eq;

    fn compile_edges(graph: &BuildGraph, mode: &str) -> usize {
        graph.edges_with_rule(&format!("cxx.{}", mode)).count()
    }

    #[test]
    fn test_objects_deduplicated_across_artifacts() {
        // A: [x, y], B: [y, z] => exactly x, y, z
        let inputs = fixtures::graph_inputs_with(&[("A", &["x.cc", "y.cc"]), ("B", &["y.cc", "z.cc"])]);
        let graph = emit_graph(&inputs).unwrap();

        assert_eq!(compile_edges(&graph, "debug"), 3);
        assert_eq!(compile_edges(&graph, "release"), 3);
        let objs: Vec<_> = graph
            .edges_with_rule("cxx.debug")
            .map(|e| e.outputs[0].clone())
            .collect();
        assert_eq!(
            objs,
            ["$builddir/debug/x.o", "$builddir/debug/y.o", "$builddir/debug/z.o"]
        );
    }

    #[test]
    fn test_test_artifacts_get_stripped_and_unstripped_links() {
        let inputs = fixtures::graph_inputs();
        let graph = emit_graph(&inputs).unwrap();

        let stripped = graph.producer("$builddir/debug/tests/basic_test").unwrap();
        let unstripped = graph.producer("$builddir/debug/tests/basic_test_g").unwrap();
        assert_eq!(stripped.rule, "link_stripped.debug");
        assert_eq!(unstripped.rule, "link.debug");
        assert_eq!(stripped.inputs, unstripped.inputs);
        assert_eq!(
            stripped.get_binding("libs"),
            Some("$libs -lboost_unit_test_framework")
        );
        assert_eq!(
            graph.producer("$builddir/debug/tests/raw_test").unwrap().get_binding("libs"),
            Some("$libs")
        );

        let test_links = graph
            .edges()
            .filter(|e| e.rule.starts_with("link") && e.outputs[0].starts_with("$builddir/release/tests/"))
            .count();
        // basic, raw, boost and one perf test, two edges each
        assert_eq!(test_links, 8);
    }

    #[test]
    fn test_tests_debuginfo_keeps_symbols() {
        let mut inputs = fixtures::graph_inputs();
        inputs.tests_debuginfo = true;
        let graph = emit_graph(&inputs).unwrap();
        assert_eq!(graph.producer("$builddir/debug/tests/basic_test").unwrap().rule, "link.debug");
    }

    #[test]
    fn test_artifact_kinds() {
        let graph = emit_graph(&fixtures::graph_inputs()).unwrap();

        let lib = graph.producer("$builddir/release/libhero.a").unwrap();
        assert_eq!(lib.rule, "ar.release");
        assert!(lib.inputs.iter().all(|i| i.ends_with(".o")));

        let app = graph.producer("$builddir/release/hero").unwrap();
        assert_eq!(app.rule, "link.release");
        assert_eq!(app.inputs, ["$builddir/release/main.o", "$builddir/release/core/server.o", "$builddir/release/core/log.o"]);

        assert!(graph.producer("$builddir/release/iotune").is_none());
    }

    #[test]
    fn test_phony_aggregate_and_default() {
        let graph = emit_graph(&fixtures::graph_inputs()).unwrap();

        let phony = graph.producer("debug").unwrap();
        assert_eq!(phony.rule, "phony");
        assert!(phony.inputs.contains(&"$builddir/debug/hero".to_string()));
        assert!(phony.inputs.contains(&"$builddir/debug/iotune".to_string()));

        let text = write_graph(&graph);
        assert!(text.ends_with("default debug release\n"));
    }

    #[test]
    fn test_pools_and_rules() {
        let mut inputs = fixtures::graph_inputs();
        inputs.link_pool_depth = 0;
        let graph = emit_graph(&inputs).unwrap();
        let text = write_graph(&graph);

        assert!(text.contains("pool link_pool\n  depth = 1\n"));
        assert!(!text.contains("pool subproject_pool"));
        let cxx = graph.rule_named("cxx.debug").unwrap();
        assert_eq!(cxx.depfile.as_deref(), Some("$out.d"));
        assert!(cxx.command.contains("$obj_cxxflags"));
        assert_eq!(graph.rule_named("link.debug").unwrap().pool.as_deref(), Some(LINK_POOL));
        assert!(graph.rule_named("link_stripped.debug").unwrap().command.contains(" -s "));
        assert!(graph
            .rule_named("link.debug")
            .unwrap()
            .command
            .contains("-lasan -lubsan $ldflags"));
    }

    #[test]
    fn test_extra_cxxflags_only_on_that_source() {
        let mut inputs = fixtures::graph_inputs();
        inputs
            .extra_cxxflags
            .insert("core/log.cc".to_string(), "-DHERO_VERSION=\"\\\"1.0\\\"\"".to_string());
        let graph = emit_graph(&inputs).unwrap();

        let log = graph.producer("$builddir/debug/core/log.o").unwrap();
        assert_eq!(log.get_binding("obj_cxxflags"), Some("-DHERO_VERSION=\"\\\"1.0\\\"\""));
        let server = graph.producer("$builddir/debug/core/server.o").unwrap();
        assert_eq!(server.get_binding("obj_cxxflags"), None);
    }

    #[test]
    fn test_subproject_wiring() {
        let inputs = fixtures::graph_inputs_with_subproject();
        let graph = emit_graph(&inputs).unwrap();

        let sub = graph.producer("seastar/build/debug/libseastar.a").unwrap();
        assert_eq!(sub.rule, "ninja");
        assert_eq!(sub.inputs, [ALWAYS_DIRTY]);
        assert_eq!(sub.get_binding("pool"), Some(SUBPROJECT_POOL));
        assert_eq!(sub.get_binding("subdir"), Some("seastar"));
        assert_eq!(
            sub.get_binding("target"),
            Some("build/debug/libseastar.a build/debug/gen/http/request_parser.hh")
        );
        assert!(graph.producer("seastar/build/debug/gen/http/request_parser.hh").is_some());

        let obj = graph.producer("$builddir/debug/main.o").unwrap();
        assert_eq!(obj.order_only, ["seastar/build/debug/gen/http/request_parser.hh"]);

        let app = graph.producer("$builddir/debug/hero").unwrap();
        assert_eq!(app.inputs.last().map(String::as_str), Some("seastar/build/debug/libseastar.a"));

        let text = write_graph(&graph);
        assert!(text.contains("pool subproject_pool\n  depth = 1\n"));
        assert!(text.contains(&format!("build {}: phony\n", ALWAYS_DIRTY)));
        assert!(text.contains("build build.ninja: configure | Configure.toml seastar/configure.py\n"));
        assert!(graph.rule_named("ninja").unwrap().restat);
    }

    #[test]
    fn test_regeneration_rule() {
        let graph = emit_graph(&fixtures::graph_inputs()).unwrap();
        let rule = graph.rule_named("configure").unwrap();
        assert!(rule.generator);
        assert_eq!(rule.command, "heroconf $configure_args");
        assert_eq!(graph.producer("build.ninja").unwrap().implicit, ["Configure.toml"]);
    }

    #[test]
    fn test_defaults_files_trigger_regeneration() {
        let mut inputs = fixtures::graph_inputs();
        inputs.defaults_files = vec![
            "/home/dev/.heroconf/toolchain.toml".to_string(),
            ".heroconf/toolchain.toml".to_string(),
        ];
        let text = write_graph(&emit_graph(&inputs).unwrap());

        assert!(text.contains(
            "build build.ninja: configure | Configure.toml \
             /home/dev/.heroconf/toolchain.toml .heroconf/toolchain.toml\n"
        ));
    }

    #[test]
    fn test_single_mode() {
        let mut inputs = fixtures::graph_inputs();
        inputs.modes.retain(|m| m.name == "release");
        let graph = emit_graph(&inputs).unwrap();

        assert!(graph.rule_named("cxx.debug").is_none());
        assert!(write_graph(&graph).ends_with("default release\n"));
    }

    #[test]
    fn test_source_without_rule_fails() {
        let inputs = fixtures::graph_inputs_with(&[("A", &["x.cc", "schema.json"])]);

        let err = emit_graph(&inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigureError>(),
            Some(ConfigureError::NoRuleForSource { source_module, .. }) if source_module == "schema.json"
        ));
    }

    #[test]
    fn test_two_sources_for_one_object_fail() {
        let inputs = fixtures::graph_inputs_with(&[("A", &["x.cc"]), ("B", &["x.cpp"])]);

        let err = emit_graph(&inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigureError>(),
            Some(ConfigureError::ObjectCollision { object, first, second })
                if object == "x.o" && first == "x.cc" && second == "x.cpp"
        ));
    }

    #[test]
    fn test_artifact_colliding_with_object_is_rejected() {
        // `x` links to $builddir/<m>/x.o, which is also x.cc's object
        let inputs = fixtures::graph_inputs_with(&[("x.o", &["x.cc"])]);
        let err = emit_graph(&inputs).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::DuplicateOutput(_))
        ));
    }
}

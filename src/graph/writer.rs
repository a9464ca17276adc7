//! Ninja serialization of a [`BuildGraph`].

use std::fmt::Write;

use super::model::{BuildGraph, Edge, Item, Rule};

/// Escape a path for use in a `build` or `default` line.
///
/// Paths may reference variables such as `$builddir`, so `$` is left alone;
/// spaces and colons are escaped.
pub fn escape_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            ' ' => out.push_str("$ "),
            ':' => out.push_str("$:"),
            '\n' => out.push_str("$\n"),
            _ => out.push(c),
        }
    }
    out
}

fn join_paths(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| escape_path(p))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the whole graph.
pub fn write_graph(graph: &BuildGraph) -> String {
    let mut out = String::new();
    for item in graph.items() {
        match item {
            Item::Comment(text) => {
                for line in text.lines() {
                    let _ = writeln!(out, "# {}", line);
                }
            }
            Item::Variable { name, value } => {
                let _ = writeln!(out, "{} = {}", name, value.trim());
            }
            Item::Pool(pool) => {
                let _ = writeln!(out, "pool {}", pool.name);
                let _ = writeln!(out, "  depth = {}", pool.depth);
            }
            Item::Rule(rule) => write_rule(&mut out, rule),
            Item::Edge(edge) => write_edge(&mut out, edge),
            Item::Default(targets) => {
                let _ = writeln!(out, "default {}", join_paths(targets));
            }
        }
    }
    out
}

fn write_rule(out: &mut String, rule: &Rule) {
    let _ = writeln!(out, "rule {}", rule.name);
    let _ = writeln!(out, "  command = {}", rule.command);
    if let Some(ref description) = rule.description {
        let _ = writeln!(out, "  description = {}", description);
    }
    if let Some(ref depfile) = rule.depfile {
        let _ = writeln!(out, "  depfile = {}", depfile);
    }
    if let Some(ref pool) = rule.pool {
        let _ = writeln!(out, "  pool = {}", pool);
    }
    if rule.restat {
        out.push_str("  restat = 1\n");
    }
    if rule.generator {
        out.push_str("  generator = 1\n");
    }
}

fn write_edge(out: &mut String, edge: &Edge) {
    let mut line = format!("build {}: {}", join_paths(&edge.outputs), edge.rule);
    if !edge.inputs.is_empty() {
        line.push(' ');
        line.push_str(&join_paths(&edge.inputs));
    }
    if !edge.implicit.is_empty() {
        line.push_str(" | ");
        line.push_str(&join_paths(&edge.implicit));
    }
    if !edge.order_only.is_empty() {
        line.push_str(" || ");
        line.push_str(&join_paths(&edge.order_only));
    }
    out.push_str(&line);
    out.push('\n');
    for (key, value) in &edge.bindings {
        let _ = writeln!(out, "  {} = {}", key, value);
    }
}

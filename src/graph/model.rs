//! Typed build graph.
//!
//! A BuildGraph is an ordered list of declarations (variables, pools,
//! rules, build edges and the default targets). It is only ever assembled
//! in memory; [`super::writer`] is the single place that knows the textual
//! ninja syntax.

use std::collections::HashSet;

use thiserror::Error;

/// Structural errors detected while assembling a graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("`{0}` is produced by more than one build edge")]
    DuplicateOutput(String),

    #[error("rule `{0}` is declared more than once")]
    DuplicateRule(String),

    #[error("build edge for `{output}` uses undeclared rule `{rule}`")]
    UnknownRule { output: String, rule: String },
}

/// The built-in rule of ninja that needs no declaration.
pub const PHONY: &str = "phony";

/// A named concurrency limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    pub name: String,
    pub depth: u32,
}

/// A command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub command: String,
    pub description: Option<String>,
    /// Dependency file written by the command, for header discovery
    pub depfile: Option<String>,
    pub pool: Option<String>,
    /// Re-check output timestamps after the command ran
    pub restat: bool,
    /// Marks the rule that regenerates the build file itself
    pub generator: bool,
}

impl Rule {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Rule {
            name: name.into(),
            command: command.into(),
            description: None,
            depfile: None,
            pool: None,
            restat: false,
            generator: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn depfile(mut self, depfile: impl Into<String>) -> Self {
        self.depfile = Some(depfile.into());
        self
    }

    pub fn pool(mut self, pool: impl Into<String>) -> Self {
        self.pool = Some(pool.into());
        self
    }

    pub fn restat(mut self) -> Self {
        self.restat = true;
        self
    }

    pub fn generator(mut self) -> Self {
        self.generator = true;
        self
    }
}

/// A build edge: outputs produced from inputs by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub outputs: Vec<String>,
    pub rule: String,
    /// Explicit inputs, available to the command as `$in`
    pub inputs: Vec<String>,
    /// Implicit inputs: rebuild triggers not passed on the command line
    pub implicit: Vec<String>,
    /// Order-only inputs: must exist before the edge runs
    pub order_only: Vec<String>,
    /// Edge-scoped variable bindings, in declaration order
    pub bindings: Vec<(String, String)>,
}

impl Edge {
    pub fn new(output: impl Into<String>, rule: impl Into<String>) -> Self {
        Edge {
            outputs: vec![output.into()],
            rule: rule.into(),
            inputs: Vec::new(),
            implicit: Vec::new(),
            order_only: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// An aggregate target with no command.
    pub fn phony(output: impl Into<String>) -> Self {
        Edge::new(output, PHONY)
    }

    pub fn outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(outputs.into_iter().map(Into::into));
        self
    }

    pub fn inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(inputs.into_iter().map(Into::into));
        self
    }

    pub fn implicit<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implicit.extend(inputs.into_iter().map(Into::into));
        self
    }

    pub fn order_only<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_only.extend(inputs.into_iter().map(Into::into));
        self
    }

    pub fn binding(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.bindings.push((key.into(), value.into()));
        self
    }

    /// Value of an edge-scoped binding.
    pub fn get_binding(&self, key: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// One declaration of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Comment(String),
    Variable { name: String, value: String },
    Pool(Pool),
    Rule(Rule),
    Edge(Edge),
    Default(Vec<String>),
}

/// An ordered build graph that guarantees a single producer per output.
#[derive(Debug, Clone, Default)]
pub struct BuildGraph {
    items: Vec<Item>,
    outputs: HashSet<String>,
    rules: HashSet<String>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.items.push(Item::Comment(text.into()));
    }

    /// Declare a top-level variable.
    pub fn variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.items.push(Item::Variable {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn pool(&mut self, name: impl Into<String>, depth: u32) {
        self.items.push(Item::Pool(Pool {
            name: name.into(),
            depth,
        }));
    }

    /// Declare a rule. Rule names are unique.
    pub fn rule(&mut self, rule: Rule) -> Result<(), GraphError> {
        if !self.rules.insert(rule.name.clone()) {
            return Err(GraphError::DuplicateRule(rule.name));
        }
        self.items.push(Item::Rule(rule));
        Ok(())
    }

    /// Add a build edge. Its rule must already be declared and none of its
    /// outputs may have another producer.
    pub fn edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if edge.rule != PHONY && !self.rules.contains(&edge.rule) {
            return Err(GraphError::UnknownRule {
                output: edge.outputs.first().cloned().unwrap_or_default(),
                rule: edge.rule,
            });
        }
        if let Some(dup) = edge.outputs.iter().find(|o| self.outputs.contains(*o)) {
            return Err(GraphError::DuplicateOutput(dup.clone()));
        }
        self.outputs.extend(edge.outputs.iter().cloned());
        self.items.push(Item::Edge(edge));
        Ok(())
    }

    pub fn default_targets(&mut self, targets: Vec<String>) {
        self.items.push(Item::Default(targets));
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.items.iter().filter_map(|item| match item {
            Item::Edge(edge) => Some(edge),
            _ => None,
        })
    }

    /// Edges using `rule`.
    pub fn edges_with_rule<'a>(&'a self, rule: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges().filter(move |e| e.rule == rule)
    }

    /// The edge producing `output`.
    pub fn producer(&self, output: &str) -> Option<&Edge> {
        self.edges().find(|e| e.outputs.iter().any(|o| o == output))
    }

    pub fn rule_named(&self, name: &str) -> Option<&Rule> {
        self.items.iter().find_map(|item| match item {
            Item::Rule(rule) if rule.name == name => Some(rule),
            _ => None,
        })
    }

    /// Value of a top-level variable.
    pub fn variable_value(&self, name: &str) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            Item::Variable { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }
}

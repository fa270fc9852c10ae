// crates/funclink-core/src/dependency.rs
// ============================================================================
// Module: Dependency Analyzer
// Description: Runtime caller/callee graph with cycle detection.
// Purpose: Show which components call which, and flag circular call chains.
// Dependencies: dashmap, serde, tracing
// ============================================================================

//! ## Overview
//! The analyzer keeps a forward index (caller to callees) and a reverse
//! index (callee to callers). Every recorded edge also registers both
//! endpoints as nodes, so a component that calls nothing shows up with an
//! empty forward set and is reported as a leaf; one that nobody calls shows
//! up with an empty reverse set and is reported as a root.
//!
//! Queries work on a sorted snapshot of the indexes, so results are
//! deterministic even while calls are being recorded concurrently.
//!
//! Invariants:
//! - `b` is in `calls[a]` if and only if `a` is in `callers[b]`.
//! - Edges are a set; repeating a call adds nothing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt::Write as _;

use dashmap::DashMap;
use dashmap::DashSet;
use serde::Serialize;
use tracing::trace;

// ============================================================================
// SECTION: Dependency Info
// ============================================================================

/// Dependency summary for one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyInfo {
    /// Component key.
    pub function: String,
    /// Components this component calls.
    pub calls_to: BTreeSet<String>,
    /// Components that call this component.
    pub called_by: BTreeSet<String>,
    /// True when the component calls nothing.
    pub is_leaf: bool,
    /// True when nothing calls the component.
    pub is_root: bool,
    /// Number of components this component calls.
    pub dependency_count: usize,
    /// Number of components that call this component.
    pub dependent_count: usize,
}

// ============================================================================
// SECTION: Analyzer
// ============================================================================

/// Thread-safe runtime dependency graph.
#[derive(Debug, Default)]
pub struct DependencyAnalyzer {
    /// Forward index: caller to callees.
    calls: DashMap<String, DashSet<String>>,
    /// Reverse index: callee to callers.
    callers: DashMap<String, DashSet<String>>,
}

impl DependencyAnalyzer {
    /// Creates an empty analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `caller` invoked `callee`.
    pub fn record_call(&self, caller: &str, callee: &str) {
        let inserted = self.calls.entry(caller.to_string()).or_default().insert(callee.to_string());
        self.callers.entry(callee.to_string()).or_default().insert(caller.to_string());
        self.calls.entry(callee.to_string()).or_default();
        self.callers.entry(caller.to_string()).or_default();
        if inserted {
            trace!(caller, callee, "recorded dependency edge");
        }
    }

    /// Returns the components `component` calls.
    #[must_use]
    pub fn dependencies_of(&self, component: &str) -> BTreeSet<String> {
        self.calls.get(component).map(|set| collect_set(&set)).unwrap_or_default()
    }

    /// Returns the components that call `component`.
    #[must_use]
    pub fn dependents_of(&self, component: &str) -> BTreeSet<String> {
        self.callers.get(component).map(|set| collect_set(&set)).unwrap_or_default()
    }

    /// Returns a sorted snapshot of the forward index.
    #[must_use]
    pub fn dependency_graph(&self) -> BTreeMap<String, BTreeSet<String>> {
        snapshot(&self.calls)
    }

    /// Returns every simple cycle reachable by depth-first search.
    ///
    /// Each cycle lists components in call order and repeats the first
    /// component at the end (`[a, b, c, a]`).
    #[must_use]
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let graph = self.dependency_graph();
        let mut search = CycleSearch {
            graph: &graph,
            visited: BTreeSet::new(),
            on_stack: BTreeSet::new(),
            path: Vec::new(),
            cycles: Vec::new(),
        };
        for node in graph.keys() {
            if !search.visited.contains(node.as_str()) {
                search.visit(node);
            }
        }
        search.cycles
    }

    /// Returns components that call nothing.
    #[must_use]
    pub fn leaf_functions(&self) -> BTreeSet<String> {
        empty_entries(&self.calls)
    }

    /// Returns components that nothing calls.
    #[must_use]
    pub fn root_functions(&self) -> BTreeSet<String> {
        empty_entries(&self.callers)
    }

    /// Returns the dependency summary for one component.
    #[must_use]
    pub fn dependency_info(&self, component: &str) -> DependencyInfo {
        let calls_to = self.dependencies_of(component);
        let called_by = self.dependents_of(component);
        DependencyInfo {
            function: component.to_string(),
            is_leaf: calls_to.is_empty(),
            is_root: called_by.is_empty(),
            dependency_count: calls_to.len(),
            dependent_count: called_by.len(),
            calls_to,
            called_by,
        }
    }

    /// Renders the forward index as a Graphviz DOT digraph.
    #[must_use]
    pub fn export_graph(&self) -> String {
        let mut dot = String::from("digraph FunctionDependencies {\n");
        dot.push_str("  rankdir=TB;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");
        for (caller, callees) in self.dependency_graph() {
            for callee in callees {
                let _ = writeln!(dot, "  \"{}\" -> \"{}\";", escape_dot(&caller), escape_dot(&callee));
            }
        }
        dot.push_str("}\n");
        dot
    }

    /// Removes every recorded edge and node.
    pub fn clear(&self) {
        self.calls.clear();
        self.callers.clear();
    }
}

// ============================================================================
// SECTION: Cycle Search
// ============================================================================

/// Depth-first search state for cycle detection.
struct CycleSearch<'a> {
    /// Graph snapshot being searched.
    graph: &'a BTreeMap<String, BTreeSet<String>>,
    /// Nodes already explored.
    visited: BTreeSet<&'a str>,
    /// Nodes on the current DFS path.
    on_stack: BTreeSet<&'a str>,
    /// Current DFS path in visit order.
    path: Vec<&'a str>,
    /// Cycles found so far.
    cycles: Vec<Vec<String>>,
}

impl<'a> CycleSearch<'a> {
    /// Explores `node`, recording a cycle for every back edge.
    fn visit(&mut self, node: &'a str) {
        self.visited.insert(node);
        self.on_stack.insert(node);
        self.path.push(node);
        let graph = self.graph;
        if let Some(next) = graph.get(node) {
            for callee in next {
                let callee = callee.as_str();
                if !self.visited.contains(callee) {
                    self.visit(callee);
                } else if self.on_stack.contains(callee)
                    && let Some(start) = self.path.iter().position(|item| *item == callee)
                {
                    let mut cycle: Vec<String> =
                        self.path[start ..].iter().map(|item| (*item).to_string()).collect();
                    cycle.push(callee.to_string());
                    self.cycles.push(cycle);
                }
            }
        }
        self.path.pop();
        self.on_stack.remove(node);
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Copies a concurrent set into a sorted set.
fn collect_set(set: &DashSet<String>) -> BTreeSet<String> {
    set.iter().map(|item| item.key().clone()).collect()
}

/// Copies a concurrent index into a sorted map.
fn snapshot(index: &DashMap<String, DashSet<String>>) -> BTreeMap<String, BTreeSet<String>> {
    index.iter().map(|entry| (entry.key().clone(), collect_set(entry.value()))).collect()
}

/// Returns keys whose set is empty.
fn empty_entries(index: &DashMap<String, DashSet<String>>) -> BTreeSet<String> {
    index
        .iter()
        .filter(|entry| entry.value().is_empty())
        .map(|entry| entry.key().clone())
        .collect()
}

/// Escapes a component key for use inside a quoted DOT identifier.
fn escape_dot(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

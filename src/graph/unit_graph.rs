//! The dependency graph of one run.
//!
//! Edges point from a unit to each of its dependencies. Nested units also
//! remember the unit whose source tree they live in; that relation orders
//! Fetch but is not a dependency edge.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::{BuildError, BuildResult};
use crate::graph::registry::UnitRegistry;

/// Validated, acyclic subgraph reachable from the requested units.
#[derive(Debug, Clone)]
pub struct UnitGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    /// Dependencies in declaration order (petgraph iterates neighbours in
    /// reverse insertion order).
    dependencies: HashMap<String, Vec<String>>,
    /// Nested unit -> unit whose tree holds its sources.
    parents: HashMap<String, String>,
    requested: Vec<String>,
}

impl UnitGraph {
    /// Materialise the subgraph reachable from `requested`.
    ///
    /// Fails on unknown units (naming the unit that required them) and on
    /// dependency cycles (naming the cycle).
    pub fn build<S: AsRef<str>>(registry: &UnitRegistry, requested: &[S]) -> BuildResult<Self> {
        let mut graph = UnitGraph {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            dependencies: HashMap::new(),
            parents: HashMap::new(),
            requested: requested.iter().map(|s| s.as_ref().to_string()).collect(),
        };

        let mut queue: VecDeque<(String, Option<String>)> = graph
            .requested
            .iter()
            .map(|name| (name.clone(), None))
            .collect();

        while let Some((name, required_by)) = queue.pop_front() {
            if graph.nodes.contains_key(&name) {
                continue;
            }
            let recipe = registry.get(&name).ok_or_else(|| BuildError::UnknownUnit {
                name: name.clone(),
                required_by: required_by.clone(),
            })?;
            let spec = recipe.spec();

            let idx = graph.graph.add_node(name.clone());
            graph.nodes.insert(name.clone(), idx);
            graph
                .dependencies
                .insert(name.clone(), spec.dependencies.clone());

            for dep in &spec.dependencies {
                queue.push_back((dep.clone(), Some(name.clone())));
            }
            if let Some(parent) = spec.source.parent() {
                graph.parents.insert(name.clone(), parent.to_string());
                queue.push_back((parent.to_string(), Some(name.clone())));
            }
        }

        for (name, deps) in &graph.dependencies {
            let from = graph.nodes[name];
            for dep in deps {
                let to = graph.nodes[dep];
                if !graph.graph.contains_edge(from, to) {
                    graph.graph.add_edge(from, to, ());
                }
            }
        }

        graph.verify_acyclic()?;
        Ok(graph)
    }

    fn verify_acyclic(&self) -> BuildResult<()> {
        for start in self.parents.keys() {
            let mut chain = vec![start.clone()];
            let mut current = start.as_str();
            while let Some(parent) = self.nested_parent(current) {
                chain.push(parent.to_string());
                if chain[..chain.len() - 1].iter().any(|c| c == parent) {
                    return Err(BuildError::DependencyCycle { cycle: chain });
                }
                current = parent;
            }
        }

        match toposort(&self.graph, None) {
            Ok(_) => Ok(()),
            Err(cycle) => {
                let start = self.graph[cycle.node_id()].clone();
                Err(BuildError::DependencyCycle {
                    cycle: self.cycle_through(&start),
                })
            }
        }
    }

    /// Path `start -> ... -> start`, following declaration order.
    fn cycle_through(&self, start: &str) -> Vec<String> {
        fn walk<'a>(
            graph: &'a UnitGraph,
            current: &'a str,
            start: &str,
            path: &mut Vec<&'a str>,
            seen: &mut HashSet<&'a str>,
        ) -> bool {
            for dep in graph.dependencies(current) {
                if dep == start {
                    path.push(dep);
                    return true;
                }
                if seen.insert(dep) {
                    path.push(dep);
                    if walk(graph, dep, start, path, seen) {
                        return true;
                    }
                    path.pop();
                }
            }
            false
        }

        let mut path = vec![start];
        let mut seen = HashSet::new();
        walk(self, start, start, &mut path, &mut seen);
        path.into_iter().map(str::to_string).collect()
    }

    /// Units the graph was built for.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Direct dependencies in declaration order.
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.dependencies
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every unit in the graph.
    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Units that depend on `name`, directly or transitively.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let Some(&start) = self.nodes.get(name) else {
            return Vec::new();
        };

        let mut seen = HashSet::from([start]);
        let mut stack = vec![start];
        let mut out = Vec::new();
        while let Some(node) = stack.pop() {
            for parent in self.graph.neighbors_directed(node, Direction::Incoming) {
                if seen.insert(parent) {
                    out.push(self.graph[parent].clone());
                    stack.push(parent);
                }
            }
        }
        out
    }

    /// Unit whose tree holds `name`'s sources, if nested.
    pub fn nested_parent(&self, name: &str) -> Option<&str> {
        self.parents.get(name).map(String::as_str)
    }

    /// Depth-first post-order from `root`: every dependency before its
    /// dependents, declaration order among siblings, each unit once.
    pub fn compile_order(&self, root: &str) -> Vec<String> {
        fn visit(graph: &UnitGraph, name: &str, seen: &mut HashSet<String>, out: &mut Vec<String>) {
            if !seen.insert(name.to_string()) {
                return;
            }
            for dep in graph.dependencies(name) {
                visit(graph, dep, seen, out);
            }
            out.push(name.to_string());
        }

        let mut out = Vec::new();
        visit(self, root, &mut HashSet::new(), &mut out);
        out
    }

    /// Pre-order from `root` over dependencies, with a nested unit's parent
    /// always ahead of it. A parent pulled in only for nesting is fetched
    /// but its own dependencies are not.
    pub fn fetch_order(&self, root: &str) -> Vec<String> {
        struct Walk<'a> {
            fetched: HashSet<&'a str>,
            expanded: HashSet<&'a str>,
            out: Vec<String>,
        }

        fn visit<'a>(graph: &'a UnitGraph, name: &'a str, expand: bool, walk: &mut Walk<'a>) {
            if let Some(parent) = graph.nested_parent(name) {
                visit(graph, parent, false, walk);
            }
            if walk.fetched.insert(name) {
                walk.out.push(name.to_string());
            }
            if expand && walk.expanded.insert(name) {
                for dep in graph.dependencies(name) {
                    visit(graph, dep, true, walk);
                }
            }
        }

        let mut walk = Walk {
            fetched: HashSet::new(),
            expanded: HashSet::new(),
            out: Vec::new(),
        };
        if let Some((root, _)) = self.nodes.get_key_value(root) {
            visit(self, root, true, &mut walk);
        }
        walk.out
    }

    /// Every unit reachable from `from` through dependency edges, direct
    /// dependencies first, then theirs (breadth first). `from` is excluded.
    pub fn search_order(&self, from: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<&str> = VecDeque::from([from]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for dep in self.dependencies(current) {
                if seen.insert(dep) {
                    out.push(dep.clone());
                    queue.push_back(dep);
                }
            }
        }
        out
    }

    /// Find `name` among the units reachable from `from`.
    pub fn find(&self, from: &str, name: &str) -> Option<&str> {
        self.search_order(from)
            .iter()
            .find(|dep| dep.as_str() == name)
            .and_then(|dep| self.nodes.get_key_value(dep.as_str()))
            .map(|(key, _)| key.as_str())
    }

    /// Dependencies of `root` grouped into waves: a unit's dependencies all
    /// sit in earlier waves, units in one wave are independent. `root`
    /// itself is not included.
    pub fn waves(&self, root: &str) -> Vec<Vec<String>> {
        let order = self.compile_order(root);
        let mut level: HashMap<&str, usize> = HashMap::new();
        let mut waves: Vec<Vec<String>> = Vec::new();

        for name in order.iter().filter(|n| n.as_str() != root) {
            let lvl = self
                .dependencies(name)
                .iter()
                .map(|d| level[d.as_str()] + 1)
                .max()
                .unwrap_or(0);
            level.insert(name, lvl);
            if waves.len() <= lvl {
                waves.resize_with(lvl + 1, Vec::new);
            }
            waves[lvl].push(name.clone());
        }
        waves
    }
}

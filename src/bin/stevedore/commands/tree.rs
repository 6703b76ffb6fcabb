//! `stevedore tree` command

use std::collections::HashSet;

use anyhow::Result;

use super::Session;
use crate::cli::{GlobalArgs, TreeArgs};
use stevedore::graph::{UnitGraph, UnitRegistry};

pub fn execute(args: TreeArgs, global: &GlobalArgs) -> Result<()> {
    let session = Session::new(global)?;
    let registry = UnitRegistry::with_config(&session.config)?;
    let graph = UnitGraph::build(&registry, &[args.unit.as_str()])?;

    let mut seen = HashSet::new();
    print_tree(
        &registry,
        &graph,
        &args.unit,
        0,
        args.depth.unwrap_or(usize::MAX),
        &mut seen,
        args.duplicates,
    );

    Ok(())
}

fn print_tree(
    registry: &UnitRegistry,
    graph: &UnitGraph,
    name: &str,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<String>,
    show_duplicates: bool,
) {
    if depth > max_depth {
        return;
    }

    let is_duplicate = !seen.insert(name.to_string());

    let prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}├── ", "│   ".repeat(depth - 1))
    };

    let version = registry
        .get(name)
        .map(|r| r.spec().version.clone())
        .filter(|v| !v.is_empty())
        .map(|v| format!(" v{}", v))
        .unwrap_or_default();

    let nested = graph
        .nested_parent(name)
        .map(|parent| format!(" [in {}]", parent))
        .unwrap_or_default();

    let dup_marker = if is_duplicate && !show_duplicates {
        " (*)"
    } else {
        ""
    };

    println!("{}{}{}{}{}", prefix, name, version, nested, dup_marker);

    // Don't recurse into duplicates unless explicitly requested
    if is_duplicate && !show_duplicates {
        return;
    }

    for dep in graph.dependencies(name) {
        print_tree(registry, graph, dep, depth + 1, max_depth, seen, show_duplicates);
    }
}

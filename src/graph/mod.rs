//! Unit registry and dependency graph.

pub mod registry;
pub mod unit_graph;

pub use registry::UnitRegistry;
pub use unit_graph::UnitGraph;

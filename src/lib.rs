//! Stevedore - fetch, build, stage and smoke-test native third-party
//! libraries for a downstream build.
//!
//! Every library is a unit with a [`Recipe`](builder::Recipe) that goes
//! through Fetch, Compile, Stage and Verify. Units are ordered by a
//! dependency graph; each staged unit appends its
//! [`BuildInfo`](core::BuildInfo) to the Info Record that downstream builds
//! read.

pub mod builder;
pub mod core;
pub mod graph;
pub mod ops;
pub mod record;
pub mod recipes;
pub mod sources;
pub mod util;

/// Test utilities and mocks for Stevedore unit tests.
///
/// Provides a recording command runner and fixture recipes so the engine
/// can be driven without touching the network or a compiler.
#[cfg(test)]
pub mod test_support;

pub use builder::{Recipe, StageContext};
pub use core::{BuildError, BuildInfo, Category, UnitSpec};
pub use graph::{UnitGraph, UnitRegistry};
pub use ops::Engine;

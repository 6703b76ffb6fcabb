//! High-level operations.
//!
//! This module contains the implementation of stevedore commands.

pub mod bundle;
pub mod clean;
pub mod flags;
pub mod get;

pub use bundle::{bundle, BundleResult};
pub use clean::clean;
pub use flags::{flags, Flags};
pub use get::{Engine, RunReport};

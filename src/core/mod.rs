//! Core data structures for Stevedore.
//!
//! - Unit identity and source locators
//! - The BuildInfo artifact model
//! - Filesystem layout, lifecycle status and errors

pub mod build_info;
pub mod error;
pub mod layout;
pub mod status;
pub mod unit;

pub use build_info::{BuildInfo, Category};
pub use error::{BuildError, BuildResult, Stage};
pub use layout::{Roots, UnitLayout};
pub use status::UnitStatus;
pub use unit::{SourceLocator, UnitSpec};

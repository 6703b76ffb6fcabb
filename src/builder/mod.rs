//! Per-unit lifecycle: the recipe trait, its default stages and the native
//! build-tool drivers recipes use.

pub mod autotools;
pub mod cmake;
pub mod context;
pub mod defaults;
pub mod recipe;
pub mod smoke;

pub use context::{BuildSettings, ForStage, StageContext};
pub use recipe::{Language, Recipe, SmokeTest, StageArtifact};

//! The lifecycle every unit goes through.

use std::path::PathBuf;

use crate::builder::context::StageContext;
use crate::builder::defaults;
use crate::core::layout::{BIN_DIR, DOC_DIR, INCLUDE_DIR, LIB_DIR};
use crate::core::{BuildResult, UnitSpec};

/// Language of a smoke-test program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    C,
    Cxx,
}

impl Language {
    /// File extension of a source file in this language.
    pub fn extension(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "cpp",
        }
    }
}

/// A tiny program that must compile, link and run against a staged unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeTest {
    pub language: Language,
    pub source: String,
    /// Extra compiler arguments (e.g. `-std=c++11`).
    pub flags: Vec<String>,
}

impl SmokeTest {
    pub fn cxx(source: impl Into<String>) -> Self {
        SmokeTest {
            language: Language::Cxx,
            source: source.into(),
            flags: Vec::new(),
        }
    }

    pub fn c(source: impl Into<String>) -> Self {
        SmokeTest {
            language: Language::C,
            source: source.into(),
            flags: Vec::new(),
        }
    }

    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }
}

/// A file or directory copied from the build folder into the stage folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageArtifact {
    /// Relative to the build folder.
    pub from: PathBuf,
    /// Relative to the stage folder.
    pub to: PathBuf,
    /// A missing required artifact fails the stage.
    pub required: bool,
}

impl StageArtifact {
    pub fn required(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        StageArtifact {
            from: from.into(),
            to: to.into(),
            required: true,
        }
    }

    pub fn optional(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        StageArtifact {
            from: from.into(),
            to: to.into(),
            required: false,
        }
    }
}

/// The conventional `include`, `lib`, `bin` and `doc` folders, all optional.
pub fn canonical_artifacts() -> Vec<StageArtifact> {
    [INCLUDE_DIR, LIB_DIR, BIN_DIR, DOC_DIR]
        .into_iter()
        .map(|dir| StageArtifact::optional(dir, dir))
        .collect()
}

/// How to fetch, compile, stage and verify one third-party library.
///
/// Every stage has a default in [`defaults`]. A recipe overrides only the
/// stages that differ and may call the default from its override to extend
/// it. The engine resets the build folder before [`compile`](Recipe::compile)
/// and the stage folder before [`stage`](Recipe::stage); recipes never do.
pub trait Recipe: Send + Sync {
    fn spec(&self) -> &UnitSpec;

    /// Make the unit's sources available under `<src_root>/<name>`.
    fn fetch(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::fetch(ctx)
    }

    /// Produce build outputs in the build folder.
    fn compile(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::compile(ctx)
    }

    /// Copy outputs into the stage folder and describe them in the BuildInfo.
    fn stage(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::stage(&self.artifacts(), ctx)
    }

    /// Check the staged unit is usable.
    fn verify(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::verify(self.smoke_test().as_ref(), ctx)
    }

    /// Program run by the default Verify.
    fn smoke_test(&self) -> Option<SmokeTest> {
        None
    }

    /// What the default Stage copies.
    fn artifacts(&self) -> Vec<StageArtifact> {
        canonical_artifacts()
    }
}

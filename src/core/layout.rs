//! On-disk layout of sources, build trees and staged packages.
//!
//! ```text
//! <src_root>/<unit>/                 downloaded archive + extracted tree
//! <build_root>/<unit>/               reset before every Compile
//! <stage_root>/<unit>/{include,lib,bin,doc}
//! <stage_root>/third_party_info      Info Record
//! ```

use std::path::{Path, PathBuf};

/// Canonical stage sub-folder for headers.
pub const INCLUDE_DIR: &str = "include";
/// Canonical stage sub-folder for libraries.
pub const LIB_DIR: &str = "lib";
/// Canonical stage sub-folder for executables.
pub const BIN_DIR: &str = "bin";
/// Canonical stage sub-folder for documentation.
pub const DOC_DIR: &str = "doc";

/// The three per-run roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub src: PathBuf,
    pub build: PathBuf,
    pub stage: PathBuf,
}

impl Roots {
    /// `src`, `build` and `pkg` under one base directory.
    pub fn under(base: &Path) -> Self {
        Roots {
            src: base.join("src"),
            build: base.join("build"),
            stage: base.join("pkg"),
        }
    }
}

/// Folders belonging to one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitLayout {
    /// `<src_root>/<unit>`: where archives are downloaded and extracted.
    pub src: PathBuf,
    /// The unit's source tree (extracted directory, nested path or local path).
    pub source_tree: PathBuf,
    /// `<build_root>/<unit>`
    pub build: PathBuf,
    /// `<stage_root>/<unit>`
    pub stage: PathBuf,
}

impl UnitLayout {
    pub fn new(roots: &Roots, name: &str, source_tree: PathBuf) -> Self {
        UnitLayout {
            src: roots.src.join(name),
            source_tree,
            build: roots.build.join(name),
            stage: roots.stage.join(name),
        }
    }

    pub fn include_dir(&self) -> PathBuf {
        self.stage.join(INCLUDE_DIR)
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.stage.join(LIB_DIR)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.stage.join(BIN_DIR)
    }

    pub fn doc_dir(&self) -> PathBuf {
        self.stage.join(DOC_DIR)
    }
}

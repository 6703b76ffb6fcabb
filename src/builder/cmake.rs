//! CMake driver for units that ship a CMake build.

use std::path::{Path, PathBuf};

use crate::builder::context::StageContext;
use crate::core::BuildResult;
use crate::util::process::ProcessBuilder;

/// Configure, build and install a CMake project out of tree.
#[derive(Debug, Clone)]
pub struct CMakeBuild {
    source_dir: PathBuf,
    build_dir: PathBuf,
    install_prefix: Option<PathBuf>,
    defines: Vec<(String, String)>,
    targets: Vec<String>,
}

impl CMakeBuild {
    pub fn new(source_dir: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        CMakeBuild {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            install_prefix: None,
            defines: Vec::new(),
            targets: Vec::new(),
        }
    }

    /// Set `CMAKE_INSTALL_PREFIX`.
    pub fn install_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.install_prefix = Some(prefix.into());
        self
    }

    /// Add a `-D<key>=<value>` cache entry.
    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((key.into(), value.into()));
        self
    }

    /// Build only these targets.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn configure_command(&self) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new("cmake")
            .arg("-S")
            .arg(&self.source_dir)
            .arg("-B")
            .arg(&self.build_dir)
            .arg("-DCMAKE_BUILD_TYPE=Release");

        if let Some(prefix) = &self.install_prefix {
            cmd = cmd.arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()));
        }
        for (key, value) in &self.defines {
            cmd = cmd.arg(format!("-D{}={}", key, value));
        }
        cmd
    }

    pub fn build_command(&self, jobs: usize) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new("cmake")
            .arg("--build")
            .arg(&self.build_dir)
            .arg("--parallel")
            .arg(jobs.to_string());

        if !self.targets.is_empty() {
            cmd = cmd.arg("--target").args(&self.targets);
        }
        cmd
    }

    pub fn install_command(&self) -> ProcessBuilder {
        ProcessBuilder::new("cmake")
            .arg("--install")
            .arg(&self.build_dir)
    }

    /// Configure and build.
    pub fn compile(&self, ctx: &StageContext<'_>) -> BuildResult<()> {
        ctx.run(self.configure_command())?;
        ctx.run(self.build_command(ctx.jobs()))
    }

    /// Install into the configured prefix.
    pub fn install(&self, ctx: &StageContext<'_>) -> BuildResult<()> {
        ctx.run(self.install_command())
    }
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cmake_project() {
        use tempfile::TempDir;

        let tmp = TempDir::new().unwrap();
        assert!(!is_cmake_project(tmp.path()));

        std::fs::write(
            tmp.path().join("CMakeLists.txt"),
            "cmake_minimum_required(VERSION 3.10)",
        )
        .unwrap();
        assert!(is_cmake_project(tmp.path()));
    }

    #[test]
    fn test_commands() {
        let build = CMakeBuild::new("/b/NLopt", "/b/NLopt/Build")
            .install_prefix("/pkg/NLopt")
            .define("NLOPT_PYTHON", "OFF")
            .target("nlopt");

        assert_eq!(
            build.configure_command().display_command(),
            "cmake -S /b/NLopt -B /b/NLopt/Build -DCMAKE_BUILD_TYPE=Release \
             -DCMAKE_INSTALL_PREFIX=/pkg/NLopt -DNLOPT_PYTHON=OFF"
        );
        assert_eq!(
            build.build_command(4).display_command(),
            "cmake --build /b/NLopt/Build --parallel 4 --target nlopt"
        );
        assert_eq!(
            build.install_command().display_command(),
            "cmake --install /b/NLopt/Build"
        );
    }
}

//! Smoke tests: compile, link and run a tiny program against a staged unit.

use std::path::Path;

use anyhow::Context;

use crate::builder::context::{BuildSettings, ForStage, StageContext};
use crate::builder::recipe::{Language, SmokeTest};
use crate::core::{BuildInfo, BuildResult};
use crate::util::process::ProcessBuilder;
use crate::util::shell::Status;

/// Environment variables that point the dynamic loader at staged libraries.
const LIBRARY_PATH_VARS: [&str; 2] = ["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH"];

/// Build the compiler invocation for a smoke test.
///
/// Flags come from `infos` in order: the unit itself first, then its
/// dependencies, so the unit's own headers and libraries win.
pub fn compile_command(
    test: &SmokeTest,
    settings: &BuildSettings,
    infos: &[&BuildInfo],
    source: &Path,
    output: &Path,
) -> ProcessBuilder {
    let compiler = match test.language {
        Language::C => &settings.cc,
        Language::Cxx => &settings.cxx,
    };

    let mut cmd = ProcessBuilder::new(compiler).args(&test.flags);
    if test.language == Language::Cxx {
        cmd = cmd.args(&settings.cxxflags);
    }
    let mut cmd = cmd
        .arg(source)
        .arg("-o")
        .arg(output);

    for info in infos {
        cmd = cmd.args(info.include_flags());
    }
    for info in infos {
        cmd = cmd.args(info.link_flags());
    }

    cmd.args(&settings.ldflags)
}

/// Value for the loader search path: staged library folders, then whatever
/// `current` already held.
pub fn library_search_path(infos: &[&BuildInfo], current: Option<&str>) -> String {
    let mut paths: Vec<&str> = infos
        .iter()
        .flat_map(|info| info.lib_paths().iter().map(String::as_str))
        .collect();
    if let Some(current) = current.filter(|c| !c.is_empty()) {
        paths.push(current);
    }
    paths.join(":")
}

/// Compile and run `test` in a temporary directory.
///
/// A failure to compile or a non-zero exit of the program is a verify error
/// naming the failing command.
pub fn run(test: &SmokeTest, ctx: &StageContext<'_>) -> BuildResult<()> {
    ctx.status(Status::Verifying, "smoke test");

    let dir = tempfile::Builder::new()
        .prefix("stevedore-smoke")
        .tempdir()
        .context("failed to create smoke-test directory")
        .for_stage(ctx)?;

    let source = dir.path().join(format!("main.{}", test.language.extension()));
    std::fs::write(&source, &test.source)
        .with_context(|| format!("failed to write {}", source.display()))
        .for_stage(ctx)?;
    let exe = dir.path().join("smoke");

    let infos: Vec<&BuildInfo> = std::iter::once(ctx.info())
        .chain(ctx.dependency_infos().map(|(_, info)| info))
        .collect();

    ctx.run(compile_command(test, ctx.settings(), &infos, &source, &exe).cwd(dir.path()))?;

    let mut program = ProcessBuilder::new(&exe).cwd(dir.path());
    for var in LIBRARY_PATH_VARS {
        let current = std::env::var(var).ok();
        program = program.env(var, library_search_path(&infos, current.as_deref()));
    }
    ctx.run(program)
}

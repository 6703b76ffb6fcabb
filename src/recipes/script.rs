//! Units declared in `stevedore.toml` under `[units.<name>]`.
//!
//! ```toml
//! [units.zlib]
//! version = "1.3.1"
//! url = "https://zlib.net/zlib-1.3.1.tar.gz"
//! libs = ["z"]
//! compile = ["./configure --prefix={stage}", "make -j{jobs}"]
//! stage = ["make install"]
//! smoke_test = "#include <zlib.h>\nint main() { return zlibVersion()[0] == '1' ? 0 : 1; }"
//! smoke_language = "c"
//! ```
//!
//! `git = "<url>"` with an optional `rev` clones instead of downloading, and
//! `sha256` pins the downloaded archive.
//!
//! Commands run through the shell in the unit's build folder after the
//! placeholders `{name}`, `{src}`, `{build}`, `{stage}`, `{version}` and
//! `{jobs}` are substituted.

use anyhow::{bail, Result};

use crate::builder::defaults::{self, path_string};
use crate::builder::recipe::canonical_artifacts;
use crate::builder::{Recipe, SmokeTest, StageContext};
use crate::core::unit::archive_name_from_url;
use crate::core::{BuildResult, SourceLocator, UnitSpec};
use crate::util::config::{validate_unit_name, ScriptUnitConfig};

/// Extensions stripped from an archive name to guess its top-level folder.
const ARCHIVE_EXTENSIONS: [&str; 7] = [
    ".tar.gz", ".tgz", ".tar.bz2", ".tbz2", ".tar.xz", ".tar", ".zip",
];

#[derive(Debug, Clone)]
pub struct ScriptRecipe {
    spec: UnitSpec,
    compile: Vec<String>,
    stage: Vec<String>,
    verify: Vec<String>,
    smoke_test: Option<SmokeTest>,
}

impl ScriptRecipe {
    pub fn from_config(name: &str, unit: &ScriptUnitConfig) -> Result<Self> {
        validate_unit_name(name)?;
        let source = source_from_config(name, unit)?;

        let smoke_test = match (&unit.smoke_test, unit.smoke_language.as_deref()) {
            (None, _) => None,
            (Some(source), None | Some("c++")) => Some(SmokeTest::cxx(source)),
            (Some(source), Some("c")) => Some(SmokeTest::c(source)),
            (Some(_), Some(other)) => bail!(
                "unit `{}` has unknown smoke_language `{}` (expected `c` or `c++`)",
                name,
                other
            ),
        };

        let spec = UnitSpec::new(name, unit.version.clone().unwrap_or_default())
            .source(source)
            .depends_on(&unit.dependencies)
            .links(&unit.libs);

        Ok(ScriptRecipe {
            spec,
            compile: unit.compile.clone(),
            stage: unit.stage.clone(),
            verify: unit.verify.clone(),
            smoke_test,
        })
    }

    fn run_all(&self, commands: &[String], ctx: &StageContext<'_>) -> BuildResult<()> {
        for command in commands {
            ctx.sh(expand(command, ctx))?;
        }
        Ok(())
    }
}

impl Recipe for ScriptRecipe {
    fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    fn compile(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::compile(ctx)?;
        self.run_all(&self.compile, ctx)
    }

    /// Copy the canonical folders from the build folder, run the stage
    /// commands, then describe whatever ended up in the stage folder.
    fn stage(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::copy_artifacts(&canonical_artifacts(), ctx)?;
        self.run_all(&self.stage, ctx)?;
        defaults::describe(ctx)
    }

    fn verify(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::verify(self.smoke_test.as_ref(), ctx)?;
        self.run_all(&self.verify, ctx)
    }

    fn smoke_test(&self) -> Option<SmokeTest> {
        self.smoke_test.clone()
    }
}

fn source_from_config(name: &str, unit: &ScriptUnitConfig) -> Result<SourceLocator> {
    let remote = [unit.url.is_some(), unit.git.is_some(), unit.path.is_some()];
    if remote.iter().filter(|set| **set).count() > 1 {
        bail!("unit `{}` sets more than one of `url`, `git` and `path`", name);
    }
    if unit.sha256.is_some() && unit.url.is_none() {
        bail!("unit `{}` sets `sha256` without `url`", name);
    }
    if unit.rev.is_some() && unit.git.is_none() {
        bail!("unit `{}` sets `rev` without `git`", name);
    }

    if let Some(url) = &unit.url {
        let archive_name = unit
            .archive
            .clone()
            .unwrap_or_else(|| archive_name_from_url(url));
        let dir_name = unit
            .dir
            .clone()
            .unwrap_or_else(|| strip_archive_extension(&archive_name).to_string());
        return Ok(SourceLocator::Archive {
            url: url.clone(),
            archive_name,
            dir_name,
            sha256: unit.sha256.clone(),
        });
    }
    if let Some(url) = &unit.git {
        let dir_name = unit.dir.clone().unwrap_or_else(|| name.to_string());
        return Ok(SourceLocator::git(url, unit.rev.as_deref(), dir_name));
    }
    if let Some(path) = &unit.path {
        return Ok(SourceLocator::local(path));
    }

    match (&unit.nested_in, &unit.nested_path) {
        (Some(parent), Some(path)) => Ok(SourceLocator::nested(parent, path)),
        (None, None) => Ok(SourceLocator::None),
        _ => bail!(
            "unit `{}` must set `nested_in` and `nested_path` together",
            name
        ),
    }
}

/// Substitute the unit placeholders in a command line.
pub fn expand(command: &str, ctx: &StageContext<'_>) -> String {
    let layout = ctx.layout();
    command
        .replace("{name}", ctx.name())
        .replace("{src}", &path_string(&layout.source_tree))
        .replace("{build}", &path_string(&layout.build))
        .replace("{stage}", &path_string(&layout.stage))
        .replace("{version}", &ctx.spec().version)
        .replace("{jobs}", &ctx.jobs().to_string())
}

fn strip_archive_extension(archive_name: &str) -> &str {
    ARCHIVE_EXTENSIONS
        .iter()
        .find_map(|ext| archive_name.strip_suffix(ext))
        .unwrap_or(archive_name)
}

//! Per-stage context handed to recipes.

use std::fmt;
use std::path::Path;

use crate::core::{BuildError, BuildInfo, BuildResult, Stage, UnitLayout, UnitSpec};
use crate::util::config::Config;
use crate::util::patch::{patch_file, Patch};
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Settings shared by every unit in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Parallel jobs for native builds and the unit scheduler
    pub jobs: usize,

    /// Permit commands that need `sudo`
    pub allow_elevated: bool,

    /// C compiler for smoke tests
    pub cc: String,

    /// C++ compiler for smoke tests
    pub cxx: String,

    /// Extra compile flags for C++ smoke tests
    pub cxxflags: Vec<String>,

    /// Extra smoke-test link flags
    pub ldflags: Vec<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        BuildSettings {
            jobs: 1,
            allow_elevated: false,
            cc: std::env::var("CC").unwrap_or_else(|_| "cc".to_string()),
            cxx: std::env::var("CXX").unwrap_or_else(|_| "c++".to_string()),
            cxxflags: Vec::new(),
            ldflags: Vec::new(),
        }
    }
}

impl BuildSettings {
    pub fn from_config(config: &Config) -> Self {
        let defaults = BuildSettings::default();
        BuildSettings {
            jobs: config.jobs(),
            allow_elevated: config.build.allow_elevated.unwrap_or(false),
            cc: config.build.cc.clone().unwrap_or(defaults.cc),
            cxx: config.build.cxx.clone().unwrap_or(defaults.cxx),
            cxxflags: config.build.cxxflags.clone(),
            ldflags: config.build.ldflags.clone(),
        }
    }
}

/// Everything a recipe may touch while one lifecycle stage runs.
///
/// The context owns the unit's [`BuildInfo`] for the duration of the stage.
/// It is only writable during Stage.
pub struct StageContext<'a> {
    spec: &'a UnitSpec,
    stage: Stage,
    layout: &'a UnitLayout,
    settings: &'a BuildSettings,
    runner: &'a dyn CommandRunner,
    shell: &'a Shell,
    info: BuildInfo,
    dependencies: &'a [(String, BuildInfo)],
}

impl fmt::Debug for StageContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("unit", &self.spec.name)
            .field("stage", &self.stage)
            .field("layout", &self.layout)
            .field("dependencies", &self.dependency_names())
            .finish()
    }
}

impl<'a> StageContext<'a> {
    /// `dependencies` holds the staged BuildInfo of every unit reachable
    /// from this one, in lookup order: direct dependencies first, then
    /// theirs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spec: &'a UnitSpec,
        stage: Stage,
        layout: &'a UnitLayout,
        settings: &'a BuildSettings,
        runner: &'a dyn CommandRunner,
        shell: &'a Shell,
        info: BuildInfo,
        dependencies: &'a [(String, BuildInfo)],
    ) -> Self {
        StageContext {
            spec,
            stage,
            layout,
            settings,
            runner,
            shell,
            info,
            dependencies,
        }
    }

    pub fn spec(&self) -> &UnitSpec {
        self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn layout(&self) -> &UnitLayout {
        self.layout
    }

    pub fn settings(&self) -> &BuildSettings {
        self.settings
    }

    pub fn jobs(&self) -> usize {
        self.settings.jobs
    }

    pub fn shell(&self) -> &Shell {
        self.shell
    }

    /// Print a status line for this unit.
    pub fn status(&self, status: Status, msg: impl fmt::Display) {
        self.shell.status(status, format!("{} {}", self.spec.name, msg));
    }

    /// Run a command, mapping failure onto this stage's error kind.
    pub fn run(&self, cmd: ProcessBuilder) -> BuildResult<()> {
        if cmd.is_elevated() && !self.settings.allow_elevated {
            return Err(BuildError::Permission {
                unit: self.spec.name.clone(),
                operation: cmd.display_command(),
            });
        }

        tracing::debug!("[{}] {}", self.spec.name, cmd.display_command());
        self.runner
            .run(&cmd)
            .map_err(|err| BuildError::from_process(&self.spec.name, self.stage, err))
    }

    /// Run a shell command line in the unit's build folder.
    pub fn sh(&self, line: impl Into<String>) -> BuildResult<()> {
        self.sh_in(&self.layout.build, line)
    }

    /// Run a shell command line in `dir`.
    pub fn sh_in(&self, dir: &Path, line: impl Into<String>) -> BuildResult<()> {
        self.run(ProcessBuilder::shell(line).cwd(dir))
    }

    /// Apply a text patch to a file.
    pub fn patch(&self, file: &Path, patch: &Patch) -> BuildResult<usize> {
        self.status(Status::Patching, file.display());
        patch_file(file, patch).for_stage(self)
    }

    /// This unit's BuildInfo (empty before Stage).
    pub fn info(&self) -> &BuildInfo {
        &self.info
    }

    /// Mutable access to this unit's BuildInfo; only available during Stage.
    pub fn info_mut(&mut self) -> BuildResult<&mut BuildInfo> {
        if self.stage != Stage::Stage {
            return Err(self.internal(anyhow::anyhow!(
                "BuildInfo can only be written during stage, not {}",
                self.stage
            )));
        }
        Ok(&mut self.info)
    }

    /// Hand the BuildInfo back to the engine.
    pub fn into_info(self) -> BuildInfo {
        self.info
    }

    /// BuildInfo of a dependency, searching direct dependencies first and
    /// then theirs.
    pub fn dependency(&self, name: &str) -> BuildResult<&BuildInfo> {
        self.find_dependency(name)
            .ok_or_else(|| BuildError::MissingDependency {
                unit: self.spec.name.clone(),
                dependency: name.to_string(),
            })
    }

    /// Like [`dependency`](Self::dependency) but `None` on a miss.
    pub fn find_dependency(&self, name: &str) -> Option<&BuildInfo> {
        self.dependencies
            .iter()
            .find(|(dep, _)| dep == name)
            .map(|(_, info)| info)
    }

    /// BuildInfo of every reachable dependency, in lookup order.
    pub fn dependency_infos(&self) -> impl Iterator<Item = (&str, &BuildInfo)> {
        self.dependencies
            .iter()
            .map(|(name, info)| (name.as_str(), info))
    }

    fn dependency_names(&self) -> Vec<&str> {
        self.dependencies.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Wrap an unexpected error as an internal error of this stage.
    pub fn internal(&self, source: anyhow::Error) -> BuildError {
        BuildError::Internal {
            unit: self.spec.name.clone(),
            stage: self.stage,
            source,
        }
    }
}

/// Attach unit and stage to helper errors.
pub trait ForStage<T> {
    fn for_stage(self, ctx: &StageContext<'_>) -> BuildResult<T>;
}

impl<T> ForStage<T> for anyhow::Result<T> {
    fn for_stage(self, ctx: &StageContext<'_>) -> BuildResult<T> {
        self.map_err(|err| ctx.internal(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, Roots};
    use crate::test_support::MockRunner;
    use std::path::PathBuf;

    fn fixture() -> (UnitSpec, UnitLayout, BuildSettings, MockRunner, Shell) {
        let spec = UnitSpec::new("Alpha", "1.0").depends_on(["Beta"]);
        let layout = UnitLayout::new(
            &Roots::under(Path::new("/tp")),
            "Alpha",
            PathBuf::from("/tp/src/Alpha/alpha-1.0"),
        );
        (spec, layout, BuildSettings::default(), MockRunner::new(), Shell::quiet())
    }

    #[test]
    fn test_info_mut_only_during_stage() {
        let (spec, layout, settings, runner, shell) = fixture();
        let mut ctx = StageContext::new(
            &spec,
            Stage::Compile,
            &layout,
            &settings,
            &runner,
            &shell,
            BuildInfo::new(),
            &[],
        );
        let err = ctx.info_mut().unwrap_err();
        assert!(matches!(err, BuildError::Internal { stage: Stage::Compile, .. }));

        let mut ctx = StageContext::new(
            &spec,
            Stage::Stage,
            &layout,
            &settings,
            &runner,
            &shell,
            BuildInfo::new(),
            &[],
        );
        ctx.info_mut().unwrap().push(Category::LinkLibraryNames, "alpha");
        assert_eq!(ctx.into_info().link_library_names(), ["alpha".to_string()]);
    }

    #[test]
    fn test_dependency_lookup() {
        let (spec, layout, settings, runner, shell) = fixture();
        let mut beta = BuildInfo::new();
        beta.push(Category::IncludePaths, "/tp/pkg/Beta/include");
        let deps = vec![("Beta".to_string(), beta)];

        let ctx = StageContext::new(
            &spec,
            Stage::Compile,
            &layout,
            &settings,
            &runner,
            &shell,
            BuildInfo::new(),
            &deps,
        );

        assert_eq!(
            ctx.dependency("Beta").unwrap().include_paths(),
            ["/tp/pkg/Beta/include".to_string()]
        );
        assert!(ctx.find_dependency("Gamma").is_none());
        assert!(matches!(
            ctx.dependency("Gamma").unwrap_err(),
            BuildError::MissingDependency { ref dependency, .. } if dependency == "Gamma"
        ));
    }

    #[test]
    fn test_elevated_command_refused_without_permission() {
        let (spec, layout, settings, runner, shell) = fixture();
        let ctx = StageContext::new(
            &spec,
            Stage::Stage,
            &layout,
            &settings,
            &runner,
            &shell,
            BuildInfo::new(),
            &[],
        );

        let err = ctx
            .run(ProcessBuilder::shell("make install").elevated())
            .unwrap_err();
        assert!(matches!(err, BuildError::Permission { ref operation, .. } if operation == "sudo make install"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_failed_command_maps_to_stage_error() {
        let (spec, layout, settings, runner, shell) = fixture();
        let runner = runner.fail_on("make", 2);
        let ctx = StageContext::new(
            &spec,
            Stage::Compile,
            &layout,
            &settings,
            &runner,
            &shell,
            BuildInfo::new(),
            &[],
        );

        let err = ctx.sh("make -j1").unwrap_err();
        assert!(matches!(
            err,
            BuildError::BuildTool { ref unit, code: Some(2), .. } if unit == "Alpha"
        ));
        assert_eq!(runner.calls()[0].cwd, Some(PathBuf::from("/tp/build/Alpha")));
    }
}

//! Implementation of `stevedore get`: fetch, compile, stage and verify a set
//! of units and their dependencies, writing the Info Record as units stage.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::builder::context::{BuildSettings, StageContext};
use crate::core::{BuildError, BuildInfo, BuildResult, Roots, Stage, UnitLayout, UnitStatus};
use crate::graph::{UnitGraph, UnitRegistry};
use crate::record::InfoRecord;
use crate::util::config::{Config, INFO_RECORD_FILE};
use crate::util::fs::reset_dir;
use crate::util::process::CommandRunner;
use crate::util::shell::{format_duration, Shell, Status};

/// What one run did.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Units that staged, in the order their record lines were written.
    pub staged: Vec<String>,
    /// Units whose Verify passed.
    pub verified: Vec<String>,
    /// Final status of every unit in the run's graph.
    pub statuses: BTreeMap<String, UnitStatus>,
    pub record: PathBuf,
    pub elapsed: Duration,
}

/// Mutable bookkeeping of one run, shared by the scheduler's workers.
struct RunState {
    graph: UnitGraph,
    status: Mutex<HashMap<String, UnitStatus>>,
    staged: Mutex<Vec<(String, BuildInfo)>>,
    record: Mutex<InfoRecord>,
}

impl RunState {
    fn status(&self, name: &str) -> UnitStatus {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    fn staged_info(&self, name: &str) -> Option<BuildInfo> {
        self.staged
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, info)| info.clone())
    }
}

/// Drives units through their lifecycle.
///
/// The engine owns the folder resets: the build folder before Compile and
/// the stage folder before Stage. Recipes never delete either.
pub struct Engine {
    registry: UnitRegistry,
    settings: BuildSettings,
    roots: Roots,
    record_path: PathBuf,
    runner: Arc<dyn CommandRunner>,
    shell: Shell,
    last_statuses: Mutex<BTreeMap<String, UnitStatus>>,
}

impl Engine {
    pub fn new(
        registry: UnitRegistry,
        settings: BuildSettings,
        roots: Roots,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let record_path = roots.stage.join(INFO_RECORD_FILE);
        Engine {
            registry,
            settings,
            roots,
            record_path,
            runner,
            shell: Shell::default(),
            last_statuses: Mutex::new(BTreeMap::new()),
        }
    }

    /// Engine for a validated configuration.
    pub fn from_config(config: &Config, runner: Arc<dyn CommandRunner>, shell: Shell) -> Result<Self> {
        config.validate()?;
        let registry = UnitRegistry::with_config(config)?;
        Ok(Engine::new(registry, BuildSettings::from_config(config), config.roots(), runner)
            .with_record_path(config.info_record_path())
            .with_shell(shell))
    }

    pub fn with_record_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.record_path = path.into();
        self
    }

    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    pub fn roots(&self) -> &Roots {
        &self.roots
    }

    pub fn record_path(&self) -> &Path {
        &self.record_path
    }

    /// Status of every unit after the most recent run, including one that
    /// failed.
    pub fn last_statuses(&self) -> BTreeMap<String, UnitStatus> {
        self.last_statuses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get one unit.
    pub fn get(&self, name: &str, fetch: bool) -> Result<RunReport> {
        self.run(&[name], fetch)
    }

    /// One top-level run over `units`.
    ///
    /// The Info Record is truncated once, then every unit that stages
    /// appends to it. Each requested unit is fetched (with its whole
    /// subtree, when `fetch` is set), compiled and staged after its
    /// dependencies, and verified. The first failure aborts the run; the
    /// failing unit and every unit waiting on it end up `Failed`.
    pub fn run<S: AsRef<str>>(&self, units: &[S], fetch: bool) -> Result<RunReport> {
        let start = Instant::now();
        let graph = UnitGraph::build(&self.registry, units)?;
        let record = InfoRecord::create(&self.record_path)?;

        let state = RunState {
            status: Mutex::new(graph.units().map(|u| (u.to_string(), UnitStatus::Created)).collect()),
            graph,
            staged: Mutex::new(Vec::new()),
            record: Mutex::new(record),
        };

        let result = self.run_all(&state, fetch);
        if let Err(err) = &result {
            self.mark_failed(&state, err);
        }

        let statuses: BTreeMap<String, UnitStatus> = state
            .status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, status)| (name.clone(), *status))
            .collect();
        *self.last_statuses.lock().unwrap_or_else(|e| e.into_inner()) = statuses.clone();

        let verified = result?;
        let elapsed = start.elapsed();
        self.shell.status(
            Status::Finished,
            format!("{} in {}", verified.join(", "), format_duration(elapsed)),
        );

        let staged = state
            .staged
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        Ok(RunReport {
            staged,
            verified,
            statuses,
            record: self.record_path.clone(),
            elapsed,
        })
    }

    fn run_all(&self, state: &RunState, fetch: bool) -> BuildResult<Vec<String>> {
        let mut verified = Vec::new();

        for root in state.graph.requested().to_vec() {
            if fetch {
                for name in state.graph.fetch_order(&root) {
                    if state.status(&name) == UnitStatus::Created {
                        self.fetch_unit(state, &name)?;
                    }
                }
            }

            if self.settings.jobs > 1 {
                self.build_waves(state, &root)?;
            } else {
                for name in state.graph.compile_order(&root) {
                    if !state.status(&name).is_staged() {
                        self.build_unit(state, &name)?;
                    }
                }
            }

            if state.status(&root) != UnitStatus::Verified {
                self.verify_unit(state, &root)?;
                verified.push(root);
            }
        }

        Ok(verified)
    }

    /// Compile and stage the dependencies of `root` wave by wave on a
    /// `jobs`-wide pool, then `root` itself.
    fn build_waves(&self, state: &RunState, root: &str) -> BuildResult<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.jobs)
            .build()
            .map_err(|e| BuildError::Internal {
                unit: root.to_string(),
                stage: Stage::Compile,
                source: anyhow::Error::new(e).context("failed to start worker pool"),
            })?;

        for wave in state.graph.waves(root) {
            let pending: Vec<&String> = wave
                .iter()
                .filter(|name| !state.status(name).is_staged())
                .collect();
            tracing::debug!("building wave of {} units", pending.len());

            let results: Vec<BuildResult<()>> = pool.install(|| {
                pending
                    .par_iter()
                    .map(|name| self.build_unit(state, name))
                    .collect()
            });
            for result in results {
                result?;
            }
        }

        if !state.status(root).is_staged() {
            self.build_unit(state, root)?;
        }
        Ok(())
    }

    fn layout(&self, name: &str) -> BuildResult<UnitLayout> {
        self.registry.layout(name, &self.roots)
    }

    /// Staged BuildInfo of everything `name` can reach, direct dependencies
    /// first.
    fn dependency_infos(&self, state: &RunState, name: &str) -> Vec<(String, BuildInfo)> {
        state
            .graph
            .search_order(name)
            .into_iter()
            .filter_map(|dep| state.staged_info(&dep).map(|info| (dep, info)))
            .collect()
    }

    fn advance(&self, state: &RunState, name: &str, stage: Stage, next: UnitStatus) -> BuildResult<()> {
        let mut status = state.status.lock().unwrap_or_else(|e| e.into_inner());
        status
            .entry(name.to_string())
            .or_default()
            .advance(next)
            .map_err(|source| BuildError::Internal {
                unit: name.to_string(),
                stage,
                source,
            })
    }

    fn fetch_unit(&self, state: &RunState, name: &str) -> BuildResult<()> {
        let recipe = self.registry.require(name)?.clone();
        let layout = self.layout(name)?;

        tracing::info!("fetching {}", recipe.spec());
        let mut ctx = StageContext::new(
            recipe.spec(),
            Stage::Fetch,
            &layout,
            &self.settings,
            self.runner.as_ref(),
            &self.shell,
            BuildInfo::new(),
            &[],
        );
        recipe.fetch(&mut ctx)?;
        self.advance(state, name, Stage::Fetch, UnitStatus::Fetched)
    }

    /// Compile then stage one unit whose dependencies are all staged.
    fn build_unit(&self, state: &RunState, name: &str) -> BuildResult<()> {
        let recipe = self.registry.require(name)?.clone();
        let spec = recipe.spec();
        let layout = self.layout(name)?;
        let deps = self.dependency_infos(state, name);

        tracing::info!("compiling {}", spec);
        self.shell.status(Status::Compiling, spec);
        reset_dir(&layout.build)
            .with_context(|| format!("failed to reset build folder of `{}`", name))
            .map_err(|source| BuildError::Internal {
                unit: name.to_string(),
                stage: Stage::Compile,
                source,
            })?;
        let mut ctx = StageContext::new(
            spec,
            Stage::Compile,
            &layout,
            &self.settings,
            self.runner.as_ref(),
            &self.shell,
            BuildInfo::new(),
            &deps,
        );
        recipe.compile(&mut ctx)?;
        self.advance(state, name, Stage::Compile, UnitStatus::Compiled)?;

        tracing::info!("staging {}", spec);
        self.shell.status(Status::Staging, spec);
        reset_dir(&layout.stage)
            .with_context(|| format!("failed to reset stage folder of `{}`", name))
            .map_err(|source| BuildError::Internal {
                unit: name.to_string(),
                stage: Stage::Stage,
                source,
            })?;
        let mut ctx = StageContext::new(
            spec,
            Stage::Stage,
            &layout,
            &self.settings,
            self.runner.as_ref(),
            &self.shell,
            BuildInfo::new(),
            &deps,
        );
        recipe.stage(&mut ctx)?;
        let info = ctx.into_info();

        // Append and publish under one lock so record order matches the
        // order dependents can observe.
        {
            let mut record = state.record.lock().unwrap_or_else(|e| e.into_inner());
            record.append(name, &info).map_err(|source| BuildError::Internal {
                unit: name.to_string(),
                stage: Stage::Stage,
                source,
            })?;
            state
                .staged
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push((name.to_string(), info));
        }
        self.advance(state, name, Stage::Stage, UnitStatus::Staged)
    }

    fn verify_unit(&self, state: &RunState, name: &str) -> BuildResult<()> {
        let recipe = self.registry.require(name)?.clone();
        let spec = recipe.spec();
        let layout = self.layout(name)?;
        let deps = self.dependency_infos(state, name);
        let info = state.staged_info(name).unwrap_or_default();

        tracing::info!("verifying {}", spec);
        let mut ctx = StageContext::new(
            spec,
            Stage::Verify,
            &layout,
            &self.settings,
            self.runner.as_ref(),
            &self.shell,
            info,
            &deps,
        );
        recipe.verify(&mut ctx)?;
        self.shell.status(Status::Verified, spec);
        self.advance(state, name, Stage::Verify, UnitStatus::Verified)
    }

    /// Mark the failing unit and every unit that depends on it as failed.
    fn mark_failed(&self, state: &RunState, err: &BuildError) {
        let Some(unit) = err.unit() else {
            return;
        };
        tracing::debug!("{} failed: {}", unit, err);

        let mut status = state.status.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = status.get_mut(unit) {
            if current.can_transition_to(UnitStatus::Failed) {
                *current = UnitStatus::Failed;
            }
        }
        for name in state.graph.ancestors(unit) {
            if let Some(current) = status.get_mut(&name) {
                if !current.is_staged() && current.can_transition_to(UnitStatus::Failed) {
                    *current = UnitStatus::Failed;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::recipe::SmokeTest;
    use crate::core::{Category, SourceLocator};
    use crate::record;
    use crate::test_support::{write_tarball, FixtureRecipe, MockRunner};
    use crate::util::process::{find_cxx_compiler, SystemRunner};
    use std::fs;
    use tempfile::TempDir;

    fn registry(units: Vec<FixtureRecipe>) -> UnitRegistry {
        let mut registry = UnitRegistry::new();
        for unit in units {
            registry.register(Arc::new(unit));
        }
        registry
    }

    fn engine(tmp: &TempDir, registry: UnitRegistry, runner: Arc<dyn CommandRunner>) -> Engine {
        Engine::new(
            registry,
            BuildSettings::default(),
            Roots::under(tmp.path()),
            runner,
        )
        .with_shell(Shell::quiet())
    }

    fn lib_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|l| l.contains("_LinkLibraryNames :"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_header_only_unit_without_fetch() {
        let tmp = TempDir::new().unwrap();
        let roots = Roots::under(tmp.path());
        let tree = roots.src.join("Eigen/eigen-3.4.0");
        fs::create_dir_all(tree.join("Eigen")).unwrap();
        fs::write(tree.join("Eigen/Core"), "// core\n").unwrap();

        let runner = Arc::new(MockRunner::new());
        let engine = engine(&tmp, UnitRegistry::builtin(), runner.clone());
        let report = engine.get("Eigen", false).unwrap();

        assert!(roots.stage.join("Eigen/include/Eigen/Core").exists());
        assert_eq!(report.verified, ["Eigen"]);
        assert_eq!(report.statuses["Eigen"], UnitStatus::Verified);

        let units = record::read(engine.record_path()).unwrap();
        assert_eq!(units.len(), 1);
        let (name, info) = &units[0];
        assert_eq!(name, "Eigen");
        assert_eq!(
            info.include_paths(),
            [roots.stage.join("Eigen/include").to_string_lossy().into_owned()]
        );
        assert!(info.link_library_names().is_empty());

        // Only the smoke test touches the runner.
        let commands = runner.commands();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].contains("-I"));
    }

    #[test]
    fn test_header_only_unit_with_real_compiler() {
        let Some(cxx) = find_cxx_compiler() else {
            eprintln!("skipping: no C++ compiler on PATH");
            return;
        };

        let tmp = TempDir::new().unwrap();
        let unit = FixtureRecipe::new("Eigen")
            .produces("include/Eigen/Core", "namespace Eigen { inline int three() { return 3; } }\n")
            .smoke_test(SmokeTest::cxx(
                "#include <Eigen/Core>\nint main() { return Eigen::three() == 3 ? 0 : 1; }\n",
            ));
        let engine = Engine::new(
            registry(vec![unit]),
            BuildSettings {
                cxx: cxx.to_string_lossy().into_owned(),
                ..BuildSettings::default()
            },
            Roots::under(tmp.path()),
            Arc::new(SystemRunner::new()),
        )
        .with_shell(Shell::quiet());

        let report = engine.get("Eigen", false).unwrap();
        assert_eq!(report.statuses["Eigen"], UnitStatus::Verified);
    }

    #[test]
    fn test_failing_dependency_stops_dependent() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new().fail_on("make beta", 2));
        let engine = engine(
            &tmp,
            registry(vec![
                FixtureRecipe::new("Alpha").depends_on(&["Beta"]).command("make alpha"),
                FixtureRecipe::new("Beta").command("make beta"),
            ]),
            runner.clone(),
        );

        let err = engine.get("Alpha", false).unwrap_err();
        let err = err.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(
            err,
            BuildError::BuildTool { unit, command, code: Some(2), .. }
                if unit == "Beta" && command == "make beta"
        ));
        assert!(!runner.called("make alpha"));

        let statuses = engine.last_statuses();
        assert_eq!(statuses["Beta"], UnitStatus::Failed);
        assert_eq!(statuses["Alpha"], UnitStatus::Failed);
    }

    #[test]
    fn test_dependency_staged_before_dependent_compiles() {
        let tmp = TempDir::new().unwrap();
        let beta_header = Roots::under(tmp.path()).stage.join("Beta/include/beta.h");
        let probe = beta_header.clone();
        let runner = Arc::new(MockRunner::new().on_contains("make alpha", move |_| {
            if probe.exists() {
                Ok(())
            } else {
                Err(std::io::Error::other("Beta is not staged"))
            }
        }));
        let engine = engine(
            &tmp,
            registry(vec![
                FixtureRecipe::new("Alpha").depends_on(&["Beta"]).command("make alpha"),
                FixtureRecipe::new("Beta")
                    .command("make beta")
                    .produces("include/beta.h", ""),
            ]),
            runner.clone(),
        );

        let report = engine.get("Alpha", false).unwrap();
        assert_eq!(report.staged, ["Beta", "Alpha"]);
        assert_eq!(runner.commands(), ["make beta", "make alpha"]);
        assert!(beta_header.exists());
    }

    #[test]
    fn test_record_order_follows_execution() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(
            &tmp,
            registry(vec![
                FixtureRecipe::new("X").links(&["x1", "x2"]),
                FixtureRecipe::new("Y").links(&["y"]),
            ]),
            Arc::new(MockRunner::new()),
        );

        engine.run(&["X", "Y"], false).unwrap();
        assert_eq!(
            lib_lines(engine.record_path()),
            ["X_LinkLibraryNames : x1 x2", "Y_LinkLibraryNames : y"]
        );

        // A second run truncates first.
        engine.run(&["Y"], false).unwrap();
        assert_eq!(lib_lines(engine.record_path()), ["Y_LinkLibraryNames : y"]);
    }

    #[test]
    fn test_rerun_removes_stale_stage_files() {
        let tmp = TempDir::new().unwrap();
        let roots = Roots::under(tmp.path());
        fs::create_dir_all(roots.stage.join("Alpha/include")).unwrap();
        fs::write(roots.stage.join("Alpha/include/stale.h"), "").unwrap();
        fs::create_dir_all(roots.build.join("Alpha")).unwrap();
        fs::write(roots.build.join("Alpha/stale.o"), "").unwrap();

        let engine = engine(
            &tmp,
            registry(vec![FixtureRecipe::new("Alpha").produces("include/alpha.h", "")]),
            Arc::new(MockRunner::new()),
        );
        engine.get("Alpha", false).unwrap();

        let staged: Vec<_> = walkdir::WalkDir::new(roots.stage.join("Alpha"))
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(staged, ["alpha.h"]);
        assert!(!roots.build.join("Alpha/stale.o").exists());
    }

    #[test]
    fn test_repeated_runs_give_identical_build_info() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(
            &tmp,
            registry(vec![FixtureRecipe::new("Solo")
                .links(&["solo"])
                .produces("include/solo.h", "")
                .produces("lib/libsolo.a", "")]),
            Arc::new(MockRunner::new()),
        );

        engine.get("Solo", false).unwrap();
        let first = record::read(engine.record_path()).unwrap();
        engine.get("Solo", false).unwrap();
        let second = record::read(engine.record_path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].1.get(Category::LibPaths).len(), 1);
    }

    #[test]
    fn test_shared_dependency_built_once() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        let engine = engine(
            &tmp,
            registry(vec![
                FixtureRecipe::new("App").depends_on(&["Left", "Right"]),
                FixtureRecipe::new("Left").depends_on(&["Base"]),
                FixtureRecipe::new("Right").depends_on(&["Base"]),
                FixtureRecipe::new("Base").command("make base"),
            ]),
            runner.clone(),
        );

        let report = engine.get("App", false).unwrap();
        assert_eq!(report.staged, ["Base", "Left", "Right", "App"]);
        assert_eq!(runner.commands(), ["make base"]);
    }

    #[test]
    fn test_parallel_waves() {
        let tmp = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        let engine = Engine::new(
            registry(vec![
                FixtureRecipe::new("App").depends_on(&["Left", "Right"]).command("make app"),
                FixtureRecipe::new("Left").depends_on(&["Base"]).command("make left"),
                FixtureRecipe::new("Right").depends_on(&["Base"]).command("make right"),
                FixtureRecipe::new("Base").command("make base"),
            ]),
            BuildSettings {
                jobs: 4,
                ..BuildSettings::default()
            },
            Roots::under(tmp.path()),
            runner.clone(),
        )
        .with_shell(Shell::quiet());

        let report = engine.get("App", false).unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands.first().map(String::as_str), Some("make base"));
        assert_eq!(commands.last().map(String::as_str), Some("make app"));
        assert_eq!(report.staged.first().map(String::as_str), Some("Base"));
        assert_eq!(report.staged.last().map(String::as_str), Some("App"));
        assert!(report.statuses.values().all(|s| s.is_staged()));
    }

    #[test]
    fn test_fetch_unpacks_archive_before_compile() {
        let tmp = TempDir::new().unwrap();
        let tarball = tmp.path().join("mirror/tiny-1.0.tar.gz");
        fs::create_dir_all(tarball.parent().unwrap()).unwrap();
        write_tarball(&tarball, &[("tiny-1.0/include/tiny.h", "#pragma once\n")]);

        let unit = FixtureRecipe::new("Tiny")
            .source(SourceLocator::archive(tarball.to_str().unwrap(), "tiny-1.0"));
        let engine = engine(&tmp, registry(vec![unit]), Arc::new(MockRunner::new()));

        let report = engine.get("Tiny", true).unwrap();

        let roots = Roots::under(tmp.path());
        assert!(roots.build.join("Tiny/include/tiny.h").exists());
        assert!(roots.stage.join("Tiny/include/tiny.h").exists());
        assert_eq!(report.statuses["Tiny"], UnitStatus::Verified);
    }

    #[test]
    fn test_unfetched_archive_fails_without_fetch() {
        let tmp = TempDir::new().unwrap();
        let unit = FixtureRecipe::new("Zlib")
            .source(SourceLocator::archive("https://zlib.net/zlib-1.3.1.tar.gz", "zlib-1.3.1"))
            .links(&["z"]);
        let engine = engine(&tmp, registry(vec![unit]), Arc::new(MockRunner::new()));

        let err = engine.get("Zlib", false).unwrap_err();
        let err = err.downcast_ref::<BuildError>().unwrap();
        assert!(matches!(err, BuildError::SourceFetch { unit, .. } if unit == "Zlib"));
        assert_eq!(engine.last_statuses()["Zlib"], UnitStatus::Failed);

        let record = Roots::under(tmp.path()).stage.join("third_party_info");
        assert!(lib_lines(&record).is_empty());
    }

    #[test]
    fn test_config_unit_escaping_its_folder_is_refused() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.root = Some(tmp.path().join("tp"));
        config
            .units
            .insert("..".to_string(), crate::util::config::ScriptUnitConfig::default());
        let keep = tmp.path().join("tp/src/Eigen/eigen-3.4.0/keep.txt");
        fs::create_dir_all(keep.parent().unwrap()).unwrap();
        fs::write(&keep, "keep").unwrap();

        let result = Engine::from_config(&config, Arc::new(MockRunner::new()), Shell::quiet());
        assert!(result.is_err());
        assert!(keep.exists());
    }

    #[test]
    fn test_unknown_unit() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp, UnitRegistry::new(), Arc::new(MockRunner::new()));
        let err = engine.get("Nope", false).unwrap_err();
        assert_eq!(err.to_string(), "unknown unit `Nope`");
    }
}

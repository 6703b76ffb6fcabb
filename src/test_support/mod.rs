//! Test utilities and mocks for stevedore unit tests.
//!
//! [`MockRunner`] stands in for the process runner so lifecycle code can be
//! exercised without any build tools installed. [`FixtureRecipe`] is a unit
//! whose stages are fully described by the test.
//!
//! ```rust,ignore
//! let runner = MockRunner::new().fail_on("make", 2);
//! let recipe = FixtureRecipe::new("Alpha").command("make").produces("include/alpha.h", "");
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::builder::context::{ForStage, StageContext};
use crate::builder::recipe::{Recipe, SmokeTest};
use crate::core::{BuildResult, SourceLocator, UnitSpec};
use crate::util::process::{CommandRunner, ProcessBuilder, ProcessError};

/// Pattern for matching commands in [`MockRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match using a regex pattern.
    Regex(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Regex(pattern) => regex::Regex::new(pattern)
                .map(|re| re.is_match(cmd))
                .unwrap_or(false),
            CommandPattern::Any => true,
        }
    }
}

type SideEffect = Box<dyn Fn(&ProcessBuilder) -> io::Result<()> + Send + Sync>;

/// What the mock does when a command matches.
struct Expectation {
    pattern: CommandPattern,
    exit_code: Option<i32>,
    stderr: String,
    effect: Option<SideEffect>,
}

/// A command the mock was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

/// Recording [`CommandRunner`].
///
/// Every command succeeds unless an expectation says otherwise. The first
/// matching expectation wins.
#[derive(Default)]
pub struct MockRunner {
    expectations: Vec<Expectation>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner::default()
    }

    /// Fail commands containing `substring` with `code`.
    pub fn fail_on(self, substring: &str, code: i32) -> Self {
        self.fail_matching(CommandPattern::Contains(substring.to_string()), code)
    }

    /// Fail commands matching `pattern` with `code`.
    pub fn fail_matching(mut self, pattern: CommandPattern, code: i32) -> Self {
        self.expectations.push(Expectation {
            pattern,
            exit_code: Some(code),
            stderr: format!("mock failure (exit {})", code),
            effect: None,
        });
        self
    }

    /// Run `effect` when a command containing `substring` is executed.
    ///
    /// Used to emulate the files an external tool would produce.
    pub fn on_contains<F>(mut self, substring: &str, effect: F) -> Self
    where
        F: Fn(&ProcessBuilder) -> io::Result<()> + Send + Sync + 'static,
    {
        self.expectations.push(Expectation {
            pattern: CommandPattern::Contains(substring.to_string()),
            exit_code: None,
            stderr: String::new(),
            effect: Some(Box::new(effect)),
        });
        self
    }

    /// Every recorded call, in execution order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded command lines, in execution order.
    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }

    /// Whether any recorded command contains `substring`.
    pub fn called(&self, substring: &str) -> bool {
        self.calls().iter().any(|c| c.command.contains(substring))
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<(), ProcessError> {
        let command = cmd.display_command();
        self.calls.lock().unwrap().push(RecordedCall {
            command: command.clone(),
            cwd: cmd.get_cwd().map(Path::to_path_buf),
            env: cmd.get_env().clone(),
        });

        let Some(exp) = self.expectations.iter().find(|e| e.pattern.matches(&command)) else {
            return Ok(());
        };

        if let Some(effect) = &exp.effect {
            effect(cmd).map_err(|source| ProcessError::Spawn {
                command: command.clone(),
                source,
            })?;
        }

        match exp.exit_code {
            Some(code) if code != 0 => Err(ProcessError::Failed {
                command,
                code: Some(code),
                stderr: exp.stderr.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// A unit whose lifecycle is scripted by the test.
///
/// Compile runs each [`command`](Self::command) as a shell line in the build
/// folder and then writes every [`produces`](Self::produces) file there. Stage
/// and Verify use the defaults.
pub struct FixtureRecipe {
    spec: UnitSpec,
    commands: Vec<String>,
    outputs: Vec<(PathBuf, String)>,
    smoke_test: Option<SmokeTest>,
}

impl FixtureRecipe {
    pub fn new(name: &str) -> Self {
        FixtureRecipe {
            spec: UnitSpec::new(name, "1.0"),
            commands: Vec::new(),
            outputs: Vec::new(),
            smoke_test: None,
        }
    }

    pub fn depends_on(mut self, deps: &[&str]) -> Self {
        self.spec = self.spec.depends_on(deps.iter().copied());
        self
    }

    pub fn links(mut self, libs: &[&str]) -> Self {
        self.spec = self.spec.links(libs.iter().copied());
        self
    }

    pub fn source(mut self, source: SourceLocator) -> Self {
        self.spec = self.spec.source(source);
        self
    }

    pub fn command(mut self, line: &str) -> Self {
        self.commands.push(line.to_string());
        self
    }

    pub fn produces(mut self, path: &str, contents: &str) -> Self {
        self.outputs.push((PathBuf::from(path), contents.to_string()));
        self
    }

    pub fn smoke_test(mut self, test: SmokeTest) -> Self {
        self.smoke_test = Some(test);
        self
    }
}

impl Recipe for FixtureRecipe {
    fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    fn compile(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        crate::builder::defaults::compile(ctx)?;
        for line in &self.commands {
            ctx.sh(line.as_str())?;
        }
        for (path, contents) in &self.outputs {
            let path = ctx.layout().build.join(path);
            if let Some(parent) = path.parent() {
                crate::util::fs::ensure_dir(parent).for_stage(ctx)?;
            }
            crate::util::fs::write_string(&path, contents).for_stage(ctx)?;
        }
        Ok(())
    }

    fn smoke_test(&self) -> Option<SmokeTest> {
        self.smoke_test.clone()
    }
}

/// Write a gzip tarball holding `files` (path, contents).
pub fn write_tarball(path: &Path, files: &[(&str, &str)]) {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_pattern() {
        assert!(CommandPattern::Exact("make".into()).matches("make"));
        assert!(!CommandPattern::Exact("make".into()).matches("make -j4"));
        assert!(CommandPattern::StartsWith("cmake".into()).matches("cmake --build ."));
        assert!(CommandPattern::Regex(r"^make -j\d+$".into()).matches("make -j8"));
        assert!(CommandPattern::Any.matches("anything"));
    }

    #[test]
    fn test_mock_runner_records_and_fails() {
        let runner = MockRunner::new().fail_on("make check", 2);

        runner
            .run(&ProcessBuilder::shell("./configure").cwd("/b"))
            .unwrap();
        let err = runner.run(&ProcessBuilder::shell("make check")).unwrap_err();

        assert_eq!(err.code(), Some(2));
        assert_eq!(runner.commands(), vec!["./configure", "make check"]);
        assert_eq!(runner.calls()[0].cwd, Some(PathBuf::from("/b")));
        assert!(runner.called("configure"));
    }

    #[test]
    fn test_mock_runner_side_effect() {
        let tmp = tempfile::TempDir::new().unwrap();
        let marker = tmp.path().join("marker");
        let target = marker.clone();
        let runner = MockRunner::new().on_contains("touch", move |_| std::fs::write(&target, ""));

        runner.run(&ProcessBuilder::shell("touch marker")).unwrap();
        assert!(marker.exists());
    }
}

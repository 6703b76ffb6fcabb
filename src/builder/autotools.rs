//! `./configure && make` driver.

use std::path::{Path, PathBuf};

use crate::builder::context::StageContext;
use crate::core::BuildResult;
use crate::util::process::ProcessBuilder;

/// An autotools-style project.
///
/// `configure_dir` is where the `configure` script lives; `work_dir` is where
/// it is run and where `make` runs afterwards. They differ for projects
/// built out of tree (`mkdir Build && cd Build && ../configure`).
#[derive(Debug, Clone)]
pub struct Autotools {
    configure_dir: PathBuf,
    work_dir: PathBuf,
    prefix: Option<PathBuf>,
    args: Vec<String>,
}

impl Autotools {
    /// In-tree build.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Autotools {
            configure_dir: dir.clone(),
            work_dir: dir,
            prefix: None,
            args: Vec::new(),
        }
    }

    /// Out-of-tree build in `work_dir`.
    pub fn out_of_tree(configure_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Autotools {
            configure_dir: configure_dir.into(),
            work_dir: work_dir.into(),
            prefix: None,
            args: Vec::new(),
        }
    }

    /// Pass `--prefix=<prefix>`.
    pub fn prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Extra `configure` argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn configure_command(&self) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(self.configure_dir.join("configure")).cwd(&self.work_dir);
        if let Some(prefix) = &self.prefix {
            cmd = cmd.arg(format!("--prefix={}", prefix.display()));
        }
        cmd.args(&self.args)
    }

    /// `make -j<jobs> <targets>`.
    pub fn make_command(&self, jobs: usize, targets: &[&str]) -> ProcessBuilder {
        ProcessBuilder::new("make")
            .arg(format!("-j{}", jobs))
            .args(targets)
            .cwd(&self.work_dir)
    }

    /// Create the work directory and run `configure`.
    pub fn configure(&self, ctx: &StageContext<'_>) -> BuildResult<()> {
        std::fs::create_dir_all(&self.work_dir)
            .map_err(|e| ctx.internal(anyhow::Error::new(e).context(format!(
                "failed to create {}",
                self.work_dir.display()
            ))))?;
        ctx.run(self.configure_command())
    }

    pub fn make(&self, ctx: &StageContext<'_>, targets: &[&str]) -> BuildResult<()> {
        ctx.run(self.make_command(ctx.jobs(), targets))
    }

    /// `make install`, through `sudo` when `elevated` is set.
    pub fn install(&self, ctx: &StageContext<'_>, elevated: bool) -> BuildResult<()> {
        let cmd = ProcessBuilder::new("make").arg("install").cwd(&self.work_dir);
        ctx.run(if elevated { cmd.elevated() } else { cmd })
    }
}

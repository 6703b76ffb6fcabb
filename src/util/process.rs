//! Subprocess execution.
//!
//! Every external tool a unit touches (downloaders, configure scripts, make,
//! the smoke-test compiler) goes through [`ProcessBuilder`] and a
//! [`CommandRunner`]. Execution is synchronous: a call blocks until the child
//! exits, and a non-zero exit becomes a [`ProcessError`] carrying the full
//! command line. There is no retry and no timeout.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use thiserror::Error;

/// Number of trailing stderr lines kept on a failed, captured command.
const STDERR_TAIL_LINES: usize = 20;

/// Error raised by a failed external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{command}` (is it installed and on PATH?)")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with {}", describe_code(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ProcessError {
    /// The command line that failed.
    pub fn command(&self) -> &str {
        match self {
            ProcessError::Spawn { command, .. } | ProcessError::Failed { command, .. } => command,
        }
    }

    /// Exit code, if the process ran and exited normally.
    pub fn code(&self) -> Option<i32> {
        match self {
            ProcessError::Spawn { .. } => None,
            ProcessError::Failed { code, .. } => *code,
        }
    }

    /// Captured stderr tail (empty when output was not captured).
    pub fn stderr(&self) -> &str {
        match self {
            ProcessError::Spawn { .. } => "",
            ProcessError::Failed { stderr, .. } => stderr,
        }
    }
}

/// Render an exit code for messages.
pub fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal or never started)".to_string(),
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
    shell_line: Option<String>,
    elevated: bool,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
            shell_line: None,
            elevated: false,
        }
    }

    /// Run a full command line through `sh -c`.
    ///
    /// Vendored build scripts are usually written as shell snippets
    /// (`./configure --prefix=... && make`), so this is the form most
    /// recipes use.
    pub fn shell(command_line: impl Into<String>) -> Self {
        let line = command_line.into();
        let mut builder = ProcessBuilder::new("sh").arg("-c").arg(&line);
        builder.shell_line = Some(line);
        builder
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Run the command through `sudo`.
    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    /// Whether the command needs elevated privileges.
    pub fn is_elevated(&self) -> bool {
        self.elevated
    }

    /// Get the working directory, if set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Get the environment overrides.
    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    fn build_command(&self) -> Command {
        let mut cmd = if self.elevated {
            let mut cmd = Command::new("sudo");
            cmd.arg(&self.program);
            cmd
        } else {
            Command::new(&self.program)
        };
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute with captured output and wait for completion.
    pub fn exec(&self) -> Result<Output, ProcessError> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.output().map_err(|source| ProcessError::Spawn {
            command: self.display_command(),
            source,
        })
    }

    /// Execute with captured output and require success.
    pub fn exec_and_check(&self) -> Result<Output, ProcessError> {
        let output = self.exec()?;
        if !output.status.success() {
            return Err(ProcessError::Failed {
                command: self.display_command(),
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(output)
    }

    /// Execute with inherited stdio and require success.
    pub fn status_and_check(&self) -> Result<(), ProcessError> {
        let mut cmd = self.build_command();
        let status = cmd.status().map_err(|source| ProcessError::Spawn {
            command: self.display_command(),
            source,
        })?;

        if !status.success() {
            return Err(ProcessError::Failed {
                command: self.display_command(),
                code: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let base = match self.shell_line {
            Some(ref line) => line.clone(),
            None => {
                let mut parts = vec![self.program.display().to_string()];
                parts.extend(self.args.iter().cloned());
                parts.join(" ")
            }
        };

        if self.elevated {
            format!("sudo {}", base)
        } else {
            base
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Executes commands on behalf of a unit.
///
/// The engine never spawns processes directly; it hands every command to a
/// runner so tests can substitute a recording mock.
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion, failing on a non-zero exit.
    fn run(&self, cmd: &ProcessBuilder) -> Result<(), ProcessError>;
}

/// Runner that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    inherit_output: bool,
}

impl SystemRunner {
    /// Runner that captures child output and reports the stderr tail on failure.
    pub fn new() -> Self {
        SystemRunner {
            inherit_output: false,
        }
    }

    /// Stream child output straight to the terminal instead of capturing it.
    pub fn inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &ProcessBuilder) -> Result<(), ProcessError> {
        tracing::debug!("running `{}`", cmd.display_command());
        if self.inherit_output {
            cmd.status_and_check()
        } else {
            cmd.exec_and_check().map(|_| ())
        }
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find a C++ compiler, honouring `CXX`.
pub fn find_cxx_compiler() -> Option<PathBuf> {
    if let Ok(cxx) = std::env::var("CXX") {
        if let Some(path) = find_executable(&cxx) {
            return Some(path);
        }
    }

    for compiler in &["c++", "g++", "clang++"] {
        if let Some(path) = find_executable(compiler) {
            return Some(path);
        }
    }

    None
}

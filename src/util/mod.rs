//! Utility modules.

pub mod config;
pub mod fs;
pub mod patch;
pub mod process;
pub mod shell;

pub use config::Config;
pub use patch::{patch_file, Patch};
pub use process::{CommandRunner, ProcessBuilder, ProcessError, SystemRunner};
pub use shell::{Shell, Status};

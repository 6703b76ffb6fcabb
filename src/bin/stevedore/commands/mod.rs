//! Command implementations

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::GlobalArgs;
use stevedore::util::config::{global_config_path, load_config, Config, PROJECT_CONFIG_FILE};
use stevedore::util::shell::Shell;

pub mod bundle;
pub mod clean;
pub mod completions;
pub mod flags;
pub mod get;
pub mod info;
pub mod list;
pub mod tree;

/// Configuration and output shared by every command.
pub struct Session {
    pub config: Config,
    pub shell: Shell,
}

impl Session {
    /// Load the global and project configuration, then apply `--root`.
    pub fn new(global: &GlobalArgs) -> Result<Self> {
        let project = global
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
        if global.config.is_some() && !project.exists() {
            anyhow::bail!("config file {} does not exist", project.display());
        }

        let mut config = load_config(global_config_path().as_deref(), &project)?;
        if let Some(root) = &global.root {
            config.paths.root = Some(root.clone());
        }
        tracing::debug!("roots: {:?}", config.roots());

        Ok(Session {
            config,
            shell: Shell::from_flags(global.quiet, global.verbose, global.color),
        })
    }
}

//! Implementation of `stevedore clean`.

use std::path::PathBuf;

use anyhow::Result;

use crate::core::Roots;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove the build root, and with `all` the source and stage roots too.
///
/// Returns the directories that existed and were removed.
pub fn clean(roots: &Roots, all: bool) -> Result<Vec<PathBuf>> {
    let mut targets = vec![&roots.build];
    if all {
        targets.push(&roots.src);
        targets.push(&roots.stage);
    }

    let mut removed = Vec::new();
    for dir in targets {
        if dir.exists() {
            tracing::info!("removing {}", dir.display());
            remove_dir_all_if_exists(dir)?;
            removed.push(dir.clone());
        }
    }
    Ok(removed)
}

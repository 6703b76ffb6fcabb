//! Git checkouts.

use std::path::Path;

use anyhow::{Context, Result};
use git2::{Repository, ResetType};

/// Clone `url` into `dest` and hard-reset to `rev`.
///
/// `rev` may be a commit hash, a tag or a remote branch name; the default
/// branch is used when it is `None`. Returns the checked-out commit id.
pub fn clone(url: &str, rev: Option<&str>, dest: &Path) -> Result<String> {
    tracing::info!("cloning {}", url);

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let repo = Repository::clone(url, dest).with_context(|| format!("failed to clone {}", url))?;

    let commit = match rev {
        None => repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .with_context(|| format!("{} has no default branch", url))?,
        Some(rev) => repo
            .revparse_single(rev)
            .or_else(|_| repo.revparse_single(&format!("origin/{}", rev)))
            .and_then(|object| object.peel_to_commit())
            .with_context(|| format!("revision `{}` not found in {}", rev, url))?,
    };

    repo.reset(commit.as_object(), ResetType::Hard, None)
        .with_context(|| format!("failed to check out {}", commit.id()))?;

    Ok(commit.id().to_string())
}

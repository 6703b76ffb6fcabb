//! Default stage implementations.
//!
//! Recipes reach these through the [`Recipe`](super::recipe::Recipe) default
//! methods, or call them from an override to extend the default behavior.

use std::path::Path;

use crate::builder::context::{ForStage, StageContext};
use crate::builder::recipe::{SmokeTest, StageArtifact};
use crate::builder::smoke;
use crate::core::{BuildError, BuildResult, Category, SourceLocator};
use crate::sources::{archive, git, ArchiveKind};
use crate::util::fs::{copy_dir_all, copy_path, reset_dir};
use crate::util::shell::Status;

fn fetch_error(ctx: &StageContext<'_>, err: anyhow::Error) -> BuildError {
    BuildError::SourceFetch {
        unit: ctx.name().to_string(),
        message: format!("{:#}", err),
    }
}

/// Download and unpack archive or git sources into `<src_root>/<name>`.
///
/// The unit's source folder is deleted first. After unpacking, the expected
/// source tree must exist. Nested, local and empty locators are left alone.
pub fn fetch(ctx: &mut StageContext<'_>) -> BuildResult<()> {
    let layout = ctx.layout().clone();

    match ctx.spec().source.clone() {
        SourceLocator::Archive {
            url,
            archive_name,
            sha256,
            ..
        } => {
            ctx.status(Status::Fetching, &url);
            reset_dir(&layout.src).map_err(|e| fetch_error(ctx, e))?;

            let archive_path = layout.src.join(&archive_name);
            archive::download(&url, &archive_path, ctx.shell())
                .map_err(|e| fetch_error(ctx, e))?;

            if let Some(expected) = &sha256 {
                archive::verify_checksum(&archive_path, expected)
                    .map_err(|e| fetch_error(ctx, e))?;
            }

            let kind = ArchiveKind::detect(&archive_name, &url).ok_or_else(|| {
                fetch_error(
                    ctx,
                    anyhow::anyhow!("cannot tell the archive format of `{}`", archive_name),
                )
            })?;
            match kind.extract_command(&archive_path, &layout.src) {
                Some(cmd) => ctx.run(cmd)?,
                None => archive::extract_tar_gz(&archive_path, &layout.src)
                    .map_err(|e| fetch_error(ctx, e))?,
            }
        }
        SourceLocator::Git { url, rev, .. } => {
            ctx.status(Status::Fetching, &url);
            reset_dir(&layout.src).map_err(|e| fetch_error(ctx, e))?;
            let commit = git::clone(&url, rev.as_deref(), &layout.source_tree)
                .map_err(|e| fetch_error(ctx, e))?;
            tracing::info!("{} checked out at {}", ctx.name(), commit);
        }
        SourceLocator::Local { .. } | SourceLocator::Nested { .. } | SourceLocator::None => {
            return Ok(());
        }
    }

    ensure_source_tree(ctx)
}

/// Fail with a fetch error unless the unit's source tree exists.
pub fn ensure_source_tree(ctx: &StageContext<'_>) -> BuildResult<()> {
    let tree = &ctx.layout().source_tree;
    if !tree.is_dir() {
        return Err(BuildError::SourceFetch {
            unit: ctx.name().to_string(),
            message: format!("expected source directory {} does not exist", tree.display()),
        });
    }
    Ok(())
}

/// Copy the source tree into the (already reset) build folder.
///
/// Units without a source locator may have no tree at all; every other unit
/// must have been fetched (or point at an existing directory).
pub fn compile(ctx: &mut StageContext<'_>) -> BuildResult<()> {
    let layout = ctx.layout();
    if ctx.spec().source == SourceLocator::None && !layout.source_tree.is_dir() {
        tracing::debug!("{} has no sources; nothing to copy", ctx.name());
        return Ok(());
    }
    ensure_source_tree(ctx)?;
    copy_dir_all(&layout.source_tree, &layout.build).for_stage(ctx)
}

/// Copy `artifacts` from the build folder into the stage folder, then
/// [`describe`] the result.
pub fn stage(artifacts: &[StageArtifact], ctx: &mut StageContext<'_>) -> BuildResult<()> {
    copy_artifacts(artifacts, ctx)?;
    describe(ctx)
}

/// Copy `artifacts` from the build folder into the stage folder.
pub fn copy_artifacts(artifacts: &[StageArtifact], ctx: &StageContext<'_>) -> BuildResult<()> {
    copy_artifacts_from(&ctx.layout().build, artifacts, ctx)
}

/// Copy `artifacts`, relative to `root`, into the stage folder.
pub fn copy_artifacts_from(
    root: &Path,
    artifacts: &[StageArtifact],
    ctx: &StageContext<'_>,
) -> BuildResult<()> {
    let layout = ctx.layout();

    for artifact in artifacts {
        let from = root.join(&artifact.from);
        if !from.exists() {
            if artifact.required {
                return Err(BuildError::Staging {
                    unit: ctx.name().to_string(),
                    path: from,
                });
            }
            continue;
        }

        let to = layout.stage.join(&artifact.to);
        tracing::debug!("staging {} -> {}", from.display(), to.display());
        copy_path(&from, &to).for_stage(ctx)?;
    }

    Ok(())
}

/// Record the canonical stage folders that exist, plus the declared link
/// libraries, in the unit's BuildInfo.
pub fn describe(ctx: &mut StageContext<'_>) -> BuildResult<()> {
    let layout = ctx.layout().clone();
    let libs = ctx.spec().link_libraries.clone();

    let info = ctx.info_mut()?;
    for (dir, category) in [
        (layout.include_dir(), Category::IncludePaths),
        (layout.lib_dir(), Category::LibPaths),
        (layout.bin_dir(), Category::BinPaths),
        (layout.doc_dir(), Category::DocPaths),
    ] {
        if dir.is_dir() && !info.get(category).contains(&path_string(&dir)) {
            info.push(category, path_string(&dir));
        }
    }
    for lib in libs {
        if !info.link_library_names().contains(&lib) {
            info.push(Category::LinkLibraryNames, lib);
        }
    }

    Ok(())
}

/// Run the smoke test, if any.
pub fn verify(test: Option<&SmokeTest>, ctx: &mut StageContext<'_>) -> BuildResult<()> {
    match test {
        Some(test) => smoke::run(test, ctx),
        None => {
            tracing::debug!("{} has no smoke test", ctx.name());
            Ok(())
        }
    }
}

/// Render a path the way it is stored in a BuildInfo.
pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

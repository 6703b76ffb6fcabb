//! Implementation of `stevedore bundle`: copy the shared libraries listed in
//! the Info Record next to a downstream program.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::BuildInfo;
use crate::record;
use crate::util::fs::{copy_file, ensure_dir, glob_files};

/// Result of a bundle run.
#[derive(Debug, Clone, Default)]
pub struct BundleResult {
    /// Files written into the destination
    pub copied: Vec<PathBuf>,

    /// `(unit, library)` pairs with no shared library in any LibPaths entry
    pub missing: Vec<(String, String)>,
}

/// File name patterns of the shared library `name` on this platform:
/// `libfoo.so`, `libfoo.so.1`, `libfoo.1.dylib`.
pub fn library_patterns(name: &str) -> Vec<String> {
    let escaped = glob::Pattern::escape(name);
    vec![
        format!("{}{}{}*", DLL_PREFIX, escaped, DLL_SUFFIX),
        format!("{}{}.*{}", DLL_PREFIX, escaped, DLL_SUFFIX),
    ]
}

/// Shared libraries of `info` found in its library folders.
pub fn find_shared_libraries(info: &BuildInfo, name: &str) -> Result<Vec<PathBuf>> {
    let patterns = library_patterns(name);
    let mut found = Vec::new();
    for dir in info.lib_paths() {
        for path in glob_files(Path::new(dir), &patterns)? {
            if !found.contains(&path) {
                found.push(path);
            }
        }
    }
    Ok(found)
}

/// Copy the shared libraries of `units` (all units when empty) into `dest`.
pub fn bundle(record_path: &Path, units: &[String], dest: &Path) -> Result<BundleResult> {
    let entries = record::read(record_path)?;
    ensure_dir(dest)?;

    let mut result = BundleResult::default();
    for (unit, info) in &entries {
        if !units.is_empty() && !units.contains(unit) {
            continue;
        }
        for lib in info.link_library_names() {
            let libraries = find_shared_libraries(info, lib)?;
            if libraries.is_empty() {
                tracing::debug!("no shared library for {} ({})", lib, unit);
                result.missing.push((unit.clone(), lib.clone()));
                continue;
            }
            for library in libraries {
                let Some(file_name) = library.file_name() else {
                    continue;
                };
                let target = dest.join(file_name);
                copy_file(&library, &target)?;
                result.copied.push(target);
            }
        }
    }

    Ok(result)
}

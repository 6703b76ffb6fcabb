//! Render compiler and linker flags from the Info Record.

use std::path::Path;

use anyhow::{bail, Result};

use crate::core::BuildInfo;
use crate::record;

/// Flags a downstream build needs for some units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// `-I` flags
    pub cflags: Vec<String>,
    /// `-L` then `-l` flags
    pub libs: Vec<String>,
}

impl Flags {
    fn add(&mut self, info: &BuildInfo) {
        for flag in info.include_flags() {
            if !self.cflags.contains(&flag) {
                self.cflags.push(flag);
            }
        }
        for flag in info.link_flags() {
            if !self.libs.contains(&flag) {
                self.libs.push(flag);
            }
        }
    }
}

/// Collect flags for `units` (every unit in the record when empty), in
/// record order.
pub fn flags(record_path: &Path, units: &[String]) -> Result<Flags> {
    let entries = record::read(record_path)?;
    select(&entries, units)
}

/// Like [`flags`], over already parsed record entries.
pub fn select(entries: &[(String, BuildInfo)], units: &[String]) -> Result<Flags> {
    for unit in units {
        if !entries.iter().any(|(name, _)| name == unit) {
            bail!(
                "unit `{}` is not in the info record\n\
                 hint: run `stevedore get {}` first",
                unit,
                unit
            );
        }
    }

    let mut flags = Flags::default();
    for (name, info) in entries {
        if units.is_empty() || units.contains(name) {
            flags.add(info);
        }
    }
    Ok(flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;

    fn entries() -> Vec<(String, BuildInfo)> {
        let mut blas = BuildInfo::new();
        blas.push(Category::LibPaths, "/tp/pkg/Blas/lib");
        blas.push(Category::LinkLibraryNames, "coinblas");

        let mut ipopt = BuildInfo::new();
        ipopt.push(Category::IncludePaths, "/tp/pkg/Ipopt/include/coin");
        ipopt.push(Category::LibPaths, "/tp/pkg/Ipopt/lib");
        ipopt.push(Category::LinkLibraryNames, "ipopt");

        vec![("Blas".to_string(), blas), ("Ipopt".to_string(), ipopt)]
    }

    #[test]
    fn test_flags_for_one_unit() {
        let flags = select(&entries(), &["Ipopt".to_string()]).unwrap();
        assert_eq!(flags.cflags, ["-I/tp/pkg/Ipopt/include/coin"]);
        assert_eq!(flags.libs, ["-L/tp/pkg/Ipopt/lib", "-lipopt"]);
    }

    #[test]
    fn test_flags_for_everything() {
        let flags = select(&entries(), &[]).unwrap();
        assert_eq!(
            flags.libs,
            ["-L/tp/pkg/Blas/lib", "-lcoinblas", "-L/tp/pkg/Ipopt/lib", "-lipopt"]
        );
    }

    #[test]
    fn test_unknown_unit() {
        let err = select(&entries(), &["Qt".to_string()]).unwrap_err();
        assert!(err.to_string().contains("`Qt` is not in the info record"));
    }
}

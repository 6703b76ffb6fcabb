//! The Info Record: the persisted ledger of every staged unit's BuildInfo.
//!
//! ```text
//! Eigen_IncludePaths : /tp/pkg/Eigen/include
//! Eigen_LibPaths :
//! Eigen_BinPaths :
//! Eigen_DocPaths :
//! Eigen_LinkLibraryNames :
//! ```
//!
//! One line per (unit, category), categories in a fixed order, units in the
//! order their Stage finished. Downstream builds group lines on the
//! `<Unit>_` prefix. Values are separated by single spaces, so paths with
//! whitespace cannot be represented.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use crate::core::{BuildInfo, Category};
use crate::util::fs::ensure_dir;

/// Append-only writer for one run.
#[derive(Debug)]
pub struct InfoRecord {
    path: PathBuf,
}

impl InfoRecord {
    /// Truncate (or create) the record at `path`.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        File::create(&path)
            .with_context(|| format!("failed to truncate info record {}", path.display()))?;
        tracing::debug!("truncated info record {}", path.display());
        Ok(InfoRecord { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append every category of `info` for `unit`.
    ///
    /// Fails without writing anything if a value contains whitespace.
    pub fn append(&mut self, unit: &str, info: &BuildInfo) -> Result<()> {
        for (category, values) in info.iter() {
            if let Some(value) = values.iter().find(|v| v.chars().any(char::is_whitespace)) {
                bail!(
                    "{}_{} value `{}` contains whitespace and cannot be recorded",
                    unit,
                    category,
                    value
                );
            }
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("failed to open info record {}", self.path.display()))?;

        file.write_all(render(unit, info).as_bytes())
            .with_context(|| format!("failed to write info record {}", self.path.display()))?;
        Ok(())
    }
}

/// Record lines for one unit.
pub fn render(unit: &str, info: &BuildInfo) -> String {
    let mut out = String::new();
    for (category, values) in info.iter() {
        out.push_str(&format!("{}_{} :", unit, category));
        for value in values {
            out.push(' ');
            out.push_str(value);
        }
        out.push('\n');
    }
    out
}

/// Parse a record back into `(unit, BuildInfo)` pairs, in file order.
pub fn read(path: &Path) -> Result<Vec<(String, BuildInfo)>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read info record {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid info record {}", path.display()))
}

/// Parse record text.
pub fn parse(text: &str) -> Result<Vec<(String, BuildInfo)>> {
    let mut units: Vec<(String, BuildInfo)> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let Some((key, values)) = line.split_once(" :") else {
            bail!("line {}: expected `<Unit>_<Category> : values`", lineno);
        };
        let Some((unit, category)) = key.rsplit_once('_') else {
            bail!("line {}: `{}` has no `_<Category>` suffix", lineno, key);
        };
        if unit.is_empty() {
            bail!("line {}: empty unit name", lineno);
        }
        let category: Category = category
            .parse()
            .map_err(|e| anyhow!("line {}: {}", lineno, e))?;

        let pos = match units.iter().position(|(name, _)| name == unit) {
            Some(pos) => pos,
            None => {
                units.push((unit.to_string(), BuildInfo::new()));
                units.len() - 1
            }
        };
        units[pos].1.extend(category, values.split_whitespace());
    }

    Ok(units)
}

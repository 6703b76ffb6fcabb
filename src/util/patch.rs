//! In-place text substitution for vendored build files.
//!
//! Third-party sources sometimes ship scripts that need a nudge before they
//! build (a download tool swapped, a hard-coded path removed). [`patch_file`]
//! applies one [`Patch`] to every line of a file.

use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use tempfile::NamedTempFile;

/// A single search-and-replace rule.
#[derive(Debug, Clone)]
pub enum Patch {
    Regex { pattern: Regex, replacement: String },
    Literal { from: String, to: String },
}

impl Patch {
    /// Regular-expression patch. `replacement` may refer to capture groups
    /// as `$1` or `${name}`.
    pub fn regex(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let compiled = Regex::new(pattern)
            .with_context(|| format!("invalid patch pattern `{}`", pattern))?;
        Ok(Patch::Regex {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    /// Plain-text patch; neither side is interpreted.
    pub fn literal(from: impl Into<String>, to: impl Into<String>) -> Self {
        Patch::Literal {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Apply the patch to a single line (without its terminator).
    pub fn apply_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match self {
            Patch::Regex {
                pattern,
                replacement,
            } => pattern.replace_all(line, replacement.as_str()),
            Patch::Literal { from, to } => {
                if !from.is_empty() && line.contains(from.as_str()) {
                    Cow::Owned(line.replace(from.as_str(), to))
                } else {
                    Cow::Borrowed(line)
                }
            }
        }
    }

    /// Apply the patch to every line of `text`, keeping line terminators.
    ///
    /// Returns the new text and the number of lines that changed.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let mut out = String::with_capacity(text.len());
        let mut changed = 0;

        for raw in text.split_inclusive('\n') {
            let (body, ending) = split_line_ending(raw);
            let patched = self.apply_line(body);
            if patched != body {
                changed += 1;
            }
            out.push_str(&patched);
            out.push_str(ending);
        }

        (out, changed)
    }
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Rewrite `path`, applying `patch` to each line independently.
///
/// Matches never span line boundaries. Returns the number of lines that
/// changed; a file with no matches is left untouched. The new content is
/// written to a temporary file in the same directory and renamed over the
/// original. This is not crash-safe: a crash between the two steps can leave
/// the temporary file behind next to the original.
pub fn patch_file(path: &Path, patch: &Patch) -> Result<usize> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read file to patch: {}", path.display()))?;

    let (patched, changed) = patch.apply(&text);
    if changed == 0 {
        tracing::debug!("patch left {} unchanged", path.display());
        return Ok(0);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    temp.write_all(patched.as_bytes())
        .with_context(|| format!("failed to write {}", temp.path().display()))?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(temp.path(), meta.permissions())
            .with_context(|| format!("failed to copy permissions to {}", temp.path().display()))?;
    }
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    tracing::debug!("patched {} line(s) in {}", changed, path.display());
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_literal_patch_rewrites_matching_lines() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("get.Mumps");
        fs::write(&script, "#!/bin/sh\nwgetcmd=ftp\n$wgetcmd http://x/mumps.tgz\n").unwrap();

        let patch = Patch::literal("wgetcmd=ftp", r#"wgetcmd="curl -L -k -O""#);
        let changed = patch_file(&script, &patch).unwrap();

        assert_eq!(changed, 1);
        assert_eq!(
            fs::read_to_string(&script).unwrap(),
            "#!/bin/sh\nwgetcmd=\"curl -L -k -O\"\n$wgetcmd http://x/mumps.tgz\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_patch_keeps_mode_and_leaves_no_temporary_file() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("get.Metis");
        fs::write(&script, "wgetcmd=ftp\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        patch_file(&script, &Patch::literal("ftp", "curl")).unwrap();

        let mode = fs::metadata(&script).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_patch_twice_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("get.Metis");
        fs::write(&script, "wgetcmd=ftp\n").unwrap();
        let patch = Patch::literal("wgetcmd=ftp", r#"wgetcmd="curl -L -k -O""#);

        patch_file(&script, &patch).unwrap();
        let once = fs::read_to_string(&script).unwrap();
        let changed = patch_file(&script, &patch).unwrap();

        assert_eq!(changed, 0);
        assert_eq!(fs::read_to_string(&script).unwrap(), once);
    }

    #[test]
    fn test_regex_capture_groups() {
        let patch = Patch::regex(r"^(prefix)\s*=\s*.*$", "$1 = /opt/pkg").unwrap();
        let (text, changed) = patch.apply("prefix = /usr/local\nother = 1\n");

        assert_eq!(changed, 1);
        assert_eq!(text, "prefix = /opt/pkg\nother = 1\n");
    }

    #[test]
    fn test_matches_do_not_span_lines() {
        let patch = Patch::regex(r"a\s+b", "ab").unwrap();
        let (text, changed) = patch.apply("a\nb\na  b\n");

        assert_eq!(changed, 1);
        assert_eq!(text, "a\nb\nab\n");
    }

    #[test]
    fn test_line_endings_preserved() {
        let patch = Patch::literal("old", "new");
        let (text, _) = patch.apply("old\r\nkeep\nold");

        assert_eq!(text, "new\r\nkeep\nnew");
    }

    #[test]
    fn test_literal_replacement_is_not_expanded() {
        let patch = Patch::literal("HOME", "$HOME");
        let (text, _) = patch.apply("dir=HOME\n");

        assert_eq!(text, "dir=$HOME\n");
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        assert!(Patch::regex("(unclosed", "x").is_err());
    }
}

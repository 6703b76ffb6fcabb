//! Archive download, checksum and extraction.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use url::Url;

use crate::util::fs::{copy_file, ensure_dir};
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Shell, Status};

/// Archive formats Fetch knows how to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    TarBz2,
    TarXz,
    Tar,
    Zip,
}

impl ArchiveKind {
    /// Detect the format from the archive's file name, falling back to
    /// hints in the URL path (`.../zip/...`, `.../tar.gz/...`).
    pub fn detect(archive_name: &str, url: &str) -> Option<Self> {
        let name = archive_name.to_ascii_lowercase();
        let by_name = if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Some(ArchiveKind::TarBz2)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(ArchiveKind::TarXz)
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Tar)
        } else if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        };

        by_name.or_else(|| {
            let url = url.to_ascii_lowercase();
            if url.contains("/zip/") {
                Some(ArchiveKind::Zip)
            } else if url.contains("/tar.gz/") || url.contains("/tar/") {
                Some(ArchiveKind::TarGz)
            } else {
                None
            }
        })
    }

    /// External command that unpacks this format into `dest`.
    ///
    /// `None` for gzip tarballs, which are unpacked in-process by
    /// [`extract_tar_gz`].
    pub fn extract_command(self, archive: &Path, dest: &Path) -> Option<ProcessBuilder> {
        let tar = |flags: &str| {
            ProcessBuilder::new("tar")
                .arg(flags)
                .arg(archive)
                .arg("-C")
                .arg(dest)
        };

        match self {
            ArchiveKind::TarGz => None,
            ArchiveKind::TarBz2 => Some(tar("-xjf")),
            ArchiveKind::TarXz => Some(tar("-xJf")),
            ArchiveKind::Tar => Some(tar("-xf")),
            ArchiveKind::Zip => Some(
                ProcessBuilder::new("unzip")
                    .arg("-q")
                    .arg("-o")
                    .arg(archive)
                    .arg("-d")
                    .arg(dest),
            ),
        }
    }
}

/// Local path a URL points at, for `file://` URLs and plain paths.
fn local_source(url: &str) -> Option<PathBuf> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed.to_file_path().ok(),
        // Windows drive letters parse as a one-letter scheme
        Ok(parsed) if parsed.scheme().len() > 1 => None,
        _ => Some(PathBuf::from(url)),
    }
}

/// Download `url` to `dest`.
///
/// HTTP(S) URLs are streamed through a blocking `reqwest` client with a
/// progress bar; `file://` URLs and plain paths are copied.
pub fn download(url: &str, dest: &Path, shell: &Shell) -> Result<()> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }

    if let Some(path) = local_source(url) {
        tracing::debug!("copying archive from {}", path.display());
        return copy_file(&path, dest);
    }

    shell.status(Status::Downloading, url);
    let mut response = reqwest::blocking::get(url)
        .with_context(|| format!("failed to download {}", url))?;

    if !response.status().is_success() {
        bail!("failed to download {}: HTTP {}", url, response.status());
    }

    let progress = shell.bytes_progress(
        dest.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        response.content_length(),
    );

    let file = File::create(dest)
        .with_context(|| format!("failed to create {}", dest.display()))?;
    let mut writer = BufWriter::new(file);
    let mut buffer = [0u8; 64 * 1024];
    let mut total = 0u64;

    loop {
        let n = response
            .read(&mut buffer)
            .with_context(|| format!("failed to read response body from {}", url))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buffer[..n])
            .with_context(|| format!("failed to write {}", dest.display()))?;
        progress.inc(n as u64);
        total += n as u64;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", dest.display()))?;
    progress.finish();

    tracing::info!("downloaded {} ({} bytes)", url, total);
    Ok(())
}

/// Compute SHA256 hash of a file.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Fail unless the file's SHA256 matches `expected` (hex, case-insensitive).
pub fn verify_checksum(path: &Path, expected: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        bail!(
            "checksum mismatch for {}:\n  expected: {}\n  actual:   {}",
            path.display(),
            expected,
            actual
        );
    }
    tracing::debug!("checksum verified: {}", &actual[..16]);
    Ok(())
}

/// Unpack a gzip-compressed tarball into `dest`.
///
/// Entries keep their archive paths, so an archive with a top-level
/// `mylib-1.0/` directory produces `dest/mylib-1.0/`. Entries that would
/// land outside `dest` are rejected.
pub fn extract_tar_gz(archive_path: &Path, dest: &Path) -> Result<()> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let file = File::open(archive_path)
        .with_context(|| format!("failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(true);

    ensure_dir(dest)?;

    for entry in archive
        .entries()
        .with_context(|| format!("failed to read entries of {}", archive_path.display()))?
    {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry
            .path()
            .context("failed to get entry path")?
            .into_owned();

        let inside = entry
            .unpack_in(dest)
            .with_context(|| format!("failed to extract {}", entry_path.display()))?;
        if !inside {
            bail!(
                "tarball entry escapes destination directory: {}",
                entry_path.display()
            );
        }
    }

    Ok(())
}

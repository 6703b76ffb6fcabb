//! Unit identity: name, version, where the sources come from and what the
//! unit depends on.

use std::fmt;
use std::path::PathBuf;

use url::Url;

/// Where a unit's sources come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// An archive downloaded into `<src_root>/<name>/` and extracted there.
    Archive {
        url: String,
        /// File name the download is saved under.
        archive_name: String,
        /// Top-level directory the archive extracts to.
        dir_name: String,
        /// Expected SHA-256 of the archive, hex encoded.
        sha256: Option<String>,
    },

    /// A git repository cloned into `<src_root>/<name>/<dir_name>`.
    Git {
        url: String,
        /// Commit, tag or branch to check out; the default branch if unset.
        rev: Option<String>,
        dir_name: String,
    },

    /// Sources vendored inside another unit's extracted tree.
    ///
    /// The parent is fetched first; it does not have to be a dependency.
    Nested { parent: String, path: PathBuf },

    /// An existing directory; never downloaded or deleted.
    Local { path: PathBuf },

    /// Nothing to fetch.
    None,
}

impl SourceLocator {
    /// Archive locator, naming the download after the URL's last path segment.
    pub fn archive(url: impl Into<String>, dir_name: impl Into<String>) -> Self {
        let url = url.into();
        let archive_name = archive_name_from_url(&url);
        SourceLocator::Archive {
            url,
            archive_name,
            dir_name: dir_name.into(),
            sha256: None,
        }
    }

    pub fn git(url: impl Into<String>, rev: Option<&str>, dir_name: impl Into<String>) -> Self {
        SourceLocator::Git {
            url: url.into(),
            rev: rev.map(str::to_string),
            dir_name: dir_name.into(),
        }
    }

    pub fn nested(parent: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        SourceLocator::Nested {
            parent: parent.into(),
            path: path.into(),
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        SourceLocator::Local { path: path.into() }
    }

    /// Pin the archive checksum. Has no effect on other locators.
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        if let SourceLocator::Archive { sha256, .. } = &mut self {
            *sha256 = Some(digest.into());
        }
        self
    }

    /// The unit whose tree contains this unit's sources.
    pub fn parent(&self) -> Option<&str> {
        match self {
            SourceLocator::Nested { parent, .. } => Some(parent),
            _ => None,
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Archive { url, .. } => write!(f, "{}", url),
            SourceLocator::Git { url, rev, .. } => match rev {
                Some(rev) => write!(f, "git+{}#{}", url, rev),
                None => write!(f, "git+{}", url),
            },
            SourceLocator::Nested { parent, path } => {
                write!(f, "{} ({})", parent, path.display())
            }
            SourceLocator::Local { path } => write!(f, "{}", path.display()),
            SourceLocator::None => write!(f, "-"),
        }
    }
}

/// Last path segment of a URL, or the raw string's last `/` segment when it
/// does not parse as a URL.
pub fn archive_name_from_url(url: &str) -> String {
    let from_url = Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|segments| segments.last().map(str::to_string))
            .filter(|s| !s.is_empty())
    });

    from_url.unwrap_or_else(|| {
        url.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(url)
            .to_string()
    })
}

/// Static description of a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub name: String,
    pub version: String,
    pub source: SourceLocator,
    /// Names of units that must be staged first, in declaration order.
    pub dependencies: Vec<String>,
    /// Libraries the unit exposes for linking.
    pub link_libraries: Vec<String>,
}

impl UnitSpec {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        UnitSpec {
            name: name.into(),
            version: version.into(),
            source: SourceLocator::None,
            dependencies: Vec::new(),
            link_libraries: Vec::new(),
        }
    }

    pub fn source(mut self, source: SourceLocator) -> Self {
        self.source = source;
        self
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn links<I, S>(mut self, libs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.link_libraries.extend(libs.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for UnitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

//! Configuration file support for Stevedore.
//!
//! Stevedore reads two configuration files:
//! - Global: `~/.stevedore/config.toml` - User-wide defaults
//! - Project: `./stevedore.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::layout::Roots;
use crate::util::fs::normalize_path;

/// File name of the project configuration.
pub const PROJECT_CONFIG_FILE: &str = "stevedore.toml";

/// File name of the Info Record inside the stage root.
pub const INFO_RECORD_FILE: &str = "third_party_info";

/// Stevedore configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where sources, build trees and staged packages live
    pub paths: PathsConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Units declared in configuration, keyed by name
    pub units: BTreeMap<String, ScriptUnitConfig>,
}

/// Filesystem roots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Base directory; `src`, `build` and `pkg` are created under it
    pub root: Option<PathBuf>,

    /// Override for the source root
    pub src: Option<PathBuf>,

    /// Override for the build root
    pub build: Option<PathBuf>,

    /// Override for the stage root
    pub stage: Option<PathBuf>,

    /// Override for the Info Record location
    pub info_record: Option<PathBuf>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Parallel jobs for native builds and the unit scheduler (default 1)
    pub jobs: Option<usize>,

    /// Permit commands that need `sudo`
    pub allow_elevated: Option<bool>,

    /// C compiler used by smoke tests written in C
    pub cc: Option<String>,

    /// C++ compiler used by smoke tests
    pub cxx: Option<String>,

    /// Extra flags passed when compiling C++ smoke tests
    pub cxxflags: Vec<String>,

    /// Extra flags passed when linking smoke tests
    pub ldflags: Vec<String>,
}

/// A unit described entirely by shell commands.
///
/// ```toml
/// [units.zlib]
/// version = "1.3.1"
/// url = "https://zlib.net/zlib-1.3.1.tar.gz"
/// dir = "zlib-1.3.1"
/// libs = ["z"]
/// compile = ["cd {build} && ./configure --prefix={stage}", "make -C {build} -j{jobs}"]
/// stage = ["make -C {build} install"]
/// smoke_test = "#include <zlib.h>\nint main() { return zlibVersion() == 0; }"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptUnitConfig {
    pub version: Option<String>,

    /// Archive to download
    pub url: Option<String>,

    /// File name the archive is saved under (defaults to the URL's last segment)
    pub archive: Option<String>,

    /// Expected SHA-256 of the downloaded archive
    pub sha256: Option<String>,

    /// Git repository to clone (instead of `url`)
    pub git: Option<String>,

    /// Commit, tag or branch checked out with `git`
    pub rev: Option<String>,

    /// Directory the archive extracts to, or the checkout folder with `git`
    pub dir: Option<String>,

    /// Already-present source directory (instead of `url`)
    pub path: Option<PathBuf>,

    /// Parent unit whose source tree contains this unit's sources
    pub nested_in: Option<String>,

    /// Sub-directory of the parent's source tree (with `nested_in`)
    pub nested_path: Option<PathBuf>,

    pub dependencies: Vec<String>,

    /// Library names to link against
    pub libs: Vec<String>,

    /// Commands run during Compile
    pub compile: Vec<String>,

    /// Commands run during Stage
    pub stage: Vec<String>,

    /// Commands run during Verify, after the smoke test
    pub verify: Vec<String>,

    /// Source of a program that must compile, link and run against the unit
    pub smoke_test: Option<String>,

    /// `c` or `c++` (default)
    pub smoke_language: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, or defaults if the file doesn't exist.
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Paths
        if other.paths.root.is_some() {
            self.paths.root = other.paths.root;
        }
        if other.paths.src.is_some() {
            self.paths.src = other.paths.src;
        }
        if other.paths.build.is_some() {
            self.paths.build = other.paths.build;
        }
        if other.paths.stage.is_some() {
            self.paths.stage = other.paths.stage;
        }
        if other.paths.info_record.is_some() {
            self.paths.info_record = other.paths.info_record;
        }

        // Build settings
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.allow_elevated.is_some() {
            self.build.allow_elevated = other.build.allow_elevated;
        }
        if other.build.cc.is_some() {
            self.build.cc = other.build.cc;
        }
        if other.build.cxx.is_some() {
            self.build.cxx = other.build.cxx;
        }
        if !other.build.cxxflags.is_empty() {
            self.build.cxxflags = other.build.cxxflags;
        }
        if !other.build.ldflags.is_empty() {
            self.build.ldflags = other.build.ldflags;
        }

        // Units are replaced whole, by name
        self.units.extend(other.units);
    }

    /// Resolve the three filesystem roots.
    pub fn roots(&self) -> Roots {
        let root = self.paths.root.clone().unwrap_or_else(default_root);
        let defaults = Roots::under(&root);
        Roots {
            src: self.paths.src.clone().unwrap_or(defaults.src),
            build: self.paths.build.clone().unwrap_or(defaults.build),
            stage: self.paths.stage.clone().unwrap_or(defaults.stage),
        }
    }

    /// Location of the Info Record.
    pub fn info_record_path(&self) -> PathBuf {
        self.paths
            .info_record
            .clone()
            .unwrap_or_else(|| self.roots().stage.join(INFO_RECORD_FILE))
    }

    /// Number of parallel jobs (at least 1).
    pub fn jobs(&self) -> usize {
        self.build.jobs.unwrap_or(1).max(1)
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.build.jobs == Some(0) {
            bail!("`build.jobs` must be at least 1");
        }

        let roots = self.roots();
        let named = [
            ("src", normalize_path(&roots.src)),
            ("build", normalize_path(&roots.build)),
            ("stage", normalize_path(&roots.stage)),
        ];
        for (i, (a_name, a)) in named.iter().enumerate() {
            for (b_name, b) in &named[i + 1..] {
                if a == b {
                    bail!(
                        "the {} and {} roots both resolve to {}; every run resets them, so they must differ",
                        a_name,
                        b_name,
                        a.display()
                    );
                }
            }
        }

        let record = normalize_path(&self.info_record_path());
        for (name, unit) in &self.units {
            validate_unit_name(name)?;
            if normalize_path(&roots.stage.join(name)) == record {
                bail!(
                    "unit `{}` would stage into the info record at {}",
                    name,
                    record.display()
                );
            }
            if unit.url.is_some() && unit.path.is_some() {
                bail!("unit `{}` sets both `url` and `path`", name);
            }
            if unit.nested_in.is_some() != unit.nested_path.is_some() {
                bail!(
                    "unit `{}` must set `nested_in` and `nested_path` together",
                    name
                );
            }
            if let Some(lang) = &unit.smoke_language {
                if lang != "c" && lang != "c++" {
                    bail!(
                        "unit `{}` has unknown smoke_language `{}` (expected `c` or `c++`)",
                        name,
                        lang
                    );
                }
            }
        }

        Ok(())
    }
}

/// A unit name becomes a folder under each root, so it must be exactly one
/// plain path component.
pub fn validate_unit_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    );
    if !single || name.contains(['/', '\\']) {
        bail!(
            "invalid unit name `{}`: must be a single folder name (no `/`, `\\`, `.` or `..`)",
            name
        );
    }
    Ok(())
}

/// Default base directory for sources, build trees and packages.
pub fn default_root() -> PathBuf {
    directories::ProjectDirs::from("", "", "stevedore")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".stevedore"))
}

/// Get the global stevedore config directory (~/.stevedore).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".stevedore"))
}

/// Get the global config path (~/.stevedore/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (./stevedore.toml)
/// 2. Global config (~/.stevedore/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_if_exists(global_path)?);
    }

    config.merge(Config::load_if_exists(project_path)?);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.paths.root.is_none());
        assert!(config.units.is_empty());
        assert_eq!(config.jobs(), 1);
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("stevedore.toml");

        std::fs::write(
            &config_path,
            r#"
[paths]
root = "/opt/thirdparty"

[build]
jobs = 8
allow_elevated = true
cxxflags = ["-std=c++17"]

[units.zlib]
version = "1.3.1"
url = "https://zlib.net/zlib-1.3.1.tar.gz"
dir = "zlib-1.3.1"
libs = ["z"]
compile = ["make -C {build}"]
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.paths.root, Some(PathBuf::from("/opt/thirdparty")));
        assert_eq!(config.jobs(), 8);
        assert_eq!(config.build.allow_elevated, Some(true));
        assert_eq!(config.build.cxxflags, vec!["-std=c++17"]);

        let zlib = &config.units["zlib"];
        assert_eq!(zlib.version.as_deref(), Some("1.3.1"));
        assert_eq!(zlib.libs, vec!["z"]);
        assert_eq!(zlib.compile, vec!["make -C {build}"]);
    }

    #[test]
    fn test_unit_names_must_be_plain_folder_names() {
        for bad in ["..", ".", "", "a/b", "../escape", "a\\b", "/abs"] {
            let mut config = Config::default();
            config.paths.root = Some(PathBuf::from("/tmp/tp"));
            config
                .units
                .insert(bad.to_string(), ScriptUnitConfig::default());
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("invalid unit name"), "{}: {}", bad, err);
        }

        let mut config = Config::default();
        config.paths.root = Some(PathBuf::from("/tmp/tp"));
        config
            .units
            .insert("zlib-1.3".to_string(), ScriptUnitConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_unit_name_cannot_alias_info_record() {
        let mut config = Config::default();
        config.paths.root = Some(PathBuf::from("/tmp/tp"));
        config
            .units
            .insert(INFO_RECORD_FILE.to_string(), ScriptUnitConfig::default());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("info record"));
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.build.cxx = Some("g++".to_string());
        base.build.jobs = Some(4);

        let mut override_cfg = Config::default();
        override_cfg.build.cxx = Some("clang++".to_string());

        base.merge(override_cfg);

        assert_eq!(base.build.cxx, Some("clang++".to_string()));
        assert_eq!(base.build.jobs, Some(4));
    }

    #[test]
    fn test_roots_under_root() {
        let mut config = Config::default();
        config.paths.root = Some(PathBuf::from("/work/tp"));
        config.paths.stage = Some(PathBuf::from("/work/pkg"));

        let roots = config.roots();
        assert_eq!(roots.src, PathBuf::from("/work/tp/src"));
        assert_eq!(roots.build, PathBuf::from("/work/tp/build"));
        assert_eq!(roots.stage, PathBuf::from("/work/pkg"));
        assert_eq!(
            config.info_record_path(),
            PathBuf::from("/work/pkg/third_party_info")
        );
    }

    #[test]
    fn test_validate_rejects_aliased_roots() {
        let mut config = Config::default();
        config.paths.root = Some(PathBuf::from("/work/tp"));
        config.paths.build = Some(PathBuf::from("/work/tp/src"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("src and build"));
    }

    #[test]
    fn test_validate_rejects_zero_jobs() {
        let mut config = Config::default();
        config.paths.root = Some(PathBuf::from("/work/tp"));
        config.build.jobs = Some(0);

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("stevedore.toml");

        std::fs::write(
            &global_path,
            r#"
[paths]
root = "/global/root"

[build]
cxx = "g++"
jobs = 2
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[build]
jobs = 6
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path).unwrap();

        assert_eq!(config.jobs(), 6);
        assert_eq!(config.build.cxx.as_deref(), Some("g++"));
        assert_eq!(config.paths.root, Some(PathBuf::from("/global/root")));
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        let project_path = tmp.path().join("stevedore.toml");
        std::fs::write(&project_path, "[build\njobs = 1").unwrap();

        let err = load_config(None, &project_path).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to parse config file"));
    }
}

//! What a staged unit exposes to its dependents.
//!
//! A [`BuildInfo`] is a fixed set of categories, each holding an ordered
//! list of strings: header directories, library directories, executable
//! directories, documentation directories and the names of the libraries
//! to link. Every category is always present, possibly empty.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One kind of artifact a unit exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    IncludePaths,
    LibPaths,
    BinPaths,
    DocPaths,
    LinkLibraryNames,
}

impl Category {
    /// All categories, in Info Record order.
    pub const ALL: [Category; 5] = [
        Category::IncludePaths,
        Category::LibPaths,
        Category::BinPaths,
        Category::DocPaths,
        Category::LinkLibraryNames,
    ];

    fn index(self) -> usize {
        match self {
            Category::IncludePaths => 0,
            Category::LibPaths => 1,
            Category::BinPaths => 2,
            Category::DocPaths => 3,
            Category::LinkLibraryNames => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::IncludePaths => "IncludePaths",
            Category::LibPaths => "LibPaths",
            Category::BinPaths => "BinPaths",
            Category::DocPaths => "DocPaths",
            Category::LinkLibraryNames => "LinkLibraryNames",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category `{}`", s))
    }
}

/// Artifact description of one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    values: [Vec<String>; 5],
}

impl BuildInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values of one category, in insertion order.
    pub fn get(&self, category: Category) -> &[String] {
        &self.values[category.index()]
    }

    pub fn include_paths(&self) -> &[String] {
        self.get(Category::IncludePaths)
    }

    pub fn lib_paths(&self) -> &[String] {
        self.get(Category::LibPaths)
    }

    pub fn bin_paths(&self) -> &[String] {
        self.get(Category::BinPaths)
    }

    pub fn doc_paths(&self) -> &[String] {
        self.get(Category::DocPaths)
    }

    pub fn link_library_names(&self) -> &[String] {
        self.get(Category::LinkLibraryNames)
    }

    /// Append one value.
    pub fn push(&mut self, category: Category, value: impl Into<String>) {
        self.values[category.index()].push(value.into());
    }

    /// Append several values.
    pub fn extend<I, S>(&mut self, category: Category, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values[category.index()].extend(values.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Vec::is_empty)
    }

    /// Iterate categories in Info Record order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// `-I` flags for every include path.
    pub fn include_flags(&self) -> Vec<String> {
        self.include_paths()
            .iter()
            .map(|p| format!("-I{}", p))
            .collect()
    }

    /// `-L` flags for every library path followed by `-l` flags for every
    /// library name.
    pub fn link_flags(&self) -> Vec<String> {
        self.lib_paths()
            .iter()
            .map(|p| format!("-L{}", p))
            .chain(self.link_library_names().iter().map(|l| format!("-l{}", l)))
            .collect()
    }
}

impl Serialize for BuildInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::ALL.len()))?;
        for (category, values) in self.iter() {
            map.serialize_entry(category.as_str(), values)?;
        }
        map.end()
    }
}

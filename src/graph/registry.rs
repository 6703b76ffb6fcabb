//! Registry of units by name.
//!
//! Each name maps to exactly one shared recipe instance, so two parents that
//! require the same dependency resolve to the same unit.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::builder::recipe::Recipe;
use crate::core::{BuildError, BuildResult, Roots, SourceLocator, UnitLayout};
use crate::recipes;
use crate::recipes::script::ScriptRecipe;
use crate::util::config::Config;

/// Name -> recipe map.
#[derive(Clone, Default)]
pub struct UnitRegistry {
    units: BTreeMap<String, Arc<dyn Recipe>>,
}

impl std::fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.units.keys()).finish()
    }
}

impl UnitRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        UnitRegistry::default()
    }

    /// Registry holding the built-in recipes.
    pub fn builtin() -> Self {
        let mut registry = UnitRegistry::new();
        for recipe in recipes::builtin() {
            registry.register(recipe);
        }
        registry
    }

    /// Built-ins plus the script units declared in `config`.
    ///
    /// A configured unit replaces a built-in of the same name.
    pub fn with_config(config: &Config) -> Result<Self> {
        let mut registry = UnitRegistry::builtin();
        for (name, unit) in &config.units {
            let recipe = ScriptRecipe::from_config(name, unit)?;
            if registry.contains(name) {
                tracing::info!("configured unit `{}` replaces the built-in recipe", name);
            }
            registry.register(Arc::new(recipe));
        }
        Ok(registry)
    }

    /// Add or replace a unit under its spec name.
    pub fn register(&mut self, recipe: Arc<dyn Recipe>) {
        let name = recipe.spec().name.clone();
        self.units.insert(name, recipe);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Recipe>> {
        self.units.get(name)
    }

    /// Like [`get`](Self::get), but a miss is an `UnknownUnit` error.
    pub fn require(&self, name: &str) -> BuildResult<&Arc<dyn Recipe>> {
        self.get(name).ok_or_else(|| BuildError::UnknownUnit {
            name: name.to_string(),
            required_by: None,
        })
    }

    /// All unit names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Arc<dyn Recipe>> {
        self.units.values()
    }

    /// Units no other unit depends on or nests inside; what `get` builds by
    /// default.
    pub fn top_level(&self) -> Vec<String> {
        let required: BTreeSet<&str> = self
            .units
            .values()
            .flat_map(|r| r.spec().dependencies.iter().map(String::as_str))
            .collect();

        self.units
            .iter()
            .filter(|(name, recipe)| {
                !required.contains(name.as_str()) && recipe.spec().source.parent().is_none()
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Folders of `name` under `roots`.
    ///
    /// Nested units resolve their source tree through their parent chain;
    /// a nesting loop or unknown parent is an error.
    pub fn layout(&self, name: &str, roots: &Roots) -> BuildResult<UnitLayout> {
        let tree = self.source_tree(name, roots, &mut Vec::new())?;
        Ok(UnitLayout::new(roots, name, tree))
    }

    fn source_tree(&self, name: &str, roots: &Roots, seen: &mut Vec<String>) -> BuildResult<PathBuf> {
        if seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
            return Err(BuildError::DependencyCycle {
                cycle: seen.clone(),
            });
        }
        seen.push(name.to_string());

        let recipe = self.get(name).ok_or_else(|| BuildError::UnknownUnit {
            name: name.to_string(),
            required_by: seen.iter().rev().nth(1).cloned(),
        })?;

        let src = roots.src.join(name);
        Ok(match &recipe.spec().source {
            SourceLocator::Archive { dir_name, .. } | SourceLocator::Git { dir_name, .. } => {
                src.join(dir_name)
            }
            SourceLocator::Local { path } => path.clone(),
            SourceLocator::None => src,
            SourceLocator::Nested { parent, path } => {
                self.source_tree(parent, roots, seen)?.join(path)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixtureRecipe;
    use crate::util::config::ScriptUnitConfig;
    use std::path::Path;

    #[test]
    fn test_builtin_registry() {
        let registry = UnitRegistry::builtin();
        for name in ["Eigen", "NLopt", "CppUnit", "Boost", "Ipopt", "Blas", "Mumps"] {
            assert!(registry.contains(name), "missing {}", name);
        }

        let top = registry.top_level();
        assert!(top.contains(&"Ipopt".to_string()));
        assert!(!top.contains(&"Blas".to_string()));
    }

    #[test]
    fn test_require_unknown() {
        let registry = UnitRegistry::new();
        assert!(matches!(
            registry.require("Nope"),
            Err(BuildError::UnknownUnit { ref name, .. }) if name == "Nope"
        ));
    }

    #[test]
    fn test_nested_layout() {
        let mut registry = UnitRegistry::new();
        registry.register(Arc::new(FixtureRecipe::new("Ipopt").source(
            SourceLocator::archive("https://example.org/3.12.13.zip", "Ipopt-releases-3.12.13"),
        )));
        registry.register(Arc::new(
            FixtureRecipe::new("Blas").source(SourceLocator::nested("Ipopt", "ThirdParty/Blas")),
        ));

        let roots = Roots::under(Path::new("/tp"));
        let layout = registry.layout("Blas", &roots).unwrap();
        assert_eq!(
            layout.source_tree,
            PathBuf::from("/tp/src/Ipopt/Ipopt-releases-3.12.13/ThirdParty/Blas")
        );
        assert_eq!(layout.build, PathBuf::from("/tp/build/Blas"));
    }

    #[test]
    fn test_nesting_loop_is_rejected() {
        let mut registry = UnitRegistry::new();
        registry.register(Arc::new(
            FixtureRecipe::new("A").source(SourceLocator::nested("B", "a")),
        ));
        registry.register(Arc::new(
            FixtureRecipe::new("B").source(SourceLocator::nested("A", "b")),
        ));

        let err = registry.layout("A", &Roots::under(Path::new("/tp"))).unwrap_err();
        assert!(matches!(err, BuildError::DependencyCycle { ref cycle } if cycle == &["A", "B", "A"]));
    }

    #[test]
    fn test_config_units_override_builtins() {
        let mut config = Config::default();
        config.units.insert(
            "Eigen".to_string(),
            ScriptUnitConfig {
                version: Some("3.3.9".to_string()),
                path: Some(PathBuf::from("/opt/eigen")),
                ..ScriptUnitConfig::default()
            },
        );

        let registry = UnitRegistry::with_config(&config).unwrap();
        let eigen = registry.get("Eigen").unwrap();
        assert_eq!(eigen.spec().version, "3.3.9");
        assert_eq!(eigen.spec().source, SourceLocator::local("/opt/eigen"));
    }
}

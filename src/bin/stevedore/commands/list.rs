//! `stevedore list` command

use anyhow::Result;

use super::Session;
use crate::cli::{GlobalArgs, ListArgs};
use stevedore::graph::UnitRegistry;

pub fn execute(args: ListArgs, global: &GlobalArgs) -> Result<()> {
    let session = Session::new(global)?;
    let registry = UnitRegistry::with_config(&session.config)?;

    let top_level = registry.top_level();
    let recipes = registry
        .recipes()
        .filter(|r| !args.top_level || top_level.contains(&r.spec().name));

    for recipe in recipes {
        let spec = recipe.spec();
        if spec.version.is_empty() {
            println!("{} ({})", spec.name, spec.source);
        } else {
            println!("{} v{} ({})", spec.name, spec.version, spec.source);
        }
        if !spec.dependencies.is_empty() {
            println!("    depends on: {}", spec.dependencies.join(", "));
        }
    }

    Ok(())
}

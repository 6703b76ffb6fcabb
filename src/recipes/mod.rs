//! Built-in recipes and configurable script units.
//!
//! Each built-in overrides only the lifecycle stages that differ from the
//! defaults in [`crate::builder::defaults`].

use std::sync::Arc;

use crate::builder::Recipe;

pub mod boost;
pub mod cppunit;
pub mod eigen;
pub mod ipopt;
pub mod nlopt;
pub mod script;

pub use boost::Boost;
pub use cppunit::CppUnit;
pub use eigen::Eigen;
pub use ipopt::{Ipopt, Vendored};
pub use nlopt::NLopt;
pub use script::ScriptRecipe;

/// Every built-in recipe, one instance per unit name.
pub fn builtin() -> Vec<Arc<dyn Recipe>> {
    let mut recipes: Vec<Arc<dyn Recipe>> = vec![
        Arc::new(Eigen::new()),
        Arc::new(NLopt::new()),
        Arc::new(CppUnit::new()),
        Arc::new(Boost::new()),
        Arc::new(Ipopt::new()),
    ];
    for vendored in Vendored::all() {
        recipes.push(Arc::new(vendored));
    }
    recipes
}

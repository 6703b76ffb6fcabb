//! Eigen: a header-only linear algebra library.

use crate::builder::defaults;
use crate::builder::{Recipe, SmokeTest, StageArtifact, StageContext};
use crate::core::{BuildResult, SourceLocator, UnitSpec};

pub const VERSION: &str = "3.4.0";

#[derive(Debug, Clone)]
pub struct Eigen {
    spec: UnitSpec,
}

impl Eigen {
    pub fn new() -> Self {
        let url = format!(
            "https://gitlab.com/libeigen/eigen/-/archive/{v}/eigen-{v}.tar.gz",
            v = VERSION
        );
        Eigen {
            spec: UnitSpec::new("Eigen", VERSION)
                .source(SourceLocator::archive(url, format!("eigen-{}", VERSION))),
        }
    }
}

impl Default for Eigen {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for Eigen {
    fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    // Nothing to compile.
    fn compile(&self, _ctx: &mut StageContext<'_>) -> BuildResult<()> {
        Ok(())
    }

    /// Headers go straight from the source tree into `include/`.
    fn stage(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        let tree = ctx.layout().source_tree.clone();
        defaults::copy_artifacts_from(&tree, &self.artifacts(), ctx)?;
        defaults::describe(ctx)
    }

    fn artifacts(&self) -> Vec<StageArtifact> {
        vec![
            StageArtifact::required("Eigen", "include/Eigen"),
            StageArtifact::optional("unsupported", "include/unsupported"),
        ]
    }

    fn smoke_test(&self) -> Option<SmokeTest> {
        Some(SmokeTest::cxx(
            r#"#include <iostream>
#include <Eigen/Core>

int main() {
    Eigen::VectorXd v(4);
    v << 1.0, 2.1, 3.2, 4.3;
    std::cout << "Eigen vector: " << v.transpose() << std::endl;
    return v.size() == 4 ? 0 : 1;
}
"#,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eigen_source() {
        let eigen = Eigen::new();
        match &eigen.spec().source {
            SourceLocator::Archive {
                archive_name,
                dir_name,
                ..
            } => {
                assert_eq!(archive_name, "eigen-3.4.0.tar.gz");
                assert_eq!(dir_name, "eigen-3.4.0");
            }
            other => panic!("unexpected source {:?}", other),
        }
        assert!(eigen.spec().link_libraries.is_empty());
    }
}

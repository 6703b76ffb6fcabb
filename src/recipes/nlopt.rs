//! NLopt: nonlinear optimization, built and installed with CMake.

use crate::builder::cmake::{is_cmake_project, CMakeBuild};
use crate::builder::defaults;
use crate::builder::{Recipe, SmokeTest, StageContext};
use crate::core::{BuildResult, SourceLocator, UnitSpec};

pub const VERSION: &str = "2.7.1";

/// Language bindings we never want; they drag in Python, Octave and friends.
const DISABLED_BINDINGS: [&str; 6] = [
    "NLOPT_PYTHON",
    "NLOPT_OCTAVE",
    "NLOPT_MATLAB",
    "NLOPT_GUILE",
    "NLOPT_SWIG",
    "NLOPT_TESTS",
];

#[derive(Debug, Clone)]
pub struct NLopt {
    spec: UnitSpec,
}

impl NLopt {
    pub fn new() -> Self {
        let url = format!(
            "https://github.com/stevengj/nlopt/archive/v{}.tar.gz",
            VERSION
        );
        NLopt {
            spec: UnitSpec::new("NLopt", VERSION)
                .source(SourceLocator::archive(url, format!("nlopt-{}", VERSION)))
                .links(["nlopt"]),
        }
    }

    /// Out-of-source CMake build installing into the unit's stage folder.
    pub fn cmake(ctx: &StageContext<'_>) -> CMakeBuild {
        let layout = ctx.layout();
        let mut build = CMakeBuild::new(&layout.source_tree, &layout.build)
            .install_prefix(&layout.stage)
            .define("CMAKE_INSTALL_LIBDIR", "lib")
            .define("BUILD_SHARED_LIBS", "ON");
        for binding in DISABLED_BINDINGS {
            build = build.define(binding, "OFF");
        }
        build
    }
}

impl Default for NLopt {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for NLopt {
    fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    fn compile(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::ensure_source_tree(ctx)?;
        let tree = &ctx.layout().source_tree;
        if !is_cmake_project(tree) {
            return Err(ctx.internal(anyhow::anyhow!(
                "no CMakeLists.txt in {}",
                tree.display()
            )));
        }
        Self::cmake(ctx).compile(ctx)
    }

    fn stage(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        Self::cmake(ctx).install(ctx)?;
        defaults::describe(ctx)
    }

    fn smoke_test(&self) -> Option<SmokeTest> {
        Some(SmokeTest::c(
            r#"#include <stdio.h>
#include <nlopt.h>

static double objective(unsigned n, const double *x, double *grad, void *data) {
    if (grad) {
        grad[0] = 2.0 * (x[0] - 1.0);
    }
    return (x[0] - 1.0) * (x[0] - 1.0);
}

int main(void) {
    nlopt_opt opt = nlopt_create(NLOPT_LD_MMA, 1);
    double x[1] = { 5.0 };
    double minf;

    nlopt_set_min_objective(opt, objective, NULL);
    nlopt_set_xtol_rel(opt, 1e-6);
    if (nlopt_optimize(opt, x, &minf) < 0) {
        printf("nlopt failed\n");
        nlopt_destroy(opt);
        return 1;
    }
    printf("found minimum at f(%g) = %g\n", x[0], minf);
    nlopt_destroy(opt);
    double err = x[0] - 1.0;
    return (err < 1e-3 && err > -1e-3) ? 0 : 1;
}
"#,
        ))
    }
}

//! Ipopt and the libraries it vendors under `ThirdParty/`.
//!
//! Ipopt ships `get.<Name>` scripts that download Blas, Lapack, ASL, Mumps
//! and Metis into its own source tree; Ipopt's build then compiles them.
//! Each vendored library is still a unit of its own so it is fetched and
//! ordered like any other.

use std::path::{Path, PathBuf};

use crate::builder::autotools::Autotools;
use crate::builder::context::ForStage;
use crate::builder::defaults;
use crate::builder::{Recipe, SmokeTest, StageArtifact, StageContext};
use crate::core::{BuildResult, SourceLocator, UnitSpec};
use crate::util::fs::make_executable;
use crate::util::patch::Patch;

pub const VERSION: &str = "3.12.13";

/// Vendored libraries in fetch order: (name, dependencies, patch the script).
const VENDORED: [(&str, &[&str], bool); 5] = [
    ("Blas", &[], false),
    ("Lapack", &["Blas"], false),
    ("ASL", &[], false),
    ("Metis", &[], true),
    ("Mumps", &["Blas", "Metis"], true),
];

/// Installed into the same `lib/` as Ipopt and needed at run time.
const LINK_LIBRARIES: [&str; 3] = ["ipopt", "coinmumps", "coinmetis"];

#[derive(Debug, Clone)]
pub struct Ipopt {
    spec: UnitSpec,
}

impl Ipopt {
    pub fn new() -> Self {
        let url = format!(
            "https://github.com/coin-or/Ipopt/archive/releases/{}.zip",
            VERSION
        );
        Ipopt {
            spec: UnitSpec::new("Ipopt", VERSION)
                .source(SourceLocator::archive(
                    url,
                    format!("Ipopt-releases-{}", VERSION),
                ))
                .depends_on(VENDORED.iter().map(|(name, _, _)| *name))
                .links(LINK_LIBRARIES),
        }
    }

    fn autotools(build: &Path) -> Autotools {
        Autotools::out_of_tree(build, build.join("Build")).prefix(build.join("install"))
    }

    /// Scripts the configure step runs; zip archives drop their mode bits.
    fn scripts(build: &Path) -> Vec<PathBuf> {
        let mut scripts = vec![
            build.join("configure"),
            build.join("install-sh"),
            build.join("Ipopt/install-sh"),
        ];
        for (name, _, _) in VENDORED {
            scripts.push(build.join("ThirdParty").join(name).join("install-sh"));
        }
        scripts
    }
}

impl Default for Ipopt {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for Ipopt {
    fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    /// Configure, build and install into `<build>/install`.
    fn compile(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::ensure_source_tree(ctx)?;
        defaults::compile(ctx)?;

        let build = ctx.layout().build.clone();
        for script in Self::scripts(&build) {
            if script.exists() {
                make_executable(&script).for_stage(ctx)?;
            }
        }

        let autotools = Self::autotools(&build);
        autotools.configure(ctx)?;
        autotools.make(ctx, &[])?;
        autotools.install(ctx, false)
    }

    fn artifacts(&self) -> Vec<StageArtifact> {
        vec![
            StageArtifact::required("install/include/coin", "include"),
            StageArtifact::required("install/lib", "lib"),
            StageArtifact::optional("Ipopt/doc/documentation.pdf", "doc/documentation.pdf"),
            StageArtifact::optional("Ipopt/examples/Cpp_example", "doc/Cpp_example"),
        ]
    }

    fn smoke_test(&self) -> Option<SmokeTest> {
        Some(SmokeTest::cxx(
            r#"#include <iostream>
#include "IpIpoptApplication.hpp"

int main() {
    Ipopt::SmartPtr<Ipopt::IpoptApplication> app = IpoptApplicationFactory();
    Ipopt::ApplicationReturnStatus status = app->Initialize();
    std::cout << "Ipopt initialize status: " << status << std::endl;
    return status == Ipopt::Solve_Succeeded ? 0 : 1;
}
"#,
        ))
    }
}

/// A library Ipopt vendors under `ThirdParty/<name>`, fetched by its script.
///
/// Compile and Stage are empty: Ipopt builds and installs it.
#[derive(Debug, Clone)]
pub struct Vendored {
    spec: UnitSpec,
    patch_script: bool,
}

impl Vendored {
    pub fn new(name: &str, dependencies: &[&str], patch_script: bool) -> Self {
        Vendored {
            spec: UnitSpec::new(name, VERSION)
                .source(SourceLocator::nested(
                    "Ipopt",
                    Path::new("ThirdParty").join(name),
                ))
                .depends_on(dependencies.iter().copied()),
            patch_script,
        }
    }

    pub fn all() -> Vec<Vendored> {
        VENDORED
            .iter()
            .map(|(name, deps, patch)| Vendored::new(name, deps, *patch))
            .collect()
    }

    /// `get.<name>`.
    pub fn script_name(&self) -> String {
        format!("get.{}", self.spec.name)
    }
}

impl Recipe for Vendored {
    fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    /// Run the vendor script inside the parent's tree. Mumps and Metis
    /// scripts default to `ftp`, which is rarely installed.
    fn fetch(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::ensure_source_tree(ctx)?;
        let tree = ctx.layout().source_tree.clone();
        let script = tree.join(self.script_name());

        if self.patch_script {
            ctx.patch(
                &script,
                &Patch::literal("wgetcmd=ftp", "wgetcmd=\"curl -L -k -O\""),
            )?;
        }
        make_executable(&script).for_stage(ctx)?;
        ctx.sh_in(&tree, format!("./{}", self.script_name()))
    }

    fn compile(&self, _ctx: &mut StageContext<'_>) -> BuildResult<()> {
        Ok(())
    }

    fn artifacts(&self) -> Vec<StageArtifact> {
        Vec::new()
    }
}

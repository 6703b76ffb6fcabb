//! Boost, restricted to the filesystem and system libraries.

use crate::builder::defaults;
use crate::builder::{Recipe, SmokeTest, StageArtifact, StageContext};
use crate::core::{BuildResult, SourceLocator, UnitSpec};

pub const VERSION: &str = "1.83.0";

/// Compiled Boost libraries in link order (filesystem needs system);
/// everything else is header only.
pub const LIBRARIES: [&str; 2] = ["filesystem", "system"];

#[derive(Debug, Clone)]
pub struct Boost {
    spec: UnitSpec,
}

impl Boost {
    pub fn new() -> Self {
        let dir = format!("boost_{}", VERSION.replace('.', "_"));
        let url = format!(
            "https://archives.boost.io/release/{}/source/{}.tar.gz",
            VERSION, dir
        );
        Boost {
            spec: UnitSpec::new("Boost", VERSION)
                .source(SourceLocator::archive(url, dir))
                .links(LIBRARIES.iter().map(|lib| format!("boost_{}", lib))),
        }
    }
}

impl Default for Boost {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for Boost {
    fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    /// `bootstrap.sh` then `b2`; libraries land in `stage/lib`.
    fn compile(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::ensure_source_tree(ctx)?;
        defaults::compile(ctx)?;

        ctx.sh(format!(
            "./bootstrap.sh --with-libraries={}",
            LIBRARIES.join(",")
        ))?;
        ctx.sh(format!("./b2 -j{} link=shared,static", ctx.jobs()))
    }

    fn artifacts(&self) -> Vec<StageArtifact> {
        let mut artifacts = vec![
            StageArtifact::required("boost", "include/boost"),
            StageArtifact::required("stage/lib", "lib"),
        ];
        for lib in LIBRARIES {
            artifacts.push(StageArtifact::optional(
                format!("libs/{}/index.html", lib),
                format!("doc/{}/index.html", lib),
            ));
            artifacts.push(StageArtifact::optional(
                format!("libs/{}/doc", lib),
                format!("doc/{}/doc", lib),
            ));
        }
        artifacts
    }

    fn smoke_test(&self) -> Option<SmokeTest> {
        Some(SmokeTest::cxx(
            r#"#include <iostream>
#include <boost/filesystem.hpp>
#include <boost/shared_ptr.hpp>
#include <boost/system/error_code.hpp>

int main() {
    boost::shared_ptr<int> ptr(new int(3));
    boost::system::error_code ec;
    boost::filesystem::path here = boost::filesystem::current_path(ec);
    if (ec) {
        std::cout << ec.message() << std::endl;
        return 1;
    }
    std::cout << "running in " << here << std::endl;
    return boost::filesystem::exists(here) && *ptr == 3 ? 0 : 1;
}
"#,
        ))
    }
}

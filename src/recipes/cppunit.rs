//! CppUnit: unit-testing framework, built in-tree with autotools.

use crate::builder::autotools::Autotools;
use crate::builder::defaults;
use crate::builder::{Recipe, SmokeTest, StageContext};
use crate::core::{BuildResult, SourceLocator, UnitSpec};

pub const VERSION: &str = "1.15.1";

#[derive(Debug, Clone)]
pub struct CppUnit {
    spec: UnitSpec,
}

impl CppUnit {
    pub fn new() -> Self {
        let url = format!(
            "https://dev-www.libreoffice.org/src/cppunit-{}.tar.gz",
            VERSION
        );
        CppUnit {
            spec: UnitSpec::new("CppUnit", VERSION)
                .source(SourceLocator::archive(url, format!("cppunit-{}", VERSION)))
                .links(["cppunit"]),
        }
    }

    fn autotools(ctx: &StageContext<'_>) -> Autotools {
        let layout = ctx.layout();
        Autotools::new(&layout.build).prefix(&layout.stage)
    }
}

impl Default for CppUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl Recipe for CppUnit {
    fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    /// Copy the tree, configure, build and run the bundled test suite.
    fn compile(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        defaults::ensure_source_tree(ctx)?;
        defaults::compile(ctx)?;

        let build = Self::autotools(ctx);
        build.configure(ctx)?;
        build.make(ctx, &[])?;
        build.make(ctx, &["check"])
    }

    fn stage(&self, ctx: &mut StageContext<'_>) -> BuildResult<()> {
        Self::autotools(ctx).install(ctx, false)?;
        defaults::describe(ctx)
    }

    fn smoke_test(&self) -> Option<SmokeTest> {
        Some(SmokeTest::cxx(
            r#"#include <cppunit/TestFixture.h>
#include <cppunit/extensions/HelperMacros.h>
#include <cppunit/ui/text/TestRunner.h>

class SmokeTest : public CppUnit::TestFixture {
    CPPUNIT_TEST_SUITE(SmokeTest);
    CPPUNIT_TEST(testEqual);
    CPPUNIT_TEST_SUITE_END();

public:
    void testEqual() { CPPUNIT_ASSERT_EQUAL(1.0, 1.0); }
};

int main() {
    CppUnit::TextUi::TestRunner runner;
    runner.addTest(SmokeTest::suite());
    return runner.run() ? 0 : 1;
}
"#,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildSettings;
    use crate::core::{BuildInfo, Roots, Stage, UnitLayout};
    use crate::test_support::MockRunner;
    use crate::util::shell::Shell;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compile_runs_configure_make_and_check() {
        let tmp = TempDir::new().unwrap();
        let roots = Roots::under(tmp.path());
        let tree = roots.src.join("CppUnit/cppunit-1.15.1");
        fs::create_dir_all(&tree).unwrap();
        fs::write(tree.join("configure"), "#!/bin/sh\n").unwrap();

        let cppunit = CppUnit::new();
        let layout = UnitLayout::new(&roots, "CppUnit", tree);
        let settings = BuildSettings {
            jobs: 4,
            ..BuildSettings::default()
        };
        let runner = MockRunner::new();
        let shell = Shell::quiet();
        let mut ctx = StageContext::new(
            cppunit.spec(),
            Stage::Compile,
            &layout,
            &settings,
            &runner,
            &shell,
            BuildInfo::new(),
            &[],
        );

        cppunit.compile(&mut ctx).unwrap();

        let commands = runner.commands();
        assert_eq!(commands.len(), 3);
        assert!(commands[0].ends_with(&format!(
            "configure --prefix={}",
            layout.stage.display()
        )));
        assert_eq!(commands[1], "make -j4");
        assert_eq!(commands[2], "make -j4 check");
        assert!(layout.build.join("configure").exists());
    }
}

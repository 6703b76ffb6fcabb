//! `stevedore get` command

use std::sync::Arc;

use anyhow::Result;

use super::Session;
use crate::cli::{GetArgs, GlobalArgs};
use stevedore::core::UnitStatus;
use stevedore::ops::Engine;
use stevedore::util::process::SystemRunner;
use stevedore::util::shell::Status;

pub fn execute(args: GetArgs, global: &GlobalArgs) -> Result<()> {
    let Session { mut config, shell } = Session::new(global)?;

    if let Some(jobs) = args.jobs {
        config.build.jobs = Some(jobs);
    }
    if args.allow_elevated {
        config.build.allow_elevated = Some(true);
    }

    let runner = Arc::new(SystemRunner::new().inherit_output(global.verbose));
    let engine = Engine::from_config(&config, runner, shell.clone())?;

    let units = if args.units.is_empty() {
        engine.registry().top_level()
    } else {
        args.units
    };
    if units.is_empty() {
        anyhow::bail!("no units to get");
    }

    let result = engine.run(&units, !args.no_fetch);
    if result.is_err() {
        let failed: Vec<String> = engine
            .last_statuses()
            .into_iter()
            .filter(|(_, status)| *status == UnitStatus::Failed)
            .map(|(unit, _)| unit)
            .collect();
        if !failed.is_empty() {
            shell.error(format!("failed: {}", failed.join(", ")));
        }
    }
    let report = result?;

    shell.status(
        Status::Finished,
        format!(
            "{} unit(s) staged, info record at {}",
            report.staged.len(),
            report.record.display()
        ),
    );

    Ok(())
}

//! `stevedore clean` command

use anyhow::Result;

use super::Session;
use crate::cli::{CleanArgs, GlobalArgs};
use stevedore::ops;
use stevedore::util::shell::Status;

pub fn execute(args: CleanArgs, global: &GlobalArgs) -> Result<()> {
    let session = Session::new(global)?;

    let removed = ops::clean(&session.config.roots(), args.all)?;
    if removed.is_empty() {
        session.shell.status(Status::Skipped, "nothing to clean");
    }
    for dir in removed {
        session.shell.status(Status::Removed, dir.display());
    }

    Ok(())
}

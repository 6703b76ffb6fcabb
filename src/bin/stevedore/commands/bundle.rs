//! `stevedore bundle` command

use anyhow::Result;

use super::Session;
use crate::cli::{BundleArgs, GlobalArgs};
use stevedore::ops;
use stevedore::util::shell::Status;

pub fn execute(args: BundleArgs, global: &GlobalArgs) -> Result<()> {
    let session = Session::new(global)?;
    let result = ops::bundle(&session.config.info_record_path(), &args.units, &args.dest)?;

    for (unit, lib) in &result.missing {
        session
            .shell
            .warn(format!("no shared library for `{}` ({})", lib, unit));
    }
    for path in &result.copied {
        session.shell.status(Status::Copied, path.display());
    }
    session.shell.status(
        Status::Finished,
        format!("{} file(s) copied to {}", result.copied.len(), args.dest.display()),
    );

    Ok(())
}

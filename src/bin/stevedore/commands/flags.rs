//! `stevedore flags` command

use anyhow::Result;

use super::Session;
use crate::cli::{FlagsArgs, GlobalArgs};
use stevedore::ops;

pub fn execute(args: FlagsArgs, global: &GlobalArgs) -> Result<()> {
    let session = Session::new(global)?;
    let flags = ops::flags(&session.config.info_record_path(), &args.units)?;

    let mut out = Vec::new();
    if !args.libs {
        out.extend(flags.cflags);
    }
    if !args.cflags {
        out.extend(flags.libs);
    }
    println!("{}", out.join(" "));

    Ok(())
}

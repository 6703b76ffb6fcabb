//! `stevedore info` command

use anyhow::{bail, Result};
use serde::Serialize;

use super::Session;
use crate::cli::{GlobalArgs, InfoArgs};
use stevedore::core::BuildInfo;
use stevedore::record;

#[derive(Serialize)]
struct UnitInfo<'a> {
    unit: &'a str,
    #[serde(flatten)]
    info: &'a BuildInfo,
}

pub fn execute(args: InfoArgs, global: &GlobalArgs) -> Result<()> {
    let session = Session::new(global)?;
    let path = session.config.info_record_path();
    if !path.exists() {
        bail!(
            "no info record at {}\n\
             hint: run `stevedore get` first",
            path.display()
        );
    }

    let entries = record::read(&path)?;
    let selected: Vec<&(String, BuildInfo)> = entries
        .iter()
        .filter(|(name, _)| args.unit.as_deref().map_or(true, |u| u == name.as_str()))
        .collect();

    if let Some(unit) = &args.unit {
        if selected.is_empty() {
            bail!("unit `{}` is not in the info record {}", unit, path.display());
        }
    }

    if args.json {
        let units: Vec<UnitInfo<'_>> = selected
            .iter()
            .map(|(unit, info)| UnitInfo { unit, info })
            .collect();
        println!("{}", serde_json::to_string_pretty(&units)?);
        return Ok(());
    }

    for (unit, info) in selected {
        println!("{}", unit);
        for (category, values) in info.iter() {
            if !values.is_empty() {
                println!("    {}: {}", category, values.join(" "));
            }
        }
    }

    Ok(())
}

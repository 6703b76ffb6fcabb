//! Per-run lifecycle status of a unit.

use std::fmt;

use anyhow::{bail, Result};

/// Where a unit is in the current run.
///
/// `Created -> Fetched -> Compiled -> Staged -> Verified`, with `Fetched`
/// skipped when fetching is disabled. Any state may move to `Failed`, which
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UnitStatus {
    #[default]
    Created,
    Fetched,
    Compiled,
    Staged,
    Verified,
    Failed,
}

impl UnitStatus {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: UnitStatus) -> bool {
        use UnitStatus::*;

        matches!(
            (self, next),
            (Created, Fetched)
                | (Created, Compiled)
                | (Fetched, Compiled)
                | (Compiled, Staged)
                | (Staged, Verified)
        ) || (next == Failed && self != Failed)
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn advance(&mut self, next: UnitStatus) -> Result<()> {
        if !self.can_transition_to(next) {
            bail!("illegal status transition {} -> {}", self, next);
        }
        *self = next;
        Ok(())
    }

    /// Whether Compile and Stage have completed.
    pub fn is_staged(self) -> bool {
        matches!(self, UnitStatus::Staged | UnitStatus::Verified)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitStatus::Created => "created",
            UnitStatus::Fetched => "fetched",
            UnitStatus::Compiled => "compiled",
            UnitStatus::Staged => "staged",
            UnitStatus::Verified => "verified",
            UnitStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

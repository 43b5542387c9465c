use crate::engine::Mode;
use crate::error::{Result, SweepError};
use std::ffi::OsString;

/// Opt-in toggle for delete mode. Must hold exactly `delete`; anything else
/// while set refuses to start. Printing is the only default anybody should
/// ever get by accident.
pub const DELETE_ENV: &str = "DSWEEP_DELETE";

/// Set (to anything) to get progress ticks and milestones on stderr.
pub const PROGRESS_ENV: &str = "DSWEEP_PROGRESS";

/// Overrides for the progress thresholds; positive integers.
pub const PROGRESS_MINOR_ENV: &str = "DSWEEP_PROGRESS_MINOR";
pub const PROGRESS_MAJOR_ENV: &str = "DSWEEP_PROGRESS_MAJOR";

/// Set to skip the `fstatat` fallback for `DT_UNKNOWN` records and drop such
/// entries instead. For filesystems where the stat storm costs more than the
/// unclassified stragglers are worth.
pub const NO_STAT_FALLBACK_ENV: &str = "DSWEEP_NO_STAT_FALLBACK";

/// Actions per tick.
pub const DEFAULT_PROGRESS_MINOR: u64 = 1000;
/// Ticks per milestone print.
pub const DEFAULT_PROGRESS_MAJOR: u64 = 50;

/**
 Everything a run decides before touching the filesystem, resolved from the
 environment in one place and passed explicitly from there on - no ambient
 process-wide mode flags.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: Mode,
    pub progress_enabled: bool,
    pub progress_minor: u64,
    pub progress_major: u64,
    pub stat_fallback: bool,
}

impl RunConfig {
    /**
     Reads the process environment.

     # Errors
     [`SweepError::DeleteToggle`] when the delete toggle is set to anything
     but the exact opt-in value, [`SweepError::Threshold`] for malformed
     interval overrides. Both fire before any filesystem work begins.
    */
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mode = match lookup(DELETE_ENV) {
            None => Mode::Print,
            Some(ref value) if value == "delete" => Mode::Unlink,
            Some(_) => return Err(SweepError::DeleteToggle),
        };
        let progress_minor = parse_interval(&lookup, PROGRESS_MINOR_ENV, DEFAULT_PROGRESS_MINOR)?;
        let progress_major = parse_interval(&lookup, PROGRESS_MAJOR_ENV, DEFAULT_PROGRESS_MAJOR)?;
        Ok(Self {
            mode,
            progress_enabled: lookup(PROGRESS_ENV).is_some(),
            progress_minor,
            progress_major,
            stat_fallback: lookup(NO_STAT_FALLBACK_ENV).is_none(),
        })
    }
}

fn parse_interval<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<OsString>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .to_str()
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|&interval| interval > 0)
            .ok_or(SweepError::Threshold(key)),
    }
}

use crate::config::RunConfig;
use std::io::{Stderr, Write, stderr};
use std::time::Duration;

/**
 Side-channel progress output, dentls-style: a `.` tick every `minor`
 actions, and the absolute running count as a milestone every
 `minor * major` actions.

 Milestones are preceded by a deliberate blocking pause so the terminal and
 any downstream log collector can catch up without starving the next batch
 of actions; ticks are cheap and fire as-is. Writes are best-effort - a lost
 dot on a broken stderr is not worth killing a multi-million-file unlink run
 over.

 When the reporter is disabled neither modulo is even evaluated.
*/
#[derive(Debug)]
pub struct ProgressReporter<W: Write> {
    enabled: bool,
    minor: u64,
    major: u64,
    pause: Duration,
    sink: W,
}

/// How long a milestone stalls the traversal before printing.
const MILESTONE_PAUSE: Duration = Duration::from_secs(1);

impl ProgressReporter<Stderr> {
    /// The production reporter: stderr sink, one second milestone pause.
    #[must_use]
    pub fn from_config(config: &RunConfig) -> Self {
        Self::with_sink(
            config.progress_enabled,
            config.progress_minor,
            config.progress_major,
            MILESTONE_PAUSE,
            stderr(),
        )
    }
}

impl<W: Write> ProgressReporter<W> {
    /// Fully parameterised constructor; tests inject a byte sink and a zero pause.
    #[must_use]
    pub fn with_sink(enabled: bool, minor: u64, major: u64, pause: Duration, sink: W) -> Self {
        debug_assert!(minor > 0 && major > 0, "thresholds are validated nonzero");
        Self {
            enabled,
            minor,
            major,
            pause,
            sink,
        }
    }

    #[cfg(test)]
    pub(crate) const fn sink_ref(&self) -> &W {
        &self.sink
    }

    /// Offers the running action count to the reporter after each action.
    pub fn observe(&mut self, count: u64) {
        if !self.enabled {
            return;
        }
        if count % self.minor.saturating_mul(self.major) == 0 {
            if !self.pause.is_zero() {
                std::thread::sleep(self.pause);
            }
            let _ = write!(self.sink, "\n{count}");
            let _ = self.sink.flush();
        } else if count % self.minor == 0 {
            let _ = self.sink.write_all(b".");
            let _ = self.sink.flush();
        }
    }
}

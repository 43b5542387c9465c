use crate::error::{Result, SweepError};
use crate::fs::{BufferPool, DirHandle, NameId};
use crate::index::NameIndex;
use crate::progress::ProgressReporter;
use std::io::Write;

/// What a traversal visit turns into. Fixed for the entire run, decided
/// before the traversal begins, never changed mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Emit each name to the output sink, one per line.
    Print,
    /// Remove each name from the filesystem.
    Unlink,
}

impl Mode {
    /// The word the run summary uses ("Performing print..." / "Performing delete...").
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Unlink => "delete",
        }
    }
}

/// Lifecycle of one engine run. `Failed` and `Completed` are terminal; the
/// engine is not reusable after either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Traversing,
    Completed,
    Failed,
}

/**
 Walks the sorted name index once and turns every visited name into exactly
 one observable effect: a line on the sink (print mode) or an `unlinkat`
 against the run's directory handle (delete mode).

 Failure of any single action kills the run: the counter and the progress
 stream already emitted are all the reporting a failed run gets, because
 skip-and-continue would leave the remaining deletions running against a
 half-rebalanced directory index and forfeit the ordering win.

 Generic over both writers so tests can capture the output and the progress
 side channel as plain byte vectors.
*/
#[derive(Debug)]
pub struct ActionEngine<'run, W: Write, P: Write> {
    pool: &'run BufferPool,
    dir: &'run DirHandle,
    mode: Mode,
    sink: W,
    progress: ProgressReporter<P>,
    actions: u64,
    state: EngineState,
}

impl<'run, W: Write, P: Write> ActionEngine<'run, W, P> {
    #[must_use]
    pub const fn new(
        pool: &'run BufferPool,
        dir: &'run DirHandle,
        mode: Mode,
        sink: W,
        progress: ProgressReporter<P>,
    ) -> Self {
        Self {
            pool,
            dir,
            mode,
            sink,
            progress,
            actions: 0,
            state: EngineState::Idle,
        }
    }

    /// Actions taken so far (equals names visited; mode-independent).
    #[inline]
    pub const fn actions(&self) -> u64 {
        self.actions
    }

    #[inline]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Consumes the engine and hands back the output sink.
    pub fn into_sink(self) -> W {
        self.sink
    }

    /**
     Runs the single full traversal.

     Returns the total number of actions taken. On any action failure the
     engine lands in [`EngineState::Failed`] and the error carries the
     offending name; on success it lands in [`EngineState::Completed`] with
     the sink flushed.
    */
    pub fn run(&mut self, index: &NameIndex) -> Result<u64> {
        debug_assert!(
            self.state == EngineState::Idle,
            "an engine drives exactly one traversal"
        );
        self.state = EngineState::Traversing;
        if let Err(error) = self.drain(index) {
            self.state = EngineState::Failed;
            return Err(error);
        }
        self.state = EngineState::Completed;
        Ok(self.actions)
    }

    fn drain(&mut self, index: &NameIndex) -> Result<()> {
        index.traverse(|id| self.act(id))?;
        self.sink.flush().map_err(SweepError::WriteError)
    }

    fn act(&mut self, id: NameId) -> Result<()> {
        match self.mode {
            Mode::Print => {
                self.sink
                    .write_all(self.pool.name(id))
                    .and_then(|()| self.sink.write_all(b"\n"))
                    .map_err(SweepError::WriteError)?;
            }
            Mode::Unlink => {
                self.dir
                    .unlink_name(self.pool.name_cstr(id))
                    .map_err(|source| SweepError::Unlink {
                        name: self.pool.name(id).into(),
                        source,
                    })?;
            }
        }
        self.actions += 1;
        self.progress.observe(self.actions);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SortOrder;
    use std::time::Duration;

    fn quiet_progress(sink: Vec<u8>) -> ProgressReporter<Vec<u8>> {
        ProgressReporter::with_sink(false, 1000, 50, Duration::ZERO, sink)
    }

    fn index_of(pool: &BufferPool, ids: &[NameId]) -> NameIndex {
        let mut index = NameIndex::new(SortOrder::Ascending);
        for &id in ids {
            index.insert(id, pool).unwrap();
        }
        index
    }

    #[test]
    fn print_mode_emits_sorted_lines_and_completes() {
        let scratch = std::env::temp_dir().join("dsweep_engine_print_test");
        let _ = std::fs::remove_dir_all(&scratch);
        std::fs::create_dir_all(&scratch).unwrap();
        let dir = DirHandle::open(scratch.as_os_str()).unwrap();

        let (pool, ids) = BufferPool::from_names(&[b"zeta", b"alpha", b"mid"]);
        let index = index_of(&pool, &ids);

        let mut engine = ActionEngine::new(
            &pool,
            &dir,
            Mode::Print,
            Vec::new(),
            quiet_progress(Vec::new()),
        );
        assert_eq!(engine.state(), EngineState::Idle);
        let actions = engine.run(&index).unwrap();
        assert_eq!(actions, 3);
        assert_eq!(engine.state(), EngineState::Completed);
        assert_eq!(engine.sink, b"alpha\nmid\nzeta\n".to_vec());

        let _ = std::fs::remove_dir_all(&scratch);
    }

    #[test]
    fn unlink_failure_is_fatal_and_names_the_culprit() {
        let scratch = std::env::temp_dir().join("dsweep_engine_fail_test");
        let _ = std::fs::remove_dir_all(&scratch);
        std::fs::create_dir_all(&scratch).unwrap();
        std::fs::write(scratch.join("exists-a"), "x").unwrap();
        let dir = DirHandle::open(scratch.as_os_str()).unwrap();

        // "ghost" sorts after "exists-a", so one action succeeds first
        let (pool, ids) = BufferPool::from_names(&[b"ghost", b"exists-a"]);
        let index = index_of(&pool, &ids);

        let mut engine = ActionEngine::new(
            &pool,
            &dir,
            Mode::Unlink,
            Vec::new(),
            quiet_progress(Vec::new()),
        );
        let error = engine.run(&index).unwrap_err();
        assert_eq!(engine.state(), EngineState::Failed);
        assert_eq!(engine.actions(), 1);
        match error {
            SweepError::Unlink { name, .. } => assert_eq!(&*name, b"ghost".as_slice()),
            other => panic!("expected Unlink error, got {other}"),
        }
        assert!(!scratch.join("exists-a").exists());

        let _ = std::fs::remove_dir_all(&scratch);
    }

    #[test]
    fn progress_observes_every_action() {
        let scratch = std::env::temp_dir().join("dsweep_engine_progress_test");
        let _ = std::fs::remove_dir_all(&scratch);
        std::fs::create_dir_all(&scratch).unwrap();
        let dir = DirHandle::open(scratch.as_os_str()).unwrap();

        let names: Vec<Vec<u8>> = (0..6u8).map(|n| vec![b'f', b'0' + n]).collect();
        let borrowed: Vec<&[u8]> = names.iter().map(Vec::as_slice).collect();
        let (pool, ids) = BufferPool::from_names(&borrowed);
        let index = index_of(&pool, &ids);

        let progress = ProgressReporter::with_sink(true, 2, 2, Duration::ZERO, Vec::new());
        let mut engine = ActionEngine::new(&pool, &dir, Mode::Print, Vec::new(), progress);
        engine.run(&index).unwrap();
        // 6 actions with minor=2, major=2: tick at 2, milestone at 4, tick at 6
        assert_eq!(engine.progress.sink_ref(), &b".\n4.".to_vec());

        let _ = std::fs::remove_dir_all(&scratch);
    }
}

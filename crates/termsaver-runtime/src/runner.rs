#![forbid(unsafe_code)]

//! Frame driver for a single effect.
//!
//! [`EffectRunner`] pulls frames from a borrowed sequence and writes them to
//! the terminal until one of four things happens:
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | input pending (or interrupt raised) | [`RunOutcome::StoppedByInput`] |
//! | elapsed time exceeds the deadline | [`RunOutcome::StoppedByTimeout`] |
//! | sequence exhausted | [`RunOutcome::Completed`] |
//! | producing or writing a frame failed | [`RunOutcome::Failed`] |
//!
//! Input and deadline are checked before every frame is pulled, never after
//! a write, so at most one frame is flushed after a stop condition arises.
//! The deadline is wall-clock and re-evaluated once per frame: a slow frame
//! producer can overrun it by the cost of one frame.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::{QueueableCommand, cursor};
use termsaver_core::InputSource;

use crate::catalog::FrameResult;
use crate::error::EffectRuntimeError;

/// Monotonic time source.
pub trait Clock {
    /// Time since an arbitrary fixed epoch.
    fn now(&self) -> Duration;
}

/// Clock backed by `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Why a single effect stopped.
#[derive(Debug)]
pub enum RunOutcome {
    /// The frame sequence ran out.
    Completed,
    /// The user pressed a key or an interrupt was raised.
    StoppedByInput,
    /// The per-effect duration elapsed.
    StoppedByTimeout,
    /// Producing or writing a frame failed.
    Failed(EffectRuntimeError),
}

impl RunOutcome {
    /// Whether this outcome ends the whole screensaver run.
    pub fn is_stop_request(&self) -> bool {
        matches!(self, Self::StoppedByInput)
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::StoppedByInput => "stopped_by_input",
            Self::StoppedByTimeout => "stopped_by_timeout",
            Self::Failed(_) => "failed",
        }
    }
}

/// Outcome of one effect plus what it cost.
#[derive(Debug)]
pub struct EffectRun {
    pub outcome: RunOutcome,
    /// Frames written before the run stopped.
    pub frames_written: usize,
    /// Time from start to stop, as measured by the runner's clock.
    pub elapsed: Duration,
}

impl EffectRun {
    /// A run that failed before any frame was pulled.
    pub fn failed(err: EffectRuntimeError) -> Self {
        Self {
            outcome: RunOutcome::Failed(err),
            frames_written: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Stateless driver over a frame sequence.
pub struct EffectRunner {
    clock: Box<dyn Clock>,
}

impl EffectRunner {
    /// Runner measuring time with [`MonotonicClock`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }

    /// Runner measuring time with `clock`.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
        }
    }

    /// Drive `frames` and return only the outcome.
    pub fn run(
        &self,
        frames: &mut dyn Iterator<Item = FrameResult>,
        deadline: Duration,
        watcher: &mut dyn InputSource,
        out: &mut dyn Write,
    ) -> RunOutcome {
        self.drive(frames, deadline, watcher, out).outcome
    }

    /// Drive `frames` to `out` until input, deadline, exhaustion or failure.
    pub fn drive(
        &self,
        frames: &mut dyn Iterator<Item = FrameResult>,
        deadline: Duration,
        watcher: &mut dyn InputSource,
        out: &mut dyn Write,
    ) -> EffectRun {
        let start = self.clock.now();
        let mut frames_written = 0usize;

        let outcome = loop {
            if watcher.has_input(Duration::ZERO) {
                break RunOutcome::StoppedByInput;
            }

            if self.clock.now().saturating_sub(start) > deadline {
                break RunOutcome::StoppedByTimeout;
            }

            let frame = match frames.next() {
                None => break RunOutcome::Completed,
                Some(Err(err)) => break RunOutcome::Failed(err),
                Some(Ok(frame)) => frame,
            };

            if let Err(err) = write_frame(out, &frame) {
                break RunOutcome::Failed(EffectRuntimeError::Io(err));
            }
            frames_written += 1;
        };

        let elapsed = self.clock.now().saturating_sub(start);
        tracing::trace!(
            outcome = outcome.label(),
            frames_written,
            elapsed_ms = elapsed.as_millis() as u64,
            "frame loop finished"
        );
        EffectRun {
            outcome,
            frames_written,
            elapsed,
        }
    }
}

impl Default for EffectRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EffectRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRunner").finish_non_exhaustive()
    }
}

/// Home the cursor and paint one frame over the previous one.
fn write_frame(out: &mut dyn Write, frame: &str) -> io::Result<()> {
    out.queue(cursor::MoveTo(0, 0))?;
    out.write_all(frame.as_bytes())?;
    out.flush()
}

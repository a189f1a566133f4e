#![forbid(unsafe_code)]

//! Deterministic doubles for exercising the runtime without a terminal.
//!
//! - [`ScriptedInput`] reports input after a fixed number of polls.
//! - [`StepClock`] advances by a fixed step on every read.
//! - [`RecordingTty`] counts cbreak entries and restorations.
//! - [`SharedBuffer`] is a cloneable in-memory writer.
//! - [`frames`], [`endless`] and [`failing_after`] build frame sequences.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use termsaver_runtime::runner::{EffectRunner, RunOutcome};
//! use termsaver_runtime::testing::{ScriptedInput, frames};
//!
//! let runner = EffectRunner::new();
//! let mut seq = frames(&["a", "b"]);
//! let mut input = ScriptedInput::never();
//! let mut out = Vec::new();
//! let outcome = runner.run(&mut seq, Duration::from_secs(1), &mut input, &mut out);
//! assert!(matches!(outcome, RunOutcome::Completed));
//! ```

use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

use termsaver_core::{InputSource, TtyMode};

use crate::catalog::{EffectCatalog, FrameSequence};
use crate::error::EffectRuntimeError;
use crate::runner::Clock;

/// Input source that turns on after a fixed number of quiet polls.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    quiet_polls: Option<usize>,
    polls: Rc<Cell<usize>>,
}

impl ScriptedInput {
    /// Never reports input.
    #[must_use]
    pub fn never() -> Self {
        Self::default()
    }

    /// Reports no input for `quiet` polls, then input on every later poll.
    #[must_use]
    pub fn after_polls(quiet: usize) -> Self {
        Self {
            quiet_polls: Some(quiet),
            polls: Rc::default(),
        }
    }

    /// Number of polls so far, shared between clones.
    pub fn polls(&self) -> usize {
        self.polls.get()
    }
}

impl InputSource for ScriptedInput {
    fn has_input(&mut self, _timeout: Duration) -> bool {
        let seen = self.polls.get();
        self.polls.set(seen + 1);
        self.quiet_polls.is_some_and(|quiet| seen >= quiet)
    }
}

/// Clock that returns `step * n` on its n-th read (starting at zero).
#[derive(Debug, Clone)]
pub struct StepClock {
    step: Duration,
    now: Rc<Cell<Duration>>,
}

impl StepClock {
    #[must_use]
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            now: Rc::default(),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Duration {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Counters shared between a [`RecordingTty`] and the test holding a clone.
#[derive(Debug, Default)]
pub struct TtyCounters {
    pub enters: Cell<usize>,
    pub restores: Cell<usize>,
}

/// Tty double that records mode transitions.
#[derive(Debug, Clone)]
pub struct RecordingTty {
    interactive: bool,
    saved: bool,
    counters: Rc<TtyCounters>,
}

impl RecordingTty {
    /// A tty reporting itself as interactive.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            interactive: true,
            saved: false,
            counters: Rc::default(),
        }
    }

    /// A tty reporting itself as redirected.
    #[must_use]
    pub fn redirected() -> Self {
        Self {
            interactive: false,
            ..Self::interactive()
        }
    }

    pub fn counters(&self) -> Rc<TtyCounters> {
        Rc::clone(&self.counters)
    }

    /// Whether cbreak is currently recorded as entered.
    pub fn in_cbreak(&self) -> bool {
        self.saved
    }
}

impl TtyMode for RecordingTty {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn enter_cbreak(&mut self) -> io::Result<()> {
        self.saved = true;
        self.counters.enters.set(self.counters.enters.get() + 1);
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.saved {
            self.saved = false;
            self.counters.restores.set(self.counters.restores.get() + 1);
        }
        Ok(())
    }
}

/// Cloneable in-memory writer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A finite sequence of fixed frames.
pub fn frames(texts: &[&str]) -> FrameSequence {
    let owned: Vec<_> = texts.iter().map(|t| Ok((*t).to_owned())).collect();
    Box::new(owned.into_iter())
}

/// A sequence that never runs out: `text0`, `text1`, ...
pub fn endless(text: &str) -> FrameSequence {
    let text = text.to_owned();
    Box::new((0usize..).map(move |i| Ok(format!("{text}{i}"))))
}

/// `ok` good frames, then one error, then nothing.
pub fn failing_after(ok: usize, message: &str) -> FrameSequence {
    let message = message.to_owned();
    let good = (0..ok).map(|i| Ok(format!("frame{i}")));
    let bad = std::iter::once(Err(EffectRuntimeError::Frame(message)));
    Box::new(good.chain(bad))
}

/// Catalog whose effects each yield `len` frames named after the effect.
pub fn finite_catalog(ids: &[&str], len: usize) -> EffectCatalog {
    ids.iter().fold(EffectCatalog::new(), |catalog, id| {
        let id = (*id).to_owned();
        let name = id.clone();
        catalog.with(id, move |_: &str| {
            let name = name.clone();
            Ok(Box::new((0..len).map(move |i| Ok(format!("{name}:{i}")))) as FrameSequence)
        })
    })
}

/// Catalog whose effects all fail on their first frame.
pub fn failing_catalog(ids: &[&str]) -> EffectCatalog {
    ids.iter().fold(EffectCatalog::new(), |catalog, id| {
        catalog.with(*id, |_: &str| Ok(failing_after(0, "boom")))
    })
}

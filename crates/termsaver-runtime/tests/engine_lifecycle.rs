//! Terminal restoration on every exit path of the engine.
//!
//! Each test drives a full `ScreensaverEngine::run` against an in-memory
//! terminal and a recording tty, then checks that the session was
//! deactivated exactly once, the cursor was shown exactly once, and cbreak
//! mode was restored exactly once.

use std::io::{self, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::time::Duration;

use termsaver_core::{InputSource, InputWatcher, InterruptFlag, SessionOptions, TerminalSession};
use termsaver_runtime::testing::{
    RecordingTty, ScriptedInput, SharedBuffer, StepClock, TtyCounters, failing_catalog,
    finite_catalog,
};
use termsaver_runtime::{
    CycleMode, EffectCatalog, EngineConfig, EngineState, FrameSequence, ScreensaverEngine,
    StopReason,
};

const SHOW_CURSOR: &str = "\x1b[?25h";
const LEAVE_ALT_SCREEN: &str = "\x1b[?1049l";

struct Harness {
    out: SharedBuffer,
    diagnostics: SharedBuffer,
    counters: Rc<TtyCounters>,
}

impl Harness {
    fn assert_restored_once(&self) {
        let out = self.out.contents();
        assert_eq!(out.matches(SHOW_CURSOR).count(), 1, "cursor shown once");
        assert_eq!(out.matches(LEAVE_ALT_SCREEN).count(), 1, "alt screen left once");
        assert!(out.ends_with(&format!("{SHOW_CURSOR}{LEAVE_ALT_SCREEN}")));
        assert_eq!(self.counters.enters.get(), 1);
        assert_eq!(self.counters.restores.get(), 1);
    }
}

fn build<I: InputSource>(
    catalog: EffectCatalog,
    input: I,
) -> (ScreensaverEngine<SharedBuffer, RecordingTty, I>, Harness) {
    let out = SharedBuffer::new();
    let diagnostics = SharedBuffer::new();
    let tty = RecordingTty::interactive();
    let counters = tty.counters();
    let session = TerminalSession::new(out.clone(), tty, SessionOptions::default());
    let config = EngineConfig {
        cycle_mode: CycleMode::Sequential,
        ..EngineConfig::default()
    };
    let engine = ScreensaverEngine::new(config, catalog, "HELLO", session, input)
        .expect("valid config")
        .with_clock(StepClock::new(Duration::from_millis(1)))
        .with_diagnostics(diagnostics.clone())
        .with_failure_backoff(Duration::ZERO);
    (
        engine,
        Harness {
            out,
            diagnostics,
            counters,
        },
    )
}

#[test]
fn keystroke_stop_restores_terminal_once() {
    let (mut engine, harness) =
        build(finite_catalog(&["a", "b"], 3), ScriptedInput::after_polls(5));

    let report = engine.run().expect("run");

    assert_eq!(report.stop_reason, StopReason::Input);
    assert_eq!(engine.state(), EngineState::Draining);
    assert_eq!(engine.session().activations(), 1);
    assert_eq!(engine.session().deactivations(), 1);
    harness.assert_restored_once();
    assert!(harness.diagnostics.contents().is_empty());
}

#[test]
fn interrupt_mid_effect_restores_terminal_once() {
    let flag = InterruptFlag::new();
    let raiser = flag.clone();
    let catalog = EffectCatalog::new().with("signal", move |_: &str| {
        let raiser = raiser.clone();
        let frames = (0usize..).map(move |i| {
            if i == 2 {
                raiser.raise();
            }
            Ok(format!("frame{i}"))
        });
        Ok(Box::new(frames) as FrameSequence)
    });
    let watcher = InputWatcher::detached().with_interrupt(flag.clone());
    let (engine, harness) = build(catalog, watcher);
    let mut engine = engine.with_interrupt(flag);

    let report = engine.run().expect("run");

    assert_eq!(report.stop_reason, StopReason::Interrupt);
    assert_eq!(report.effects_started, 1);
    let out = harness.out.contents();
    assert!(out.contains("frame2"));
    assert!(!out.contains("frame3"));
    assert_eq!(engine.session().deactivations(), 1);
    harness.assert_restored_once();
}

#[test]
fn every_effect_failing_still_restores_terminal_once() {
    let (mut engine, harness) = build(failing_catalog(&["x", "y"]), ScriptedInput::after_polls(6));

    let report = engine.run().expect("run");

    assert_eq!(report.failures, 3);
    assert_eq!(report.completed, 0);
    assert_eq!(engine.session().deactivations(), 1);
    harness.assert_restored_once();

    let diagnostics = harness.diagnostics.contents();
    let lines: Vec<&str> = diagnostics.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("termsaver: effect 'x' failed:"));
    assert!(lines[1].starts_with("termsaver: effect 'y' failed:"));
    // Failures go to the diagnostics stream, never to the animated surface.
    assert!(!harness.out.contents().contains("failed"));
}

#[test]
fn panic_inside_effect_restores_terminal_on_drop() {
    let catalog = EffectCatalog::new().with("explodes", |_: &str| {
        let frames = (0usize..).map(|i| {
            assert!(i < 1, "effect blew up");
            Ok(format!("frame{i}"))
        });
        Ok(Box::new(frames) as FrameSequence)
    });
    let (mut engine, harness) = build(catalog, ScriptedInput::never());

    let result = catch_unwind(AssertUnwindSafe(|| engine.run()));
    assert!(result.is_err());
    assert!(engine.session().is_active());

    drop(engine);
    harness.assert_restored_once();
}

struct ClosedTerminal;

impl Write for ClosedTerminal {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
    }
}

#[test]
fn activation_failure_is_returned_after_draining() {
    let tty = RecordingTty::interactive();
    let counters = tty.counters();
    let session = TerminalSession::new(ClosedTerminal, tty, SessionOptions::default());
    let mut engine = ScreensaverEngine::new(
        EngineConfig::default(),
        finite_catalog(&["a"], 1),
        "HELLO",
        session,
        ScriptedInput::never(),
    )
    .expect("valid config");

    let err = engine.run().expect_err("activation must fail");

    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    assert_eq!(engine.state(), EngineState::Draining);
    assert!(!engine.session().is_active());
    assert_eq!(engine.session().deactivations(), 1);
    // The write failed before cbreak was requested.
    assert_eq!(counters.enters.get(), 0);
}

#[test]
fn redirected_tty_is_never_switched_to_cbreak() {
    let out = SharedBuffer::new();
    let tty = RecordingTty::redirected();
    let counters = tty.counters();
    let session = TerminalSession::new(out.clone(), tty, SessionOptions::default());
    let mut engine = ScreensaverEngine::new(
        EngineConfig::default(),
        finite_catalog(&["a"], 1),
        "HELLO",
        session,
        ScriptedInput::after_polls(2),
    )
    .expect("valid config");

    engine.run().expect("run");

    assert_eq!(counters.enters.get(), 0);
    assert_eq!(counters.restores.get(), 0);
    assert_eq!(out.contents().matches(SHOW_CURSOR).count(), 1);
}

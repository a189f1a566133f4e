#![forbid(unsafe_code)]

//! The screensaver loop.
//!
//! [`ScreensaverEngine`] owns the terminal session, the selector, the
//! catalog and the art. [`run`](ScreensaverEngine::run) cycles effects
//! until the input source reports a keystroke (or a raised interrupt), then
//! restores the terminal.
//!
//! # State machine
//!
//! ```text
//!            activate once
//!   Idle ───────────────────► RunningEffect
//!    ▲                            │
//!    │ Completed / Timeout /      │ StoppedByInput
//!    │ Failed (reported)          ▼
//!    └─────────────────────── Stopped ───► Draining (deactivate, return)
//! ```
//!
//! Draining is reached on every exit path, including an I/O error while
//! activating the session. A panic inside an effect unwinds through the
//! engine and the session's `Drop` performs the same restoration.

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use termsaver_core::{InputSource, InterruptFlag, TerminalSession, TtyMode};

use crate::catalog::EffectCatalog;
use crate::error::{ConfigurationError, EffectRuntimeError};
use crate::runner::{Clock, EffectRun, EffectRunner, RunOutcome};
use crate::selector::{CycleMode, EffectSelector};

/// Per-effect duration when none is configured.
pub const DEFAULT_EFFECT_DURATION: Duration = Duration::from_secs(30);

/// How long to wait for input after a failed effect before the next one.
pub const DEFAULT_FAILURE_BACKOFF: Duration = Duration::from_millis(250);

/// Plain, already-validated engine parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Explicit enabled list. `None` (or empty) means the catalog defaults.
    pub enabled: Option<Vec<String>>,
    /// Ids removed from the enabled set.
    pub excluded: Vec<String>,
    pub cycle_mode: CycleMode,
    /// Wall-clock budget for one effect. Must be non-zero.
    pub effect_duration: Duration,
    /// Seed for the random cycle mode.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            excluded: Vec::new(),
            cycle_mode: CycleMode::default(),
            effect_duration: DEFAULT_EFFECT_DURATION,
            seed: None,
        }
    }
}

/// Where the engine is in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Between effects.
    Idle,
    /// An effect's frames are being driven.
    RunningEffect,
    /// A stop was requested; the terminal is not yet restored.
    Stopped,
    /// The terminal has been restored. Terminal state.
    Draining,
}

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// A keystroke arrived.
    #[default]
    Input,
    /// The interrupt flag was raised (SIGINT/SIGTERM).
    Interrupt,
}

/// Tally of one call to [`ScreensaverEngine::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Effects selected, including the one interrupted by the stop.
    pub effects_started: usize,
    /// Effects whose frame sequence ran out.
    pub completed: usize,
    /// Effects cut off by the per-effect duration.
    pub timed_out: usize,
    /// Effects that failed to build, produce or write a frame.
    pub failures: usize,
    pub stop_reason: StopReason,
}

/// Top-level loop cycling effects over the terminal.
pub struct ScreensaverEngine<W: Write, M: TtyMode, I: InputSource> {
    selector: EffectSelector,
    catalog: EffectCatalog,
    art: String,
    effect_duration: Duration,
    failure_backoff: Duration,
    runner: EffectRunner,
    session: TerminalSession<W, M>,
    input: I,
    interrupt: Option<InterruptFlag>,
    diagnostics: Box<dyn Write>,
    state: EngineState,
}

impl<W: Write, M: TtyMode, I: InputSource> ScreensaverEngine<W, M, I> {
    /// Validate `config` against `catalog` and assemble the engine.
    ///
    /// Nothing is written to the terminal here.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::InvalidDuration`] for a zero duration and
    /// [`ConfigurationError::NoEffectsEnabled`] when filtering leaves no
    /// effect.
    pub fn new(
        config: EngineConfig,
        catalog: EffectCatalog,
        art: impl Into<String>,
        session: TerminalSession<W, M>,
        input: I,
    ) -> Result<Self, ConfigurationError> {
        if config.effect_duration.is_zero() {
            return Err(ConfigurationError::InvalidDuration);
        }

        let mut selector = EffectSelector::new(
            &catalog,
            config.enabled.as_deref(),
            &config.excluded,
            config.cycle_mode,
        )?;
        if let Some(seed) = config.seed {
            selector = selector.with_seed(seed);
        }

        Ok(Self {
            selector,
            catalog,
            art: art.into(),
            effect_duration: config.effect_duration,
            failure_backoff: DEFAULT_FAILURE_BACKOFF,
            runner: EffectRunner::new(),
            session,
            input,
            interrupt: None,
            diagnostics: Box::new(io::stderr()),
            state: EngineState::Idle,
        })
    }

    /// Measure effect durations with `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.runner = EffectRunner::with_clock(clock);
        self
    }

    /// Send failure messages to `writer` instead of stderr.
    #[must_use]
    pub fn with_diagnostics(mut self, writer: impl Write + 'static) -> Self {
        self.diagnostics = Box::new(writer);
        self
    }

    /// Wait up to `backoff` for input after each failed effect.
    #[must_use]
    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.failure_backoff = backoff;
        self
    }

    /// Report [`StopReason::Interrupt`] when `flag` is raised at stop time.
    ///
    /// The flag itself must also reach the input source for the stop to
    /// happen; this only affects the report.
    #[must_use]
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Cycle effects until a stop is requested, then restore the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error only if the session cannot be activated. The
    /// terminal is restored before the error is returned.
    pub fn run(&mut self) -> io::Result<RunReport> {
        let mut report = RunReport::default();
        let result = self.cycle(&mut report);

        self.state = EngineState::Stopped;
        report.stop_reason = match &self.interrupt {
            Some(flag) if flag.is_raised() => StopReason::Interrupt,
            _ => StopReason::Input,
        };

        self.state = EngineState::Draining;
        self.session.deactivate();

        tracing::info!(
            effects = report.effects_started,
            failures = report.failures,
            reason = ?report.stop_reason,
            "screensaver stopped"
        );
        result.map(|()| report)
    }

    fn cycle(&mut self, report: &mut RunReport) -> io::Result<()> {
        self.session.activate()?;

        loop {
            self.state = EngineState::Idle;
            let id = self.selector.next();
            tracing::debug!(effect = %id, "effect selected");

            self.state = EngineState::RunningEffect;
            report.effects_started += 1;
            let run = self.run_effect(&id);
            tracing::info!(
                effect = %id,
                outcome = run.outcome.label(),
                frames = run.frames_written,
                elapsed_ms = run.elapsed.as_millis() as u64,
                "effect finished"
            );

            match run.outcome {
                RunOutcome::StoppedByInput => return Ok(()),
                RunOutcome::Completed => report.completed += 1,
                RunOutcome::StoppedByTimeout => report.timed_out += 1,
                RunOutcome::Failed(err) => {
                    report.failures += 1;
                    self.report_failure(&id, &err);
                    if self.input.has_input(self.failure_backoff) {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn run_effect(&mut self, id: &str) -> EffectRun {
        if let Err(err) = self.session.clear_screen() {
            return EffectRun::failed(err.into());
        }
        let mut frames = match self.catalog.build(id, &self.art) {
            Ok(frames) => frames,
            Err(err) => return EffectRun::failed(err),
        };
        self.runner.drive(
            frames.as_mut(),
            self.effect_duration,
            &mut self.input,
            self.session.output_mut(),
        )
    }

    fn report_failure(&mut self, id: &str, err: &EffectRuntimeError) {
        tracing::warn!(effect = %id, error = %err, "effect failed");
        let _ = writeln!(self.diagnostics, "termsaver: effect '{id}' failed: {err}");
        let _ = self.diagnostics.flush();
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn session(&self) -> &TerminalSession<W, M> {
        &self.session
    }

    pub fn selector(&self) -> &EffectSelector {
        &self.selector
    }
}

impl<W: Write, M: TtyMode, I: InputSource> fmt::Debug for ScreensaverEngine<W, M, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreensaverEngine")
            .field("state", &self.state)
            .field("enabled", &self.selector.list_enabled())
            .field("mode", &self.selector.mode())
            .field("effect_duration", &self.effect_duration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedInput, SharedBuffer, StepClock, failing_catalog, finite_catalog};
    use termsaver_core::{Detached, SessionOptions};

    type TestEngine = ScreensaverEngine<SharedBuffer, Detached, ScriptedInput>;

    fn engine(config: EngineConfig, catalog: EffectCatalog, input: ScriptedInput) -> TestEngine {
        let session =
            TerminalSession::new(SharedBuffer::new(), Detached, SessionOptions::default());
        ScreensaverEngine::new(config, catalog, "ART", session, input)
            .unwrap()
            .with_clock(StepClock::new(Duration::from_millis(1)))
            .with_diagnostics(SharedBuffer::new())
            .with_failure_backoff(Duration::ZERO)
    }

    fn sequential() -> EngineConfig {
        EngineConfig {
            cycle_mode: CycleMode::Sequential,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.effect_duration, Duration::from_secs(30));
        assert_eq!(config.cycle_mode, CycleMode::Random);
        assert!(config.enabled.is_none());
    }

    #[test]
    fn zero_duration_is_rejected_before_touching_the_terminal() {
        let out = SharedBuffer::new();
        let session = TerminalSession::new(out.clone(), Detached, SessionOptions::default());
        let config = EngineConfig {
            effect_duration: Duration::ZERO,
            ..EngineConfig::default()
        };
        let err = ScreensaverEngine::new(
            config,
            finite_catalog(&["a"], 1),
            "ART",
            session,
            ScriptedInput::never(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidDuration);
        assert!(out.contents().is_empty());
    }

    #[test]
    fn empty_enabled_set_is_rejected() {
        let session =
            TerminalSession::new(SharedBuffer::new(), Detached, SessionOptions::default());
        let config = EngineConfig {
            excluded: vec!["a".into()],
            ..EngineConfig::default()
        };
        let result = ScreensaverEngine::new(
            config,
            finite_catalog(&["a"], 1),
            "ART",
            session,
            ScriptedInput::never(),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::NoEffectsEnabled { .. })
        ));
    }

    #[test]
    fn effects_run_in_sequence_until_input() {
        // Each effect: one poll per frame plus one before the exhausted pull.
        // Two frames per effect means three polls per completed effect.
        let mut engine = engine(
            sequential(),
            finite_catalog(&["a", "b"], 2),
            ScriptedInput::after_polls(6),
        );
        let report = engine.run().unwrap();

        assert_eq!(report.completed, 2);
        assert_eq!(report.effects_started, 3);
        assert_eq!(report.stop_reason, StopReason::Input);
        assert_eq!(engine.state(), EngineState::Draining);
        assert!(!engine.session().is_active());

        let out = engine.session().output().contents();
        let a = out.find("a:1").unwrap();
        let b = out.find("b:0").unwrap();
        assert!(a < b);
    }

    #[test]
    fn screen_is_cleared_before_each_effect() {
        let mut engine = engine(
            sequential(),
            finite_catalog(&["a"], 1),
            ScriptedInput::after_polls(4),
        );
        engine.run().unwrap();
        let out = engine.session().output().contents();
        assert_eq!(out.matches("\x1b[2J").count(), 3);
    }

    #[test]
    fn timeouts_advance_to_the_next_effect() {
        let config = EngineConfig {
            effect_duration: Duration::from_millis(3),
            ..sequential()
        };
        let catalog =
            EffectCatalog::new().with("forever", |_: &str| Ok(crate::testing::endless("x")));
        let mut engine = engine(config, catalog, ScriptedInput::after_polls(10));
        let report = engine.run().unwrap();
        assert!(report.timed_out >= 1);
        assert_eq!(report.failures, 0);
    }

    #[test]
    fn failures_are_reported_and_the_loop_continues() {
        let diagnostics = SharedBuffer::new();
        let mut engine = engine(
            sequential(),
            failing_catalog(&["bad"]),
            ScriptedInput::after_polls(4),
        )
        .with_diagnostics(diagnostics.clone());
        let report = engine.run().unwrap();

        // Runner poll plus backoff poll per failure: two failures, then stop.
        assert_eq!(report.failures, 2);
        assert_eq!(report.effects_started, 3);
        let text = diagnostics.contents();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("termsaver: effect 'bad' failed: frame production failed: boom"));
    }

    #[test]
    fn build_error_counts_as_failure() {
        let catalog = EffectCatalog::new().with("picky", |_: &str| {
            Err(EffectRuntimeError::Build("art too wide".into()))
        });
        let mut engine = engine(sequential(), catalog, ScriptedInput::after_polls(0));
        let report = engine.run().unwrap();
        assert_eq!(report.failures, 1);
        assert_eq!(report.effects_started, 1);
    }

    #[test]
    fn raised_interrupt_is_reported() {
        let flag = InterruptFlag::new();
        flag.raise();
        let mut engine = engine(
            sequential(),
            finite_catalog(&["a"], 1),
            ScriptedInput::after_polls(0),
        )
        .with_interrupt(flag);
        let report = engine.run().unwrap();
        assert_eq!(report.stop_reason, StopReason::Interrupt);
        assert_eq!(report.effects_started, 1);
    }

    #[test]
    fn seeded_engines_pick_the_same_effects() {
        let config = EngineConfig {
            seed: Some(99),
            ..EngineConfig::default()
        };
        let picks = |config: EngineConfig| {
            let mut engine = engine(
                config,
                finite_catalog(&["a", "b", "c", "d"], 1),
                ScriptedInput::after_polls(8),
            );
            engine.run().unwrap();
            engine.session().output().contents()
        };
        assert_eq!(picks(config.clone()), picks(config));
    }
}

#![forbid(unsafe_code)]

//! termsaver runtime
//!
//! Cycles externally supplied text effects over a piece of ASCII art.
//!
//! # Key Components
//!
//! - [`EffectCatalog`] - Registry from effect id to frame-sequence factory
//! - [`EffectSelector`] - Picks the next effect (sequential or anti-repeat random)
//! - [`EffectRunner`] - Drives one frame sequence against a deadline and input
//! - [`ScreensaverEngine`] - The top-level loop owning the terminal session
//!
//! # Data flow
//!
//! Engine -> selector (pick id) -> catalog (id, art -> frames) -> runner
//! (pull frames, poll input, write) -> engine (continue or stop).

pub mod catalog;
pub mod engine;
pub mod error;
pub mod runner;
pub mod selector;
pub mod testing;

pub use catalog::{EffectCatalog, EffectFactory, Frame, FrameResult, FrameSequence};
pub use engine::{EngineConfig, EngineState, RunReport, ScreensaverEngine, StopReason};
pub use error::{ConfigurationError, EffectRuntimeError};
pub use runner::{Clock, EffectRun, EffectRunner, MonotonicClock, RunOutcome};
pub use selector::{CycleMode, EffectSelector, MAX_RECENT};

#![forbid(unsafe_code)]

//! Error types for the screensaver runtime.
//!
//! Two kinds of failure exist:
//!
//! - [`ConfigurationError`] is fatal and surfaces from engine construction,
//!   before the terminal is touched.
//! - [`EffectRuntimeError`] is local to one effect. The runner reports it as
//!   [`RunOutcome::Failed`](crate::runner::RunOutcome::Failed) and the engine
//!   moves on to the next effect.

use std::io;

/// The engine cannot be built from the given parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Filtering left no effect to cycle through.
    NoEffectsEnabled {
        /// The explicit enabled list, if one was given.
        requested: Option<Vec<String>>,
        /// The excluded list.
        excluded: Vec<String>,
    },
    /// The per-effect duration was zero.
    InvalidDuration,
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoEffectsEnabled {
                requested,
                excluded,
            } => {
                write!(f, "no effects enabled; at least one effect must be available")?;
                if let Some(requested) = requested {
                    write!(f, " (requested: {})", requested.join(", "))?;
                }
                if !excluded.is_empty() {
                    write!(f, " (excluded: {})", excluded.join(", "))?;
                }
                Ok(())
            }
            Self::InvalidDuration => write!(f, "effect duration must be positive"),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// One effect failed while building or rendering its frames.
#[derive(Debug)]
pub enum EffectRuntimeError {
    /// The selected id has no factory in the catalog.
    UnknownEffect(String),
    /// The factory refused to build a frame sequence for the art.
    Build(String),
    /// The frame sequence yielded an error.
    Frame(String),
    /// Clearing the screen or writing a frame failed.
    Io(io::Error),
}

impl std::fmt::Display for EffectRuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEffect(id) => write!(f, "unknown effect '{id}'"),
            Self::Build(msg) => write!(f, "effect setup failed: {msg}"),
            Self::Frame(msg) => write!(f, "frame production failed: {msg}"),
            Self::Io(err) => write!(f, "terminal write failed: {err}"),
        }
    }
}

impl std::error::Error for EffectRuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for EffectRuntimeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#![forbid(unsafe_code)]

//! termsaver
//!
//! The runnable screensaver: command-line options, the art to animate, the
//! built-in effect catalog and opt-in tracing. The cycling engine itself
//! lives in `termsaver-runtime`; terminal handling in `termsaver-core`.

pub mod cli;
pub mod content;
pub mod effects;
pub mod logging;

pub use cli::{Action, CliError, Opts};
pub use content::{
    ContentError, ContentProvider, DEFAULT_BANNER, DefaultBanner, InlineText, resolve_art,
};
pub use effects::{EffectKind, EffectOptions, builtin_catalog};

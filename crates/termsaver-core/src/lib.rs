#![forbid(unsafe_code)]

//! Core: terminal session lifecycle, cbreak input mode, and keystroke detection.

pub mod input_watcher;
pub mod interrupt;
pub mod logging;
pub mod terminal_session;
pub mod tty;

pub use input_watcher::{InputSource, InputWatcher};
pub use interrupt::InterruptFlag;
#[cfg(unix)]
pub use interrupt::InterruptGuard;
pub use terminal_session::{SessionOptions, TerminalPhase, TerminalSession};
pub use tty::{Detached, StdinTty, TtyMode};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, warn};

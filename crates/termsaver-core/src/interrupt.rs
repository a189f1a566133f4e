#![forbid(unsafe_code)]

//! Interrupt signal handling.
//!
//! `SIGINT` and `SIGTERM` are turned into a raised [`InterruptFlag`] instead
//! of killing the process, so the engine stops through the same path as a
//! keystroke and the terminal is restored by the normal drain.
//!
//! A second signal while the flag is already raised means the render path
//! is not making progress. The signal thread then restores the terminal
//! itself and exits with `128 + signal`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "stop requested" flag.
///
/// Written only by the signal thread, read by the render path.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the flag as raised.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Lower the flag again.
    pub fn clear(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }
}

#[cfg(unix)]
pub use unix::InterruptGuard;

#[cfg(unix)]
mod unix {
    use std::io;

    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    use super::InterruptFlag;

    /// Routes `SIGINT`/`SIGTERM` into an [`InterruptFlag`] while alive.
    ///
    /// Signals are consumed on a dedicated thread so no handler code runs
    /// in signal context. Dropping the guard closes the iterator and joins
    /// the thread.
    #[derive(Debug)]
    pub struct InterruptGuard {
        handle: signal_hook::iterator::Handle,
        thread: Option<std::thread::JoinHandle<()>>,
    }

    impl InterruptGuard {
        /// Start forwarding termination signals into `flag`.
        ///
        /// # Errors
        ///
        /// Returns an error if the signal handlers cannot be registered.
        pub fn install(flag: InterruptFlag) -> io::Result<Self> {
            let mut signals = Signals::new([SIGINT, SIGTERM])?;
            let handle = signals.handle();
            let thread = std::thread::spawn(move || {
                for signal in signals.forever() {
                    if flag.is_raised() {
                        crate::warn!(signal, "repeated termination signal, forcing exit");
                        crate::terminal_session::best_effort_cleanup();
                        std::process::exit(128 + signal);
                    }
                    crate::info!(signal, "termination signal received, stopping");
                    flag.raise();
                }
            });
            Ok(Self {
                handle,
                thread: Some(thread),
            })
        }
    }

    impl Drop for InterruptGuard {
        fn drop(&mut self) {
            self.handle.close();
            if let Some(thread) = self.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

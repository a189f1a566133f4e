#![forbid(unsafe_code)]

//! Non-blocking keystroke detection.
//!
//! The screensaver only needs to know *that* the user pressed something,
//! never *what*. [`InputWatcher`] polls stdin with `poll(2)` and reports
//! readiness without reading, so the byte is still there for whatever runs
//! after the terminal is restored.
//!
//! A raised [`InterruptFlag`] counts as input too, which folds `SIGINT` and
//! `SIGTERM` into the same stop path as a keypress.

use std::io::{self, IsTerminal};
use std::time::Duration;

use crate::interrupt::InterruptFlag;

/// Something that can tell whether the user asked to stop.
pub trait InputSource {
    /// Whether a stop signal is pending, waiting at most `timeout`.
    ///
    /// A zero timeout returns immediately. Must not consume the input.
    fn has_input(&mut self, timeout: Duration) -> bool;
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn has_input(&mut self, timeout: Duration) -> bool {
        (**self).has_input(timeout)
    }
}

/// Polls a terminal file descriptor for pending bytes.
#[derive(Debug, Default)]
pub struct InputWatcher {
    #[cfg(unix)]
    fd: Option<std::os::fd::OwnedFd>,
    interrupt: Option<InterruptFlag>,
}

impl InputWatcher {
    /// Watch the process's stdin.
    ///
    /// If stdin is not an interactive terminal there is nobody to interrupt,
    /// and the watcher never reports input (apart from a raised interrupt).
    /// A detached watcher still waits out the timeout it is given.
    pub fn stdin() -> Self {
        if !io::stdin().is_terminal() {
            crate::debug!("stdin is not a terminal, keystroke detection disabled");
            return Self::detached();
        }
        Self {
            #[cfg(unix)]
            fd: {
                use std::os::fd::AsFd;
                io::stdin().as_fd().try_clone_to_owned().ok()
            },
            interrupt: None,
        }
    }

    /// A watcher with no input source.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Watch an arbitrary readable descriptor (a pty or pipe end).
    #[cfg(unix)]
    pub fn from_fd(fd: impl Into<std::os::fd::OwnedFd>) -> Self {
        Self {
            fd: Some(fd.into()),
            interrupt: None,
        }
    }

    /// Also report input whenever `flag` is raised.
    #[must_use]
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Whether a descriptor is being watched.
    pub fn is_attached(&self) -> bool {
        #[cfg(unix)]
        {
            self.fd.is_some()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    /// Poll the descriptor for readable data using `poll(2)`.
    #[cfg(unix)]
    fn poll_fd(&self, timeout: Duration) -> io::Result<bool> {
        use std::os::fd::AsFd;
        let Some(ref fd) = self.fd else {
            std::thread::sleep(timeout);
            return Ok(false);
        };
        let mut poll_fds = [nix::poll::PollFd::new(
            fd.as_fd(),
            nix::poll::PollFlags::POLLIN,
        )];
        let timeout_ms: u16 = timeout.as_millis().try_into().unwrap_or(u16::MAX);
        match nix::poll::poll(&mut poll_fds, nix::poll::PollTimeout::from(timeout_ms)) {
            Ok(n) => Ok(n > 0),
            Err(nix::errno::Errno::EINTR) => Ok(false),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    /// Stub for non-Unix platforms.
    #[cfg(not(unix))]
    fn poll_fd(&self, timeout: Duration) -> io::Result<bool> {
        std::thread::sleep(timeout);
        Ok(false)
    }
}

impl InputWatcher {
    fn interrupted(&self) -> bool {
        self.interrupt.as_ref().is_some_and(InterruptFlag::is_raised)
    }
}

impl InputSource for InputWatcher {
    fn has_input(&mut self, timeout: Duration) -> bool {
        if self.interrupted() {
            return true;
        }
        // A signal during the wait shows up as EINTR or as a raised flag.
        match self.poll_fd(timeout) {
            Ok(ready) => ready || self.interrupted(),
            Err(_err) => {
                crate::debug!(error = %_err, "stdin poll failed");
                false
            }
        }
    }
}

#![forbid(unsafe_code)]

//! Input-mode control for the controlling terminal.
//!
//! The screensaver wants every keystroke delivered immediately and never
//! echoed, but it still wants `\n` translated to `\r\n` on output and
//! Ctrl+C delivered as `SIGINT`. That is *cbreak* mode: `ICANON` and `ECHO`
//! are cleared, `OPOST` and `ISIG` are left alone. Full raw mode
//! (`cfmakeraw`) would break both.
//!
//! The original termios is saved in a process-wide slot because terminal
//! mode is process-wide state. That lets the panic hook and the signal
//! thread restore it without holding a reference to the session.

use std::io;

/// Switches the terminal between its original mode and cbreak mode.
///
/// Implementations record whatever they need in [`enter_cbreak`] to put the
/// terminal back exactly as it was in [`restore`].
///
/// [`enter_cbreak`]: TtyMode::enter_cbreak
/// [`restore`]: TtyMode::restore
pub trait TtyMode {
    /// Whether standard input is an interactive terminal.
    ///
    /// When this is `false` the session never calls [`TtyMode::enter_cbreak`].
    fn is_interactive(&self) -> bool;

    /// Save the current mode and switch to cbreak.
    fn enter_cbreak(&mut self) -> io::Result<()>;

    /// Restore the saved mode, draining pending output first.
    ///
    /// Must be a no-op when nothing was saved.
    fn restore(&mut self) -> io::Result<()>;
}

/// A terminal that is never interactive. Every operation is a no-op.
///
/// Used when output is redirected or in tests that only inspect the bytes
/// a session writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl TtyMode for Detached {
    fn is_interactive(&self) -> bool {
        false
    }

    fn enter_cbreak(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Cbreak control over the process's standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinTty;

impl StdinTty {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
mod imp {
    use std::io::{self, IsTerminal};
    use std::sync::{Mutex, MutexGuard};

    use nix::sys::termios::{
        LocalFlags, SetArg, SpecialCharacterIndices, Termios, tcgetattr, tcsetattr,
    };

    static SAVED_TERMIOS: Mutex<Option<Termios>> = Mutex::new(None);

    fn saved() -> MutexGuard<'static, Option<Termios>> {
        match SAVED_TERMIOS.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(super) fn is_interactive() -> bool {
        io::stdin().is_terminal()
    }

    pub(super) fn enter_cbreak() -> io::Result<()> {
        let stdin = io::stdin();
        let mut slot = saved();
        // Entering twice must not overwrite the real original with cbreak.
        let original = match slot.as_ref() {
            Some(original) => original.clone(),
            None => tcgetattr(&stdin).map_err(io::Error::other)?,
        };

        let mut cbreak = original.clone();
        cbreak
            .local_flags
            .remove(LocalFlags::ICANON | LocalFlags::ECHO);
        cbreak.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        cbreak.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        tcsetattr(&stdin, SetArg::TCSAFLUSH, &cbreak).map_err(io::Error::other)?;

        *slot = Some(original);
        Ok(())
    }

    pub(super) fn restore() -> io::Result<()> {
        let Some(original) = saved().take() else {
            return Ok(());
        };
        tcsetattr(&io::stdin(), SetArg::TCSADRAIN, &original).map_err(io::Error::other)
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;

    pub(super) fn is_interactive() -> bool {
        false
    }

    pub(super) fn enter_cbreak() -> io::Result<()> {
        Ok(())
    }

    pub(super) fn restore() -> io::Result<()> {
        Ok(())
    }
}

impl TtyMode for StdinTty {
    fn is_interactive(&self) -> bool {
        imp::is_interactive()
    }

    fn enter_cbreak(&mut self) -> io::Result<()> {
        imp::enter_cbreak()?;
        crate::debug!("stdin switched to cbreak mode");
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        imp::restore()?;
        crate::debug!("stdin mode restored");
        Ok(())
    }
}

/// Restore the saved stdin mode, ignoring errors.
///
/// Called from the panic hook and the signal thread.
pub(crate) fn restore_stdin_best_effort() {
    let _ = imp::restore();
}

#![forbid(unsafe_code)]

//! Terminal session lifecycle guard.
//!
//! A [`TerminalSession`] owns the terminal for the length of one screensaver
//! run. It hides the cursor, optionally enters the alternate screen, and
//! (only when stdin is a terminal) switches input to cbreak mode. Every one
//! of those changes is undone by [`TerminalSession::deactivate`].
//!
//! # Lifecycle Guarantees
//!
//! 1. **Two phases** - [`TerminalPhase::Normal`] and [`TerminalPhase::Active`].
//!    `activate` moves to Active once, `deactivate` moves back once.
//!
//! 2. **Idempotent release** - `deactivate` may be called any number of
//!    times. The cursor-show write is attempted on every call, mode
//!    restoration only while something is still recorded.
//!
//! 3. **Drop restores previous state** - dropping an Active session
//!    deactivates it, which covers early returns, `?`, and panic unwinding.
//!
//! 4. **Panic hook** - a process-wide hook shows the cursor, leaves the
//!    alternate screen and restores stdin before the previous hook runs.
//!
//! # Escape Sequences Reference
//!
//! | Feature | Enable | Disable |
//! |---------|--------|---------|
//! | Alternate screen | `CSI ? 1049 h` | `CSI ? 1049 l` |
//! | Show cursor | `CSI ? 25 h` | `CSI ? 25 l` |
//! | Clear + home | `CSI 1;1 H` `CSI 2 J` | N/A |
//!
//! # Cleanup Order
//!
//! 1. Show cursor (always)
//! 2. Leave alternate screen (if entered)
//! 3. Flush output
//! 4. Restore stdin mode (if cbreak was entered), draining output first
//!
//! # Usage
//!
//! ```no_run
//! use termsaver_core::terminal_session::{SessionOptions, TerminalSession};
//!
//! let mut session = TerminalSession::stdout(SessionOptions::default());
//! session.activate()?;
//! session.clear_screen()?;
//! // ... render frames through `session.output_mut()` ...
//! session.deactivate();
//! # Ok::<(), std::io::Error>(())
//! ```

use std::io::{self, Write};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossterm::{cursor, queue, terminal};

use crate::tty::{self, StdinTty, TtyMode};

/// Number of sessions currently in the Active phase.
///
/// The panic hook only touches the terminal while this is non-zero.
static ACTIVE_SESSIONS: AtomicUsize = AtomicUsize::new(0);

/// Number of Active sessions that entered the alternate screen.
///
/// Leaving a screen that was never entered restores a stale saved cursor,
/// so the panic hook only writes `CSI ? 1049 l` while this is non-zero.
static ALT_SCREEN_SESSIONS: AtomicUsize = AtomicUsize::new(0);

/// Terminal session configuration options.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Enter the alternate screen buffer (`CSI ? 1049 h`) while active.
    ///
    /// The user's scrollback is left untouched and reappears on exit.
    pub alternate_screen: bool,

    /// Hide the cursor (`CSI ? 25 l`) while active.
    pub hide_cursor: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            alternate_screen: true,
            hide_cursor: true,
        }
    }
}

/// Which mode the terminal is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalPhase {
    /// Cursor visible, line-buffered echoing input.
    Normal,
    /// Cursor hidden, cbreak input, alternate screen.
    Active,
}

/// Scoped owner of the terminal's display and input mode.
///
/// # Contract
///
/// - **Exclusive ownership**: only one session should be Active at a time.
/// - **No failure on redirect**: if stdin is not a terminal, cbreak entry is
///   skipped and activation still succeeds.
/// - **Cleanup guarantee**: `deactivate` swallows errors and always tries to
///   show the cursor, since a visible cursor is strictly better than a hidden
///   one on an otherwise broken terminal.
#[derive(Debug)]
pub struct TerminalSession<W: Write, M: TtyMode = StdinTty> {
    out: W,
    tty: M,
    options: SessionOptions,
    phase: TerminalPhase,
    /// Track what was enabled so we only undo what we did.
    alternate_screen_enabled: bool,
    cbreak_enabled: bool,
    activations: usize,
    deactivations: usize,
}

impl TerminalSession<io::Stdout, StdinTty> {
    /// Session over the process's stdout and stdin.
    pub fn stdout(options: SessionOptions) -> Self {
        Self::new(io::stdout(), StdinTty::new(), options)
    }
}

impl<W: Write, M: TtyMode> TerminalSession<W, M> {
    /// Create a session in the Normal phase. Nothing is written yet.
    pub fn new(out: W, tty: M, options: SessionOptions) -> Self {
        install_panic_hook();
        Self {
            out,
            tty,
            options,
            phase: TerminalPhase::Normal,
            alternate_screen_enabled: false,
            cbreak_enabled: false,
            activations: 0,
            deactivations: 0,
        }
    }

    /// Enter the Active phase.
    ///
    /// Does nothing if the session is already active.
    ///
    /// # Errors
    ///
    /// Returns an error if an escape sequence cannot be written or cbreak
    /// mode cannot be entered. The session is left Active in that case so
    /// that [`deactivate`](Self::deactivate) undoes the partial setup.
    pub fn activate(&mut self) -> io::Result<()> {
        if self.phase == TerminalPhase::Active {
            return Ok(());
        }
        self.phase = TerminalPhase::Active;
        self.activations += 1;
        ACTIVE_SESSIONS.fetch_add(1, Ordering::SeqCst);

        if self.options.alternate_screen {
            self.alternate_screen_enabled = true;
            ALT_SCREEN_SESSIONS.fetch_add(1, Ordering::SeqCst);
            queue!(self.out, terminal::EnterAlternateScreen)?;
        }
        if self.options.hide_cursor {
            queue!(self.out, cursor::Hide)?;
        }
        self.out.flush()?;

        if self.tty.is_interactive() {
            self.cbreak_enabled = true;
            self.tty.enter_cbreak()?;
        }

        crate::info!(
            alternate_screen = self.alternate_screen_enabled,
            cbreak = self.cbreak_enabled,
            "terminal session activated"
        );
        Ok(())
    }

    /// Return to the Normal phase.
    ///
    /// Safe to call any number of times; errors are swallowed.
    pub fn deactivate(&mut self) {
        // Always show cursor first
        let _ = queue!(self.out, cursor::Show);

        if self.alternate_screen_enabled {
            let _ = queue!(self.out, terminal::LeaveAlternateScreen);
            self.alternate_screen_enabled = false;
            ALT_SCREEN_SESSIONS.fetch_sub(1, Ordering::SeqCst);
        }

        // Flush before restoring so TCSADRAIN waits on our bytes too
        let _ = self.out.flush();

        if self.cbreak_enabled {
            if self.tty.restore().is_err() {
                crate::warn!("failed to restore terminal mode");
            }
            self.cbreak_enabled = false;
        }

        if self.phase == TerminalPhase::Active {
            self.phase = TerminalPhase::Normal;
            self.deactivations += 1;
            ACTIVE_SESSIONS.fetch_sub(1, Ordering::SeqCst);
            crate::info!("terminal session deactivated");
        }
    }

    /// Clear the visible area and home the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::All)
        )?;
        self.out.flush()
    }

    /// Current phase.
    pub fn phase(&self) -> TerminalPhase {
        self.phase
    }

    /// Whether the session is in the Active phase.
    pub fn is_active(&self) -> bool {
        self.phase == TerminalPhase::Active
    }

    /// How many times the session has entered the Active phase.
    pub fn activations(&self) -> usize {
        self.activations
    }

    /// How many times the session has returned from Active to Normal.
    pub fn deactivations(&self) -> usize {
        self.deactivations
    }

    /// Output the frames are written to.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Mutable access to the output.
    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

impl<W: Write, M: TtyMode> Drop for TerminalSession<W, M> {
    fn drop(&mut self) {
        if self.phase == TerminalPhase::Active {
            self.deactivate();
        }
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if ACTIVE_SESSIONS.load(Ordering::SeqCst) > 0 {
                best_effort_cleanup();
            }
            previous(info);
        }));
    });
}

/// Restore the real terminal without a session handle.
pub(crate) fn best_effort_cleanup() {
    let leave_alt_screen = ALT_SCREEN_SESSIONS.load(Ordering::SeqCst) > 0;
    write_cleanup(&mut io::stdout(), leave_alt_screen);
    tty::restore_stdin_best_effort();
}

fn write_cleanup(out: &mut impl Write, leave_alt_screen: bool) {
    let _ = queue!(out, cursor::Show);
    if leave_alt_screen {
        let _ = queue!(out, terminal::LeaveAlternateScreen);
    }
    let _ = out.flush();
}

#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Parses args manually to keep the binary lean. Every option can also be
//! set through a `TERMSAVER_*` environment variable; explicit flags win.

use std::env;
use std::fmt;
use std::process;
use std::time::Duration;

use termsaver_core::SessionOptions;
use termsaver_runtime::{CycleMode, EngineConfig};

use crate::content::{ContentProvider, DefaultBanner, InlineText};
use crate::effects::{DEFAULT_FPS, EffectOptions};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Seconds per effect when none is configured.
pub const DEFAULT_DURATION_SECS: u64 = 30;

pub const HELP_TEXT: &str = "\
termsaver - cycle text effects over ASCII art until a key is pressed

USAGE:
    termsaver [OPTIONS]

OPTIONS:
    --effects=A,B,C      Effects to cycle through (default: built-in subset)
    --exclude=A,B        Effects to leave out
    --cycle=MODE         'random' (default) or 'sequential'
    --duration=N         Seconds per effect, positive (default: 30)
    --text=STR           Art to animate; '\\n' starts a new line
    --seed=N             Seed for reproducible effect order and glyphs
    --fps=N              Frames per second for built-in effects (default: 30)
    --no-alt-screen      Draw on the main screen instead of the alternate one
    --list               Print available and enabled effects, then exit
    --help, -h           Show this help message
    --version, -V        Show version

EFFECTS:
    typewriter  decrypt  rain  sweep  scanline

ENVIRONMENT VARIABLES:
    TERMSAVER_EFFECTS     Override --effects
    TERMSAVER_EXCLUDE     Override --exclude
    TERMSAVER_CYCLE       Override --cycle
    TERMSAVER_DURATION    Override --duration
    TERMSAVER_TEXT        Override --text
    TERMSAVER_SEED        Override --seed
    TERMSAVER_FPS         Override --fps
    TERMSAVER_LOG         Log filter for diagnostics on stderr (e.g. 'debug')";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    /// Explicit enabled list, if given.
    pub effects: Option<Vec<String>>,
    pub exclude: Vec<String>,
    pub cycle: CycleMode,
    /// Seconds per effect. Zero is rejected by the engine.
    pub duration_secs: u64,
    /// Inline art, with escapes already expanded.
    pub text: Option<String>,
    pub seed: Option<u64>,
    pub fps: u32,
    pub alt_screen: bool,
    /// Print the effect lists and exit.
    pub list: bool,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            effects: None,
            exclude: Vec::new(),
            cycle: CycleMode::default(),
            duration_secs: DEFAULT_DURATION_SECS,
            text: None,
            seed: None,
            fps: DEFAULT_FPS,
            alt_screen: true,
            list: false,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Run(Opts),
    Help,
    Version,
}

/// A malformed flag or environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError(String);

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CliError {}

impl Opts {
    /// Parse the process's arguments and environment.
    ///
    /// Prints usage or version and exits for `--help` and `--version`;
    /// prints the problem and exits with status 2 on a malformed value.
    pub fn parse() -> Self {
        match parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Action::Run(opts)) => opts,
            Ok(Action::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Action::Version) => {
                println!("termsaver {VERSION}");
                process::exit(0);
            }
            Err(err) => {
                eprintln!("{err}");
                eprintln!("Run with --help for usage information.");
                process::exit(2);
            }
        }
    }

    /// Engine parameters for these options.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            enabled: self.effects.clone(),
            excluded: self.exclude.clone(),
            cycle_mode: self.cycle,
            effect_duration: Duration::from_secs(self.duration_secs),
            seed: self.seed,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            alternate_screen: self.alt_screen,
            ..SessionOptions::default()
        }
    }

    pub fn effect_options(&self) -> EffectOptions {
        EffectOptions::at_fps(self.fps).with_seed(self.seed)
    }

    /// Inline text when given, the built-in banner otherwise.
    pub fn content(&self) -> Box<dyn ContentProvider> {
        match &self.text {
            Some(text) => Box::new(InlineText::new(text.clone())),
            None => Box::new(DefaultBanner),
        }
    }
}

/// Parse `args` (without the program name) on top of the variables `lookup`
/// returns.
///
/// Environment values are applied first, then flags override them.
///
/// # Errors
///
/// Returns a [`CliError`] naming the first malformed value or unknown flag.
pub fn parse_from<I, S>(
    args: I,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Action, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut opts = Opts::default();

    // Apply environment variable defaults first
    if let Some(val) = lookup("TERMSAVER_EFFECTS") {
        opts.effects = Some(split_list(&val));
    }
    if let Some(val) = lookup("TERMSAVER_EXCLUDE") {
        opts.exclude = split_list(&val);
    }
    if let Some(val) = lookup("TERMSAVER_CYCLE") {
        opts.cycle = parse_cycle("TERMSAVER_CYCLE", &val)?;
    }
    if let Some(val) = lookup("TERMSAVER_DURATION") {
        opts.duration_secs = parse_number("TERMSAVER_DURATION", &val)?;
    }
    if let Some(val) = lookup("TERMSAVER_TEXT") {
        opts.text = Some(unescape(&val));
    }
    if let Some(val) = lookup("TERMSAVER_SEED") {
        opts.seed = Some(parse_number("TERMSAVER_SEED", &val)?);
    }
    if let Some(val) = lookup("TERMSAVER_FPS") {
        opts.fps = parse_fps("TERMSAVER_FPS", &val)?;
    }

    // Parse command-line args (override env vars)
    for arg in args {
        match arg.as_ref() {
            "--help" | "-h" => return Ok(Action::Help),
            "--version" | "-V" => return Ok(Action::Version),
            "--no-alt-screen" => opts.alt_screen = false,
            "--list" => opts.list = true,
            other => {
                if let Some(val) = other.strip_prefix("--effects=") {
                    opts.effects = Some(split_list(val));
                } else if let Some(val) = other.strip_prefix("--exclude=") {
                    opts.exclude = split_list(val);
                } else if let Some(val) = other.strip_prefix("--cycle=") {
                    opts.cycle = parse_cycle("--cycle", val)?;
                } else if let Some(val) = other.strip_prefix("--duration=") {
                    opts.duration_secs = parse_number("--duration", val)?;
                } else if let Some(val) = other.strip_prefix("--text=") {
                    opts.text = Some(unescape(val));
                } else if let Some(val) = other.strip_prefix("--seed=") {
                    opts.seed = Some(parse_number("--seed", val)?);
                } else if let Some(val) = other.strip_prefix("--fps=") {
                    opts.fps = parse_fps("--fps", val)?;
                } else {
                    return Err(CliError(format!("Unknown argument: {other}")));
                }
            }
        }
    }

    Ok(Action::Run(opts))
}

/// Comma-separated ids, trimmed, empty entries dropped.
fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_cycle(name: &str, val: &str) -> Result<CycleMode, CliError> {
    val.parse()
        .map_err(|reason| CliError(format!("Invalid {name} value: {reason}")))
}

fn parse_number<T: std::str::FromStr>(name: &str, val: &str) -> Result<T, CliError> {
    val.trim()
        .parse()
        .map_err(|_| CliError(format!("Invalid {name} value: {val}")))
}

fn parse_fps(name: &str, val: &str) -> Result<u32, CliError> {
    match parse_number(name, val)? {
        0 => Err(CliError(format!("Invalid {name} value: must be positive"))),
        fps => Ok(fps),
    }
}

/// Expand `\n` into a newline.
fn unescape(val: &str) -> String {
    val.replace("\\n", "\n")
}

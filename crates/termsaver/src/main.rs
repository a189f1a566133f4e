#![forbid(unsafe_code)]

//! termsaver binary entry point.

use std::process;

use termsaver::{Opts, builtin_catalog, logging, resolve_art};
use termsaver_core::{InputWatcher, InterruptFlag, TerminalSession};
use termsaver_runtime::{CycleMode, EffectCatalog, EffectSelector, ScreensaverEngine};

/// Exit status for a configuration problem.
const EXIT_CONFIG: i32 = 2;
/// Exit status for a terminal I/O failure.
const EXIT_IO: i32 = 1;

fn main() {
    let opts = Opts::parse();
    logging::init_from_env();
    process::exit(run(&opts));
}

fn run(opts: &Opts) -> i32 {
    let catalog = builtin_catalog(opts.effect_options());
    if opts.list {
        return list(opts, &catalog);
    }

    let art = resolve_art(opts.content().as_ref());

    let interrupt = InterruptFlag::new();
    #[cfg(unix)]
    let _signals = match termsaver_core::InterruptGuard::install(interrupt.clone()) {
        Ok(guard) => Some(guard),
        Err(err) => {
            tracing::warn!(error = %err, "signal handling unavailable");
            None
        }
    };

    let input = InputWatcher::stdin().with_interrupt(interrupt.clone());
    let session = TerminalSession::stdout(opts.session_options());
    let mut engine =
        match ScreensaverEngine::new(opts.engine_config(), catalog, art, session, input) {
            Ok(engine) => engine.with_interrupt(interrupt),
            Err(err) => {
                eprintln!("termsaver: {err}");
                return EXIT_CONFIG;
            }
        };

    match engine.run() {
        Ok(report) => {
            tracing::debug!(?report, "run finished");
            0
        }
        Err(err) => {
            eprintln!("termsaver: terminal error: {err}");
            EXIT_IO
        }
    }
}

/// Print available and enabled effects.
fn list(opts: &Opts, catalog: &EffectCatalog) -> i32 {
    let config = opts.engine_config();
    let selector = match EffectSelector::new(
        catalog,
        config.enabled.as_deref(),
        &config.excluded,
        CycleMode::Sequential,
    ) {
        Ok(selector) => selector,
        Err(err) => {
            eprintln!("termsaver: {err}");
            return EXIT_CONFIG;
        }
    };
    println!("available: {}", selector.list_available().join(", "));
    println!("enabled:   {}", selector.list_enabled().join(", "));
    0
}

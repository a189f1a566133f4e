//! Built-in effects driven through the real engine and runner.

use std::time::Duration;

use proptest::prelude::*;
use termsaver::effects::Canvas;
use termsaver::{
    ContentError, ContentProvider, DefaultBanner, EffectKind, EffectOptions, builtin_catalog,
    resolve_art,
};
use termsaver_core::{Detached, SessionOptions, TerminalSession};
use termsaver_runtime::testing::{ScriptedInput, SharedBuffer};
use termsaver_runtime::{ConfigurationError, CycleMode, EngineConfig, ScreensaverEngine};

fn options() -> EffectOptions {
    EffectOptions::unpaced().with_seed(Some(5))
}

#[test]
fn every_builtin_effect_runs_to_completion_in_the_engine() {
    let out = SharedBuffer::new();
    let diagnostics = SharedBuffer::new();
    let session = TerminalSession::new(out.clone(), Detached, SessionOptions::default());
    let config = EngineConfig {
        enabled: Some(EffectKind::ALL.iter().map(|k| k.id().to_owned()).collect()),
        cycle_mode: CycleMode::Sequential,
        ..EngineConfig::default()
    };
    let art = resolve_art(&DefaultBanner);
    let finished = Canvas::parse(&art).unwrap().finished();
    let frames_per_effect: usize = EffectKind::ALL
        .iter()
        .map(|kind| kind.build(&art, &options()).unwrap().count())
        .sum();

    // One poll per frame plus one per exhausted sequence, across one lap.
    let polls = frames_per_effect + EffectKind::ALL.len();
    let mut engine = ScreensaverEngine::new(
        config,
        builtin_catalog(options()),
        art,
        session,
        ScriptedInput::after_polls(polls),
    )
    .unwrap()
    .with_diagnostics(diagnostics.clone());

    let report = engine.run().unwrap();

    assert_eq!(report.completed, EffectKind::ALL.len());
    assert_eq!(report.failures, 0);
    assert!(diagnostics.contents().is_empty());
    assert!(out.contents().contains(&finished));
}

#[test]
fn default_subset_leaves_out_scanline() {
    let session = TerminalSession::new(SharedBuffer::new(), Detached, SessionOptions::default());
    let engine = ScreensaverEngine::new(
        EngineConfig::default(),
        builtin_catalog(options()),
        "HI",
        session,
        ScriptedInput::never(),
    )
    .unwrap();
    assert_eq!(
        engine.selector().list_enabled(),
        ["typewriter", "decrypt", "rain", "sweep"]
    );
}

#[test]
fn excluding_every_builtin_is_a_configuration_error() {
    let session = TerminalSession::new(SharedBuffer::new(), Detached, SessionOptions::default());
    let config = EngineConfig {
        enabled: Some(vec!["rain".into()]),
        excluded: vec!["rain".into()],
        effect_duration: Duration::from_secs(1),
        ..EngineConfig::default()
    };
    let result = ScreensaverEngine::new(
        config,
        builtin_catalog(options()),
        "HI",
        session,
        ScriptedInput::never(),
    );
    assert!(matches!(
        result,
        Err(ConfigurationError::NoEffectsEnabled { .. })
    ));
}

struct Missing;

impl ContentProvider for Missing {
    fn art(&self) -> Result<String, ContentError> {
        Err(ContentError::Unavailable("no art file".into()))
    }
}

#[test]
fn missing_art_still_gives_buildable_effects() {
    let art = resolve_art(&Missing);
    assert_eq!(art, termsaver::DEFAULT_BANNER);
    for kind in EffectKind::ALL {
        assert!(kind.build(&art, &options()).is_ok());
    }
}

// ── Properties ────────────────────────────────────────────────────────────

fn art_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[ -~]{0,12}", 1..6)
        .prop_map(|lines| lines.join("\n"))
        .prop_filter("art must not be blank", |art| !art.trim().is_empty())
}

proptest! {
    #[test]
    fn frames_keep_shape_and_end_on_the_art(art in art_strategy(), seed in any::<u64>()) {
        let canvas = Canvas::parse(&art).unwrap();
        let finished = canvas.finished();
        let options = EffectOptions::unpaced().with_seed(Some(seed));

        for kind in EffectKind::ALL {
            let frames: Vec<String> = kind
                .build(&art, &options)
                .unwrap()
                .map(Result::unwrap)
                .collect();
            prop_assert_eq!(frames.last(), Some(&finished));
            for frame in &frames {
                let rows: Vec<&str> = frame.split('\n').collect();
                prop_assert_eq!(rows.len(), canvas.height());
                for row in rows {
                    prop_assert_eq!(row.chars().count(), canvas.width());
                }
            }
        }
    }
}

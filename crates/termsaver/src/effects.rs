#![forbid(unsafe_code)]

//! Built-in text effects.
//!
//! Each effect turns the art into a finite run of full-screen frames that
//! ends on the art itself, followed by a short hold of the finished art.
//! Frames keep the art's shape (every frame has the same rows and columns)
//! so painting one over another from the home position never leaves debris.
//!
//! | Id | Reveal |
//! |----|--------|
//! | `typewriter` | glyph by glyph, row-major |
//! | `decrypt` | random printable glyphs that lock into place |
//! | `rain` | columns filled top-down behind a falling drop |
//! | `sweep` | a vertical bar moving left to right |
//! | `scanline` | a horizontal bar moving top to bottom |
//!
//! [`Paced`] spaces frames at the configured rate; the engine's runner pulls
//! them as fast as they come.

use std::cmp::Ordering;
use std::iter;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use termsaver_runtime::{EffectCatalog, EffectRuntimeError, FrameSequence};

/// Frame rate when none is configured.
pub const DEFAULT_FPS: u32 = 30;

/// How long the finished art stays up at the end of an effect.
const HOLD: Duration = Duration::from_secs(2);

/// Frames over which `decrypt` locks every glyph.
const DECRYPT_FRAMES: usize = 60;

/// Longest delay before a `rain` column starts falling.
const RAIN_SPREAD: usize = 24;

/// Approximate length of a `typewriter` run, in frames.
const TYPEWRITER_FRAMES: usize = 90;

/// Pacing and randomness shared by all built-in effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectOptions {
    /// Minimum gap between two frames. Zero disables pacing.
    pub frame_interval: Duration,
    /// Copies of the finished art appended to every effect.
    pub hold_frames: usize,
    /// Seed for glyph scrambling and drop timing.
    pub seed: Option<u64>,
}

impl EffectOptions {
    /// Pace at `fps` frames per second (at least one).
    pub fn at_fps(fps: u32) -> Self {
        let fps = fps.max(1);
        Self {
            frame_interval: Duration::from_secs(1) / fps,
            hold_frames: HOLD.as_secs() as usize * fps as usize,
            seed: None,
        }
    }

    /// No pacing and a single hold frame.
    pub fn unpaced() -> Self {
        Self {
            frame_interval: Duration::ZERO,
            hold_frames: 1,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed.unwrap_or_else(rand::random))
    }
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self::at_fps(DEFAULT_FPS)
    }
}

/// The built-in effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Typewriter,
    Decrypt,
    Rain,
    Sweep,
    Scanline,
}

impl EffectKind {
    /// Every built-in effect, in catalog order.
    pub const ALL: [Self; 5] = [
        Self::Typewriter,
        Self::Decrypt,
        Self::Rain,
        Self::Sweep,
        Self::Scanline,
    ];

    /// The subset enabled when no explicit list is given.
    pub const DEFAULTS: [Self; 4] = [Self::Typewriter, Self::Decrypt, Self::Rain, Self::Sweep];

    pub fn id(self) -> &'static str {
        match self {
            Self::Typewriter => "typewriter",
            Self::Decrypt => "decrypt",
            Self::Rain => "rain",
            Self::Sweep => "sweep",
            Self::Scanline => "scanline",
        }
    }

    /// Build the paced frame sequence for `art`.
    ///
    /// # Errors
    ///
    /// [`EffectRuntimeError::Build`] if the art is blank.
    pub fn build(
        self,
        art: &str,
        options: &EffectOptions,
    ) -> Result<FrameSequence, EffectRuntimeError> {
        let canvas = Canvas::parse(art)?;
        let finished = canvas.finished();
        let rng = options.rng();

        let frames: Box<dyn Iterator<Item = String>> = match self {
            Self::Typewriter => Box::new(typewriter(canvas)),
            Self::Decrypt => Box::new(decrypt(canvas, rng)),
            Self::Rain => Box::new(rain(canvas, rng)),
            Self::Sweep => Box::new(sweep(canvas)),
            Self::Scanline => Box::new(scanline(canvas)),
        };
        let hold = iter::repeat_n(finished, options.hold_frames);
        let frames = frames.chain(hold).map(Ok::<_, EffectRuntimeError>);
        Ok(Box::new(Paced::new(frames, options.frame_interval)))
    }
}

/// Catalog of every built-in effect, with [`EffectKind::DEFAULTS`] as the
/// default subset.
pub fn builtin_catalog(options: EffectOptions) -> EffectCatalog {
    let catalog = EffectKind::ALL
        .into_iter()
        .fold(EffectCatalog::new(), |catalog, kind| {
            catalog.with(kind.id(), move |art: &str| kind.build(art, &options))
        });
    catalog.with_defaults(EffectKind::DEFAULTS.map(EffectKind::id))
}

/// The art as a padded grid of glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    cells: Vec<Vec<char>>,
    width: usize,
}

impl Canvas {
    /// Split `art` into rows, drop blank leading and trailing rows, expand
    /// tabs to a single space and pad every row to the widest one.
    ///
    /// # Errors
    ///
    /// [`EffectRuntimeError::Build`] if the art is blank.
    pub fn parse(art: &str) -> Result<Self, EffectRuntimeError> {
        let lines: Vec<&str> = art.lines().collect();
        let Some(first) = lines.iter().position(|line| !line.trim().is_empty()) else {
            return Err(EffectRuntimeError::Build("art is blank".into()));
        };
        let last = lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .unwrap_or(first);

        let mut cells: Vec<Vec<char>> = lines[first..=last]
            .iter()
            .map(|line| {
                line.chars()
                    .map(|ch| if ch == '\t' { ' ' } else { ch })
                    .collect()
            })
            .collect();
        let width = cells.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut cells {
            row.resize(width, ' ');
        }
        Ok(Self { cells, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    /// Render one frame, asking `cell` what to draw at each position.
    pub fn render(&self, mut cell: impl FnMut(usize, usize, char) -> char) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height());
        for (r, row) in self.cells.iter().enumerate() {
            if r > 0 {
                out.push('\n');
            }
            out.extend(row.iter().enumerate().map(|(c, &ch)| cell(r, c, ch)));
        }
        out
    }

    /// The art itself.
    pub fn finished(&self) -> String {
        self.render(|_, _, ch| ch)
    }

    /// Positions of non-blank glyphs, row-major.
    fn glyphs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, ch)| !ch.is_whitespace())
                .map(move |(c, _)| (r, c))
        })
    }
}

fn typewriter(canvas: Canvas) -> impl Iterator<Item = String> {
    let order: Vec<(usize, usize)> = canvas.glyphs().collect();
    let step = order.len().div_ceil(TYPEWRITER_FRAMES).max(1);
    let steps = order.len().div_ceil(step);
    let mut shown = vec![vec![false; canvas.width()]; canvas.height()];
    let mut revealed = 0;

    (0..=steps).map(move |k| {
        let target = (k * step).min(order.len());
        for &(r, c) in &order[revealed..target] {
            shown[r][c] = true;
        }
        revealed = target;
        canvas.render(|r, c, ch| if shown[r][c] { ch } else { ' ' })
    })
}

fn decrypt(canvas: Canvas, mut rng: StdRng) -> impl Iterator<Item = String> {
    let lock_at: Vec<Vec<usize>> = (0..canvas.height())
        .map(|_| {
            (0..canvas.width())
                .map(|_| rng.random_range(0..DECRYPT_FRAMES))
                .collect()
        })
        .collect();

    (0..=DECRYPT_FRAMES).map(move |t| {
        canvas.render(|r, c, ch| {
            if ch.is_whitespace() || t > lock_at[r][c] {
                ch
            } else {
                char::from(rng.random_range(33u8..127))
            }
        })
    })
}

fn rain(canvas: Canvas, mut rng: StdRng) -> impl Iterator<Item = String> {
    let delays: Vec<usize> = (0..canvas.width())
        .map(|_| rng.random_range(0..RAIN_SPREAD))
        .collect();
    let total = RAIN_SPREAD + canvas.height();

    (0..=total).map(move |t| {
        canvas.render(|r, c, ch| {
            // Rows above the drop have landed.
            let head = t as isize - delays[c] as isize;
            match (r as isize).cmp(&head) {
                Ordering::Less => ch,
                Ordering::Equal => '|',
                Ordering::Greater => ' ',
            }
        })
    })
}

fn sweep(canvas: Canvas) -> impl Iterator<Item = String> {
    (0..=canvas.width()).map(move |t| {
        canvas.render(|_, c, ch| match c.cmp(&t) {
            Ordering::Less => ch,
            Ordering::Equal => '|',
            Ordering::Greater => ' ',
        })
    })
}

fn scanline(canvas: Canvas) -> impl Iterator<Item = String> {
    (0..=canvas.height()).map(move |t| {
        canvas.render(|r, _, ch| match r.cmp(&t) {
            Ordering::Less => ch,
            Ordering::Equal => '-',
            Ordering::Greater => ' ',
        })
    })
}

/// Iterator adapter that waits at least `interval` between items.
#[derive(Debug)]
pub struct Paced<I> {
    inner: I,
    interval: Duration,
    next_due: Option<Instant>,
}

impl<I> Paced<I> {
    pub fn new(inner: I, interval: Duration) -> Self {
        Self {
            inner,
            interval,
            next_due: None,
        }
    }
}

impl<I: Iterator> Iterator for Paced<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(due) = self.next_due {
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
        let item = self.inner.next()?;
        self.next_due = Some(Instant::now() + self.interval);
        Some(item)
    }
}

#![forbid(unsafe_code)]

//! Effect selection policy.
//!
//! The selector owns the enabled set and hands out one id per call to
//! [`EffectSelector::next`], forever.
//!
//! - **Sequential**: round-robin over the enabled set, starting at index 0.
//! - **Random**: uniform draw from the enabled set minus the ids drawn most
//!   recently. The recent history is a FIFO of capacity
//!   `min(3, len / 2)`, so no id repeats within `capacity + 1` consecutive
//!   draws. A capacity of zero (a single enabled effect) disables the
//!   exclusion.
//!
//! # Example
//!
//! ```
//! use termsaver_runtime::catalog::{EffectCatalog, FrameSequence};
//! use termsaver_runtime::error::EffectRuntimeError;
//! use termsaver_runtime::selector::{CycleMode, EffectSelector};
//!
//! fn nothing(_: &str) -> Result<FrameSequence, EffectRuntimeError> {
//!     Ok(Box::new(std::iter::empty()))
//! }
//!
//! let catalog = EffectCatalog::new()
//!     .with("matrix", nothing)
//!     .with("rain", nothing)
//!     .with("pour", nothing);
//! let mut selector = EffectSelector::new(&catalog, None, &[], CycleMode::Sequential)?;
//! assert_eq!(selector.next(), "matrix");
//! assert_eq!(selector.next(), "rain");
//! assert_eq!(selector.next(), "pour");
//! assert_eq!(selector.next(), "matrix");
//! # Ok::<(), termsaver_runtime::error::ConfigurationError>(())
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::EffectCatalog;
use crate::error::ConfigurationError;

/// Upper bound on the anti-repeat window.
pub const MAX_RECENT: usize = 3;

/// Policy governing effect order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CycleMode {
    /// Round-robin in enabled-set order.
    Sequential,
    /// Uniform draw that avoids the most recent picks.
    #[default]
    Random,
}

impl CycleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for CycleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CycleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "random" => Ok(Self::Random),
            other => Err(format!(
                "invalid cycle mode '{other}' (expected 'random' or 'sequential')"
            )),
        }
    }
}

/// Stateful picker of the next effect id.
#[derive(Debug)]
pub struct EffectSelector {
    enabled: Vec<String>,
    available: Vec<String>,
    mode: CycleMode,
    cursor: usize,
    recent: VecDeque<String>,
    rng: StdRng,
}

impl EffectSelector {
    /// Resolve the enabled set and build a selector.
    ///
    /// With an explicit `enabled` list, ids missing from the catalog are
    /// dropped silently and order is preserved. Without one (or with an
    /// empty one) the catalog's default subset is used. Ids in `excluded`
    /// are then removed. Duplicates keep their first position.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::NoEffectsEnabled`] if nothing is left.
    pub fn new(
        catalog: &EffectCatalog,
        enabled: Option<&[String]>,
        excluded: &[String],
        mode: CycleMode,
    ) -> Result<Self, ConfigurationError> {
        let requested = enabled.filter(|ids| !ids.is_empty());
        let candidates: Vec<String> = match requested {
            Some(ids) => ids
                .iter()
                .filter(|id| catalog.contains(id))
                .cloned()
                .collect(),
            None => catalog.defaults(),
        };

        let mut resolved: Vec<String> = Vec::with_capacity(candidates.len());
        for id in candidates {
            if !excluded.contains(&id) && !resolved.contains(&id) {
                resolved.push(id);
            }
        }

        if resolved.is_empty() {
            return Err(ConfigurationError::NoEffectsEnabled {
                requested: requested.map(<[String]>::to_vec),
                excluded: excluded.to_vec(),
            });
        }

        tracing::debug!(
            mode = %mode,
            enabled = ?resolved,
            "effect selector ready"
        );

        Ok(Self {
            enabled: resolved,
            available: catalog.ids().map(str::to_owned).collect(),
            mode,
            cursor: 0,
            recent: VecDeque::with_capacity(MAX_RECENT),
            rng: StdRng::seed_from_u64(rand::random()),
        })
    }

    /// Reseed the random draw for reproducible runs.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Pick the next effect id.
    pub fn next(&mut self) -> String {
        match self.mode {
            CycleMode::Sequential => self.next_sequential(),
            CycleMode::Random => self.next_random(),
        }
    }

    fn next_sequential(&mut self) -> String {
        let id = self.enabled[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.enabled.len();
        id
    }

    fn next_random(&mut self) -> String {
        let mut pool: Vec<usize> = (0..self.enabled.len())
            .filter(|&i| !self.recent.contains(&self.enabled[i]))
            .collect();
        if pool.is_empty() {
            self.recent.clear();
            pool = (0..self.enabled.len()).collect();
        }

        let pick = pool[self.rng.random_range(0..pool.len())];
        let id = self.enabled[pick].clone();

        self.recent.push_back(id.clone());
        let capacity = self.history_capacity();
        while self.recent.len() > capacity {
            self.recent.pop_front();
        }
        id
    }

    /// Size of the anti-repeat window: `min(3, len / 2)`.
    pub fn history_capacity(&self) -> usize {
        MAX_RECENT.min(self.enabled.len() / 2)
    }

    /// Ids currently excluded from random draws, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }

    /// The resolved enabled set, in cycle order.
    pub fn list_enabled(&self) -> &[String] {
        &self.enabled
    }

    /// Every id the catalog offers.
    pub fn list_available(&self) -> &[String] {
        &self.available
    }

    pub fn mode(&self) -> CycleMode {
        self.mode
    }
}

#![forbid(unsafe_code)]

//! Effect registry.
//!
//! An [`EffectCatalog`] maps effect ids to factories. A factory turns the
//! art into a [`FrameSequence`]: a lazy, finite, one-shot iterator of
//! frames. The catalog is built once and passed to the engine, so tests can
//! register fake producers with controlled lengths and failures.

use crate::error::EffectRuntimeError;

/// One renderable snapshot of an effect in progress.
pub type Frame = String;

/// A frame, or the error that ended the sequence.
pub type FrameResult = Result<Frame, EffectRuntimeError>;

/// The frames one effect produces for one piece of art.
pub type FrameSequence = Box<dyn Iterator<Item = FrameResult>>;

/// Builds a frame sequence from the art.
pub type EffectFactory = Box<dyn Fn(&str) -> Result<FrameSequence, EffectRuntimeError>>;

/// Ordered mapping from effect id to factory.
#[derive(Default)]
pub struct EffectCatalog {
    entries: Vec<(String, EffectFactory)>,
    defaults: Option<Vec<String>>,
}

impl EffectCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `id`.
    ///
    /// Re-registering an id replaces its factory and keeps its position.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn(&str) -> Result<FrameSequence, EffectRuntimeError> + 'static,
    {
        let id = id.into();
        let factory: EffectFactory = Box::new(factory);
        match self.entries.iter_mut().find(|(name, _)| *name == id) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((id, factory)),
        }
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&str) -> Result<FrameSequence, EffectRuntimeError> + 'static,
    {
        self.register(id, factory);
        self
    }

    /// Declare the subset used when no explicit enabled list is given.
    #[must_use]
    pub fn with_defaults<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// The default subset, restricted to registered ids.
    ///
    /// Every registered id when no default subset was declared.
    pub fn defaults(&self) -> Vec<String> {
        match &self.defaults {
            Some(defaults) => defaults
                .iter()
                .filter(|id| self.contains(id))
                .cloned()
                .collect(),
            None => self.ids().map(str::to_owned).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the frame sequence for `id` over `art`.
    ///
    /// # Errors
    ///
    /// [`EffectRuntimeError::UnknownEffect`] if `id` is not registered, or
    /// whatever the factory returns.
    pub fn build(&self, id: &str, art: &str) -> Result<FrameSequence, EffectRuntimeError> {
        let (_, factory) = self
            .entries
            .iter()
            .find(|(name, _)| name == id)
            .ok_or_else(|| EffectRuntimeError::UnknownEffect(id.to_owned()))?;
        factory(art)
    }
}

impl std::fmt::Debug for EffectCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectCatalog")
            .field("ids", &self.ids().collect::<Vec<_>>())
            .field("defaults", &self.defaults)
            .finish()
    }
}

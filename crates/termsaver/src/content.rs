#![forbid(unsafe_code)]

//! Where the art comes from.
//!
//! The engine needs one non-blank piece of text before it starts. A
//! [`ContentProvider`] supplies it; [`resolve_art`] falls back to
//! [`DEFAULT_BANNER`] whenever the provider fails or returns only
//! whitespace, so the engine is never built without something to show.

use std::fmt;

/// Built-in art shown when nothing else is available.
pub const DEFAULT_BANNER: &str = r#"
 _
| |_ ___ _ __ _ __ ___  ___  __ ___   _____ _ __
| __/ _ \ '__| '_ ` _ \/ __|/ _` \ \ / / _ \ '__|
| ||  __/ |  | | | | | \__ \ (_| |\ V /  __/ |
 \__\___|_|  |_| |_| |_|___/\__,_| \_/ \___|_|

        press any key to return to your shell
"#;

/// Why a provider could not supply art.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The provider produced only whitespace.
    Blank,
    /// The provider has nothing to offer.
    Unavailable(String),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => write!(f, "art is blank"),
            Self::Unavailable(reason) => write!(f, "art unavailable: {reason}"),
        }
    }
}

impl std::error::Error for ContentError {}

/// Supplies one blob of displayable text.
pub trait ContentProvider {
    fn art(&self) -> Result<String, ContentError>;
}

/// Art given directly, e.g. on the command line.
#[derive(Debug, Clone)]
pub struct InlineText {
    text: String,
}

impl InlineText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ContentProvider for InlineText {
    fn art(&self) -> Result<String, ContentError> {
        if self.text.trim().is_empty() {
            return Err(ContentError::Blank);
        }
        Ok(self.text.clone())
    }
}

/// Always yields [`DEFAULT_BANNER`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBanner;

impl ContentProvider for DefaultBanner {
    fn art(&self) -> Result<String, ContentError> {
        Ok(DEFAULT_BANNER.to_owned())
    }
}

/// Ask `provider` for art, falling back to the banner.
pub fn resolve_art(provider: &dyn ContentProvider) -> String {
    match provider.art() {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::debug!("provider returned blank art, using default banner");
            DEFAULT_BANNER.to_owned()
        }
        Err(err) => {
            tracing::warn!(error = %err, "art unavailable, using default banner");
            DEFAULT_BANNER.to_owned()
        }
    }
}

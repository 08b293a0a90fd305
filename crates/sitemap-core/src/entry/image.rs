use serde::Serialize;

use super::validate_loc;
use crate::Result;

/// Image metadata nested under a page entry (`<image:image>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    loc: String,
    title: Option<String>,
    caption: Option<String>,
}

impl ImageEntry {
    /// Create an image reference for `loc`.
    pub fn new(loc: impl Into<String>) -> Result<Self> {
        let loc = loc.into();
        validate_loc(&loc)?;
        Ok(Self {
            loc,
            title: None,
            caption: None,
        })
    }

    /// Set the title; blank titles are dropped.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_blank(title.into());
        self
    }

    /// Set the caption; blank captions are dropped.
    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = non_blank(caption.into());
        self
    }

    /// Image URL.
    #[must_use]
    pub fn loc(&self) -> &str {
        &self.loc
    }

    /// Image title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Image caption.
    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

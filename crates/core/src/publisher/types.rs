//! Data types for the publisher module.

use serde::{Deserialize, Serialize};

/// Visibility of a published clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    #[default]
    Unlisted,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
        }
    }
}

/// Metadata attached to a published clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl PublishMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            visibility: Visibility::default(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

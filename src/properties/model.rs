//! Document creation properties.

use serde::{Deserialize, Serialize};

pub const DEFAULT_IS_IN_MEMORY: bool = false;
pub const DEFAULT_IS_EDITABLE: bool = true;

/// Core (package) properties handed to the engine with a new document.
///
/// Encoded in the nested `settings` table, in the field order of the
/// package's core properties part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreProperties {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub description: Option<String>,
    /// Keywords
    pub tags: Option<String>,
    pub category: Option<String>,
    pub creator: Option<String>,
}

impl CoreProperties {
    /// Whether any property is set.
    pub fn has_data(&self) -> bool {
        self.title.is_some()
            || self.subject.is_some()
            || self.description.is_some()
            || self.tags.is_some()
            || self.category.is_some()
            || self.creator.is_some()
    }
}

/// Creation options for a Word, PowerPoint or Excel document.
///
/// The three kinds share this layout; the kind travels as the buffer's
/// file identifier rather than as a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentPropertiesModel {
    /// Keep the document as an in-process buffer instead of a file on disk.
    pub is_in_memory: bool,
    /// Open the source document for editing rather than read-only.
    pub is_editable: bool,
    #[serde(flatten)]
    pub core: CoreProperties,
}

impl Default for DocumentPropertiesModel {
    fn default() -> Self {
        Self {
            is_in_memory: DEFAULT_IS_IN_MEMORY,
            is_editable: DEFAULT_IS_EDITABLE,
            core: CoreProperties::default(),
        }
    }
}

impl DocumentPropertiesModel {
    /// Properties for an in-memory document, everything else defaulted.
    pub fn in_memory() -> Self {
        Self {
            is_in_memory: true,
            ..Self::default()
        }
    }

    pub fn with_editable(mut self, is_editable: bool) -> Self {
        self.is_editable = is_editable;
        self
    }

    pub fn with_core(mut self, core: CoreProperties) -> Self {
        self.core = core;
        self
    }
}

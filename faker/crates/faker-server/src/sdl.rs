use std::{fmt, sync::Arc};

/// A named chunk of GraphQL SDL source text.
#[derive(Clone, PartialEq, Eq)]
pub struct SdlDocument {
    text: Arc<str>,
    name: Arc<str>,
    description: Arc<str>,
}

impl SdlDocument {
    pub fn new(text: impl Into<Arc<str>>, name: impl Into<Arc<str>>, description: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// The SDL source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the text came from. For the user document this is the path of its backing file.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// A document with the same origin, holding new text.
    pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

impl fmt::Debug for SdlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdlDocument")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("len", &self.text.len())
            .finish()
    }
}

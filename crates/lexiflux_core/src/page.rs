use serde::{Deserialize, Serialize};

/// A `<title>, <text>` pair extracted from a wiki dump.
///
/// Pages are plain immutable values; they cross worker boundaries by
/// move or clone, so anything an extractor needs must be carried here
/// or closed over as an immutable value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    pub title: String,
    pub text: String,
}

impl Page {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

//! Events produced by template execution.

use serde::{Deserialize, Serialize};

/// One unit of rendered prompt output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    Text {
        text: String,
    },
    /// Starts a new message attributed to `role`.
    Role {
        role: String,
    },
    Image {
        filename: String,
        /// Encoded payload, as supplied by the host (for example base64).
        data: String,
        data_type: String,
    },
    File {
        filename: String,
        data: String,
        data_type: String,
    },
    /// Ends the current message part.
    Split,
}

impl OutputEvent {
    pub fn text(text: impl Into<String>) -> Self {
        OutputEvent::Text { text: text.into() }
    }

    pub fn role(role: impl Into<String>) -> Self {
        OutputEvent::Role { role: role.into() }
    }
}

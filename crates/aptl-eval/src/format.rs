//! Folding an event stream into chat messages.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::output::OutputEvent;

/// Role given to output that appears before any `{{#role}}` directive.
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    Image {
        filename: String,
        data: String,
        data_type: String,
    },
    File {
        filename: String,
        data: String,
        data_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Accumulates events into messages.
///
/// Consecutive text events are joined into one part. A role event starts a
/// new message; a split, image or file ends the current text part.
#[derive(Debug, Default)]
pub struct PromptFormatter {
    messages: Vec<Message>,
    current: Option<Message>,
    text: String,
}

impl PromptFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::Role { role } => {
                self.finish_message();
                self.current = Some(Message {
                    role,
                    parts: Vec::new(),
                });
            }
            OutputEvent::Text { text } => {
                self.message();
                self.text.push_str(&text);
            }
            OutputEvent::Split => {
                self.message();
                self.flush_text();
            }
            OutputEvent::Image {
                filename,
                data,
                data_type,
            } => self.push_part(Part::Image {
                filename,
                data,
                data_type,
            }),
            OutputEvent::File {
                filename,
                data,
                data_type,
            } => self.push_part(Part::File {
                filename,
                data,
                data_type,
            }),
        }
    }

    pub fn finish(mut self) -> Vec<Message> {
        self.finish_message();
        self.messages
    }

    /// The open message, starting a `user` one if nothing has set a role yet.
    fn message(&mut self) -> &mut Message {
        self.current.get_or_insert_with(|| Message {
            role: DEFAULT_ROLE.to_string(),
            parts: Vec::new(),
        })
    }

    fn push_part(&mut self, part: Part) {
        self.flush_text();
        self.message().parts.push(part);
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        self.message().parts.push(Part::Text { text });
    }

    fn finish_message(&mut self) {
        self.flush_text();
        if let Some(message) = self.current.take() {
            if !message.parts.is_empty() {
                self.messages.push(message);
            }
        }
    }
}

pub fn format_messages(events: impl IntoIterator<Item = OutputEvent>) -> Vec<Message> {
    let mut formatter = PromptFormatter::new();
    for event in events {
        formatter.push(event);
    }
    formatter.finish()
}

/// Format the events of an execution, stopping at the first error.
pub fn try_format_messages(
    events: impl IntoIterator<Item = Result<OutputEvent, Error>>,
) -> crate::Result<Vec<Message>> {
    let mut formatter = PromptFormatter::new();
    for event in events {
        formatter.push(event?);
    }
    Ok(formatter.finish())
}

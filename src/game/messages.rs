//! # Message Feed
//!
//! Append-only log of what happened, in the order it happened. Presentation
//! reads new entries with [`MessageLog::since`] after each performed intent.

use serde::{Deserialize, Serialize};

/// What a message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageCategory {
    /// Movement, pickups, level ups and other ordinary events
    Info,
    /// Hits, misses and deaths
    Combat,
    /// An intent the player asked for was refused
    Rejection,
    Debug,
}

/// Suggested color for presenting a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorHint {
    White,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Grey,
}

/// One entry of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub category: MessageCategory,
    pub color: ColorHint,
}

impl Message {
    pub fn new(text: impl Into<String>, category: MessageCategory, color: ColorHint) -> Self {
        Self {
            text: text.into(),
            category,
            color,
        }
    }
}

/// The message feed of a session.
///
/// # Examples
///
/// ```
/// use delve::MessageLog;
///
/// let mut log = MessageLog::new();
/// log.info("You enter the dungeon.");
/// let mark = log.len();
/// log.combat("The rat bites you.");
///
/// let fresh: Vec<_> = log.since(mark).iter().map(|m| m.text.as_str()).collect();
/// assert_eq!(fresh, vec!["The rat bites you."]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        log::debug!("message: {}", message.text);
        self.messages.push(message);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(Message::new(text, MessageCategory::Info, ColorHint::White));
    }

    pub fn combat(&mut self, text: impl Into<String>) {
        self.push(Message::new(text, MessageCategory::Combat, ColorHint::Red));
    }

    pub fn reject(&mut self, text: impl Into<String>) {
        self.push(Message::new(text, MessageCategory::Rejection, ColorHint::Yellow));
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended at or after `index`. Out of range gives an empty slice.
    pub fn since(&self, index: usize) -> &[Message] {
        self.messages.get(index..).unwrap_or(&[])
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any message contains the given text.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.text.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_and_colors() {
        let mut log = MessageLog::new();
        log.info("a");
        log.combat("b");
        log.reject("c");

        let categories: Vec<_> = log.messages().iter().map(|m| m.category).collect();
        assert_eq!(
            categories,
            vec![
                MessageCategory::Info,
                MessageCategory::Combat,
                MessageCategory::Rejection
            ]
        );
        assert_eq!(log.messages()[1].color, ColorHint::Red);
    }

    #[test]
    fn test_since_out_of_range() {
        let mut log = MessageLog::new();
        log.info("only");
        assert_eq!(log.since(0).len(), 1);
        assert!(log.since(1).is_empty());
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn test_contains() {
        let mut log = MessageLog::new();
        assert!(log.is_empty());
        log.combat("The goblin is slain!");
        assert!(log.contains("slain"));
        assert!(!log.contains("victory"));
    }
}

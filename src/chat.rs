//! Chat message delivery
//!
//! Rendered tables are posted as chat messages through a [`ChatSink`].
//! [`ChatLog`] collects them in memory; [`WriterSink`] writes them out.

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Chat delivery errors
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to write message: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Who a message is spoken by
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Display name
    pub alias: String,
    /// Actor the speaker represents, if any
    pub actor: Option<String>,
}

impl Speaker {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            actor: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// A chat message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub user: Option<String>,
    pub speaker: Option<Speaker>,
    /// Rendered markup
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message with a fresh id and the current time
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user: None,
            speaker: None,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn with_speaker(mut self, speaker: Option<Speaker>) -> Self {
        self.speaker = speaker;
        self
    }
}

/// Accepts rendered messages for persistence or broadcast
pub trait ChatSink {
    fn create(&self, message: ChatMessage) -> Result<(), ChatError>;
}

impl<S: ChatSink + ?Sized> ChatSink for &S {
    fn create(&self, message: ChatMessage) -> Result<(), ChatError> {
        (**self).create(message)
    }
}

impl<S: ChatSink + ?Sized> ChatSink for Arc<S> {
    fn create(&self, message: ChatMessage) -> Result<(), ChatError> {
        (**self).create(message)
    }
}

/// In-memory chat log
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Mutex<Vec<ChatMessage>>,
}

impl ChatLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap in Arc for sharing
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Drain all messages from the log
    pub fn drain(&self) -> Vec<ChatMessage> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Copy of the most recent message
    pub fn last(&self) -> Option<ChatMessage> {
        self.messages.lock().last().cloned()
    }

    /// Get count of pending messages
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Check if log is empty
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl ChatSink for ChatLog {
    fn create(&self, message: ChatMessage) -> Result<(), ChatError> {
        self.messages.lock().push(message);
        Ok(())
    }
}

/// Output format of a [`WriterSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriterFormat {
    /// Speaker line followed by the content
    #[default]
    Plain,
    /// One JSON object per line
    Json,
}

/// Writes each message to an `io::Write`
pub struct WriterSink<W> {
    writer: Mutex<W>,
    format: WriterFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: WriterFormat) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> ChatSink for WriterSink<W> {
    fn create(&self, message: ChatMessage) -> Result<(), ChatError> {
        let mut writer = self.writer.lock();
        match self.format {
            WriterFormat::Plain => {
                if let Some(speaker) = &message.speaker {
                    writeln!(writer, "{}:", speaker.alias)?;
                }
                writeln!(writer, "{}", message.content)?;
            }
            WriterFormat::Json => {
                serde_json::to_writer(&mut *writer, &message)?;
                writeln!(writer)?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Chat reference: numeric id or username, as accepted by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChatRef {
    Id(i64),
    Username(String),
}

impl ChatRef {
    /// Numeric strings become ids, anything else a username.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        match t.parse::<i64>() {
            Ok(id) => ChatRef::Id(id),
            Err(_) => ChatRef::Username(t.to_string()),
        }
    }
}

impl std::fmt::Display for ChatRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{id}"),
            ChatRef::Username(name) => write!(f, "{name}"),
        }
    }
}

impl From<i64> for ChatRef {
    fn from(id: i64) -> Self {
        ChatRef::Id(id)
    }
}

impl From<&str> for ChatRef {
    fn from(name: &str) -> Self {
        ChatRef::Username(name.to_string())
    }
}

/// A message as seen by the engine. Read-only snapshot produced by the chat
/// backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: i32,
    pub chat_id: i64,
    pub date: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl Message {
    /// Text used for duplicate comparison: body text, else media caption.
    pub fn content(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

/// Identity snapshot of the connected account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub phone_number: Option<String>,
    pub is_premium: Option<bool>,
}

/// Declared payload kind of an incoming comment request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    Text,
    Photo,
    Video,
}

impl PayloadKind {
    /// Unknown declared kinds degrade to text.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "photo" => PayloadKind::Photo,
            "video" => PayloadKind::Video,
            _ => PayloadKind::Text,
        }
    }

    pub fn is_media(self) -> bool {
        matches!(self, PayloadKind::Photo | PayloadKind::Video)
    }
}

/// Media kind actually posted, decided from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// Rendering mode for text replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Markdown,
    Plain,
}

/// One comment to place, as constructed by the HTTP layer.
#[derive(Clone, Debug)]
pub struct CommentRequest {
    pub chat: ChatRef,
    pub kind: PayloadKind,
    pub media_path: Option<PathBuf>,
    pub caption: String,
}

/// Outcome of a placement run.
#[derive(Clone, Debug)]
pub enum Placement {
    /// A new comment was posted under `parent_id`.
    Created { message: Message, parent_id: i32 },
    /// An equivalent comment already exists under `parent_id`; nothing was
    /// posted.
    Skipped { existing: Message, parent_id: i32 },
    /// History was exhausted without an anchor or a duplicate.
    NotFound,
}

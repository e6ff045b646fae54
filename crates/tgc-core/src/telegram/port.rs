use std::path::Path;

use async_trait::async_trait;

use crate::domain::{ChatRef, Identity, MediaKind, Message, RenderMode};
use crate::Result;

/// Connected chat backend for one unit of work.
///
/// Implementations wrap a live client session. The engine opens a session,
/// drives it strictly sequentially and disconnects it on every exit path; a
/// session never outlives the request that opened it.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Most recent messages of a chat, newest first.
    ///
    /// Fails with `Error::ChatUnresolvable` when the chat does not exist or
    /// is not accessible.
    async fn get_history(&self, chat: &ChatRef, limit: usize) -> Result<Vec<Message>>;

    /// Comments in the discussion thread under `message_id`.
    ///
    /// Fails with `Error::ThreadUnavailable` when the message has no
    /// discussion thread.
    async fn get_discussion_replies(
        &self,
        chat: &ChatRef,
        message_id: i32,
        limit: usize,
    ) -> Result<Vec<Message>>;

    /// The discussion-root message for `message_id`, addressable for replies
    /// in the linked discussion group.
    async fn get_discussion_message(&self, chat: &ChatRef, message_id: i32) -> Result<Message>;

    /// Post a text reply under a discussion root.
    async fn reply_text(&self, root: &Message, text: &str, mode: RenderMode) -> Result<Message>;

    /// Post a photo or video reply with a caption under a discussion root.
    async fn reply_media(
        &self,
        root: &Message,
        kind: MediaKind,
        path: &Path,
        caption: &str,
    ) -> Result<Message>;

    /// Identity of the connected account.
    async fn who_am_i(&self) -> Result<Identity>;

    /// Release the underlying connection. No further calls after this.
    async fn disconnect(&self) -> Result<()>;
}

/// Session provider: opens a connected [`ChatTransport`] from a durable
/// session credential.
#[async_trait]
pub trait TelegramConnector: Send + Sync {
    /// Connect with the given session string.
    ///
    /// Fails with `Error::Auth` for a malformed, expired or revoked
    /// credential.
    async fn connect(&self, credential: &str) -> Result<Box<dyn ChatTransport>>;
}

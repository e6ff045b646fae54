//! In-memory chat backend.
//!
//! Available in all builds (not just tests): it backs the `memory` deployment
//! backend and the HTTP integration tests, and unit tests script it directly.
//! Chats, histories and threads are seeded through [`MemoryBackend`]; posted
//! replies become the newest entry of their thread so a later scan sees them
//! first, like the real backend would.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{ChatRef, Identity, MediaKind, Message, RenderMode};
use crate::errors::Error;
use crate::telegram::port::{ChatTransport, TelegramConnector};
use crate::Result;

/// What a transport was asked to post.
#[derive(Clone, Debug)]
pub struct PostRecord {
    pub chat_id: i64,
    pub parent_id: i32,
    pub kind: PostKind,
    pub body: String,
    pub mode: Option<RenderMode>,
    pub path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostKind {
    Text,
    Photo,
    Video,
}

#[derive(Default)]
struct ChatScript {
    chat_id: i64,
    /// Scripted history, newest first.
    history: Vec<Message>,
    /// Discussion threads by root id, newest reply first. A missing root id
    /// means the message has no thread.
    replies: HashMap<i32, Vec<Message>>,
}

struct MemoryState {
    chats: HashMap<String, ChatScript>,
    identity: Identity,
    next_id: i32,
    posts: Vec<PostRecord>,
    disconnects: usize,
    disconnect_error: Option<String>,
    reply_fetches: Vec<(String, i32)>,
}

// ============== Backend (shared scripted world) ==============

/// Scripted world shared by a connector and the sessions it hands out.
#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                chats: HashMap::new(),
                identity: Identity {
                    id: 1,
                    first_name: Some("Memory".to_string()),
                    last_name: None,
                    username: Some("memory".to_string()),
                    phone_number: None,
                    is_premium: Some(false),
                },
                // Allocated ids start well above typical scripted ids.
                next_id: 1000,
                posts: Vec::new(),
                disconnects: 0,
                disconnect_error: None,
                reply_fetches: Vec::new(),
            })),
        }
    }

    /// Register a resolvable chat. Unregistered chats fail with
    /// `ChatUnresolvable`.
    pub fn add_chat(&self, key: &str, chat_id: i64) {
        let mut state = self.state.lock().unwrap();
        state.chats.insert(
            key.to_string(),
            ChatScript {
                chat_id,
                ..ChatScript::default()
            },
        );
    }

    /// Append a message to a chat's history (push newest first).
    pub fn push_history(&self, key: &str, message: Message) {
        let mut state = self.state.lock().unwrap();
        if let Some(chat) = state.chats.get_mut(key) {
            chat.history.push(message);
        }
    }

    /// Script a discussion thread with the given comments under `root_id`.
    pub fn set_replies(&self, key: &str, root_id: i32, replies: Vec<Message>) {
        let mut state = self.state.lock().unwrap();
        if let Some(chat) = state.chats.get_mut(key) {
            chat.replies.insert(root_id, replies);
        }
    }

    /// Script an empty discussion thread under `root_id`.
    pub fn open_thread(&self, key: &str, root_id: i32) {
        self.set_replies(key, root_id, Vec::new());
    }

    pub fn set_identity(&self, identity: Identity) {
        self.state.lock().unwrap().identity = identity;
    }

    /// Make every disconnect fail with the given message. Attempts are still
    /// counted.
    pub fn fail_disconnects(&self, error: &str) {
        self.state.lock().unwrap().disconnect_error = Some(error.to_string());
    }

    /// A transport over this backend without going through a connector.
    pub fn session(&self) -> MemoryTransport {
        MemoryTransport {
            backend: self.clone(),
        }
    }

    // Introspection for assertions.

    pub fn posts(&self) -> Vec<PostRecord> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn disconnect_count(&self) -> usize {
        self.state.lock().unwrap().disconnects
    }

    /// Every `get_discussion_replies` call as (chat key, root id), in order.
    pub fn reply_fetches(&self) -> Vec<(String, i32)> {
        self.state.lock().unwrap().reply_fetches.clone()
    }

    pub fn replies_of(&self, key: &str, root_id: i32) -> Vec<Message> {
        let state = self.state.lock().unwrap();
        state
            .chats
            .get(key)
            .and_then(|c| c.replies.get(&root_id))
            .cloned()
            .unwrap_or_default()
    }
}

// ============== Connector ==============

enum AuthBehavior {
    /// Any non-empty credential connects.
    AcceptNonEmpty,
    /// Only the listed credentials connect.
    Accept(Vec<String>),
    /// Every connect fails with the given message.
    Reject(String),
}

/// Session provider over a [`MemoryBackend`].
pub struct MemoryConnector {
    backend: MemoryBackend,
    auth: AuthBehavior,
}

impl MemoryConnector {
    pub fn new(backend: MemoryBackend) -> Self {
        Self {
            backend,
            auth: AuthBehavior::AcceptNonEmpty,
        }
    }

    pub fn accepting(backend: MemoryBackend, credentials: &[&str]) -> Self {
        Self {
            backend,
            auth: AuthBehavior::Accept(credentials.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn rejecting(backend: MemoryBackend, error: &str) -> Self {
        Self {
            backend,
            auth: AuthBehavior::Reject(error.to_string()),
        }
    }
}

#[async_trait]
impl TelegramConnector for MemoryConnector {
    async fn connect(&self, credential: &str) -> Result<Box<dyn ChatTransport>> {
        match &self.auth {
            AuthBehavior::Reject(msg) => return Err(Error::Auth(msg.clone())),
            AuthBehavior::AcceptNonEmpty if !credential.trim().is_empty() => {}
            AuthBehavior::Accept(list) if list.iter().any(|c| c == credential) => {}
            _ => return Err(Error::Auth("invalid session string".to_string())),
        }

        Ok(Box::new(self.backend.session()))
    }
}

// ============== Transport ==============

/// One connected session over the shared backend state.
pub struct MemoryTransport {
    backend: MemoryBackend,
}

impl MemoryTransport {
    fn with_chat<T>(
        &self,
        chat: &ChatRef,
        f: impl FnOnce(&mut ChatScript) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.backend.state.lock().unwrap();
        let key = chat.to_string();
        match state.chats.get_mut(&key) {
            Some(script) => f(script),
            None => Err(Error::ChatUnresolvable(key)),
        }
    }

    fn record_post(&self, record: PostRecord, posted: Message) -> Message {
        let mut state = self.backend.state.lock().unwrap();
        if let Some(script) = state
            .chats
            .values_mut()
            .find(|c| c.chat_id == record.chat_id)
        {
            script
                .replies
                .entry(record.parent_id)
                .or_default()
                .insert(0, posted.clone());
        }
        state.posts.push(record);
        posted
    }

    fn alloc_id(&self) -> i32 {
        let mut state = self.backend.state.lock().unwrap();
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    async fn get_history(&self, chat: &ChatRef, limit: usize) -> Result<Vec<Message>> {
        self.with_chat(chat, |script| {
            Ok(script.history.iter().take(limit).cloned().collect())
        })
    }

    async fn get_discussion_replies(
        &self,
        chat: &ChatRef,
        message_id: i32,
        limit: usize,
    ) -> Result<Vec<Message>> {
        {
            let mut state = self.backend.state.lock().unwrap();
            state.reply_fetches.push((chat.to_string(), message_id));
        }
        self.with_chat(chat, |script| match script.replies.get(&message_id) {
            Some(replies) => Ok(replies.iter().take(limit).cloned().collect()),
            None => Err(Error::ThreadUnavailable { message_id }),
        })
    }

    async fn get_discussion_message(&self, chat: &ChatRef, message_id: i32) -> Result<Message> {
        self.with_chat(chat, |script| {
            if !script.replies.contains_key(&message_id) {
                return Err(Error::ThreadUnavailable { message_id });
            }
            Ok(Message {
                id: message_id,
                chat_id: script.chat_id,
                date: Some(Utc::now()),
                text: None,
                caption: None,
            })
        })
    }

    async fn reply_text(&self, root: &Message, text: &str, mode: RenderMode) -> Result<Message> {
        let posted = Message {
            id: self.alloc_id(),
            chat_id: root.chat_id,
            date: Some(Utc::now()),
            text: Some(text.to_string()),
            caption: None,
        };
        Ok(self.record_post(
            PostRecord {
                chat_id: root.chat_id,
                parent_id: root.id,
                kind: PostKind::Text,
                body: text.to_string(),
                mode: Some(mode),
                path: None,
            },
            posted,
        ))
    }

    async fn reply_media(
        &self,
        root: &Message,
        kind: MediaKind,
        path: &Path,
        caption: &str,
    ) -> Result<Message> {
        let posted = Message {
            id: self.alloc_id(),
            chat_id: root.chat_id,
            date: Some(Utc::now()),
            text: None,
            caption: Some(caption.to_string()),
        };
        Ok(self.record_post(
            PostRecord {
                chat_id: root.chat_id,
                parent_id: root.id,
                kind: match kind {
                    MediaKind::Photo => PostKind::Photo,
                    MediaKind::Video => PostKind::Video,
                },
                body: caption.to_string(),
                mode: None,
                path: Some(path.to_path_buf()),
            },
            posted,
        ))
    }

    async fn who_am_i(&self) -> Result<Identity> {
        Ok(self.backend.state.lock().unwrap().identity.clone())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.backend.state.lock().unwrap();
        state.disconnects += 1;
        match &state.disconnect_error {
            Some(msg) => Err(Error::Transport(msg.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: i32, text: &str) -> Message {
        Message {
            id,
            chat_id: -100,
            date: None,
            text: Some(text.to_string()),
            caption: None,
        }
    }

    #[tokio::test]
    async fn history_respects_limit_and_order() {
        let backend = MemoryBackend::new();
        backend.add_chat("@promo", -100);
        backend.push_history("@promo", msg(3, "newest"));
        backend.push_history("@promo", msg(2, "middle"));
        backend.push_history("@promo", msg(1, "oldest"));

        let session = backend.session();
        let history = session
            .get_history(&ChatRef::from("@promo"), 2)
            .await
            .unwrap();
        assert_eq!(history.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[tokio::test]
    async fn unknown_chat_is_unresolvable() {
        let backend = MemoryBackend::new();
        let session = backend.session();

        let err = session
            .get_history(&ChatRef::from("@missing"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChatUnresolvable(_)));
    }

    #[tokio::test]
    async fn missing_thread_fails_and_is_recorded() {
        let backend = MemoryBackend::new();
        backend.add_chat("@promo", -100);

        let session = backend.session();
        let err = session
            .get_discussion_replies(&ChatRef::from("@promo"), 7, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ThreadUnavailable { message_id: 7 }));
        assert_eq!(backend.reply_fetches(), vec![("@promo".to_string(), 7)]);
    }

    #[tokio::test]
    async fn posted_reply_joins_its_thread() {
        let backend = MemoryBackend::new();
        backend.add_chat("@promo", -100);
        backend.open_thread("@promo", 5);

        let session = backend.session();
        let root = session
            .get_discussion_message(&ChatRef::from("@promo"), 5)
            .await
            .unwrap();
        let posted = session
            .reply_text(&root, "hello", RenderMode::Plain)
            .await
            .unwrap();

        let thread = backend.replies_of("@promo", 5);
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, posted.id);
        assert!(posted.id > 1000);
    }

    #[tokio::test]
    async fn posted_reply_becomes_the_newest() {
        let backend = MemoryBackend::new();
        backend.add_chat("@promo", -100);
        backend.set_replies("@promo", 5, vec![msg(400, "older comment")]);

        let session = backend.session();
        let root = session
            .get_discussion_message(&ChatRef::from("@promo"), 5)
            .await
            .unwrap();
        let posted = session
            .reply_text(&root, "fresh", RenderMode::Plain)
            .await
            .unwrap();

        // A limit-1 window must surface the new reply, not the seeded one.
        let replies = session
            .get_discussion_replies(&ChatRef::from("@promo"), 5, 1)
            .await
            .unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].id, posted.id);
    }

    #[tokio::test]
    async fn rejecting_connector_fails_auth() {
        let backend = MemoryBackend::new();
        let connector = MemoryConnector::rejecting(backend, "session revoked");

        let err = connector.connect("whatever").await.err().unwrap();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[tokio::test]
    async fn empty_credential_is_rejected() {
        let backend = MemoryBackend::new();
        let connector = MemoryConnector::new(backend);

        assert!(connector.connect("  ").await.is_err());
        assert!(connector.connect("tok").await.is_ok());
    }

    #[tokio::test]
    async fn credential_allow_list_is_honored() {
        let backend = MemoryBackend::new();
        let connector = MemoryConnector::accepting(backend, &["good"]);

        assert!(connector.connect("good").await.is_ok());
        assert!(connector.connect("bad").await.is_err());
    }
}

//! Anchor selection over a chat's recent history.
//!
//! Walks the history newest first and settles on the first message whose
//! discussion thread is open and does not already carry the candidate text.
//! Messages without a thread are skipped rather than treated as failures;
//! anything else wrong with the chat aborts the scan.

use tracing::debug;

use crate::dedup::is_duplicate;
use crate::domain::{ChatRef, Message};
use crate::telegram::port::ChatTransport;
use crate::Result;

/// Outcome of a history scan.
#[derive(Clone, Debug)]
pub enum Selection {
    /// Found a commentable message with no duplicate in its thread.
    Anchor(Message),
    /// The candidate text already sits in this message's thread.
    Duplicate { existing: Message, parent_id: i32 },
    /// No message in the scanned window could take the comment.
    Exhausted,
}

pub struct TargetSelector {
    history_limit: usize,
    reply_limit: usize,
}

impl TargetSelector {
    pub fn new(history_limit: usize, reply_limit: usize) -> Self {
        Self {
            history_limit,
            reply_limit,
        }
    }

    /// Scan `chat` for a place to put `candidate`.
    ///
    /// The newest thread-bearing message wins, so a duplicate under an older
    /// message is never reached once a newer anchor exists.
    pub async fn select(
        &self,
        transport: &dyn ChatTransport,
        chat: &ChatRef,
        candidate: &str,
    ) -> Result<Selection> {
        let history = transport.get_history(chat, self.history_limit).await?;

        for message in &history {
            let replies = match transport
                .get_discussion_replies(chat, message.id, self.reply_limit)
                .await
            {
                Ok(replies) => replies,
                Err(crate::Error::ThreadUnavailable { message_id }) => {
                    debug!(%chat, message_id, "message has no discussion thread, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let Some(existing) = replies
                .iter()
                .find(|reply| is_duplicate(candidate, reply.content()))
            {
                return Ok(Selection::Duplicate {
                    existing: existing.clone(),
                    parent_id: message.id,
                });
            }

            return Ok(Selection::Anchor(message.clone()));
        }

        Ok(Selection::Exhausted)
    }
}

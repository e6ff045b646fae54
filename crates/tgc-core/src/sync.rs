//! Directory blob synchronization into a pinned discussion thread.
//!
//! The directory listing lives as a comment under a well-known message of the
//! directory chat. Before placing comments elsewhere, the service makes sure
//! that comment exists and is current. The root message id can drift by one
//! when the chat is reshuffled, so the scan probes a short window of ids
//! instead of a single one.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dedup::is_duplicate;
use crate::domain::{ChatRef, RenderMode};
use crate::telegram::port::ChatTransport;
use crate::Result;

/// How many root ids to probe and how long to wait between probes.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

/// What the scan did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The thread already carries the blob.
    AlreadySynced,
    /// The blob was posted under this root message.
    Posted { root_id: i32 },
    /// No probed id had a usable thread.
    GaveUp,
    /// Nothing to sync (empty blob).
    Empty,
}

pub struct AnchorScanner {
    chat: ChatRef,
    start_id: i32,
    retry: RetryPolicy,
}

impl AnchorScanner {
    pub fn new(chat: ChatRef, start_id: i32, retry: RetryPolicy) -> Self {
        Self {
            chat,
            start_id,
            retry,
        }
    }

    /// Ids to probe, most likely first. The root usually sits at `start_id`
    /// but shifts down by one when an older message is deleted; from zero the
    /// only way is up.
    fn candidate_ids(&self) -> Vec<i32> {
        let fallback = if self.start_id > 0 {
            self.start_id - 1
        } else {
            self.start_id + 1
        };
        let mut ids = vec![self.start_id, fallback];
        ids.truncate(self.retry.max_attempts as usize);
        ids
    }

    /// Ensure `blob` sits in the directory thread, posting it if absent.
    pub async fn sync(&self, transport: &dyn ChatTransport, blob: &str) -> SyncOutcome {
        if blob.trim().is_empty() {
            return SyncOutcome::Empty;
        }

        for (attempt, root_id) in self.candidate_ids().into_iter().enumerate() {
            if attempt > 0 {
                tokio::time::sleep(self.retry.backoff).await;
            }
            match self.try_root(transport, root_id, blob).await {
                Ok(outcome) => return outcome,
                Err(e) => {
                    debug!(chat = %self.chat, root_id, error = %e, "directory root not usable");
                }
            }
        }

        warn!(
            chat = %self.chat,
            start_id = self.start_id,
            "no directory root found, giving up"
        );
        SyncOutcome::GaveUp
    }

    async fn try_root(
        &self,
        transport: &dyn ChatTransport,
        root_id: i32,
        blob: &str,
    ) -> Result<SyncOutcome> {
        let replies = transport
            .get_discussion_replies(&self.chat, root_id, 1)
            .await?;
        if replies
            .iter()
            .any(|reply| is_duplicate(blob, reply.content()))
        {
            info!(chat = %self.chat, root_id, "directory blob already in place");
            return Ok(SyncOutcome::AlreadySynced);
        }

        let root = transport.get_discussion_message(&self.chat, root_id).await?;
        // Plain rendering keeps the posted bytes identical to the blob, so
        // the next scan's containment check can find it.
        transport.reply_text(&root, blob, RenderMode::Plain).await?;
        info!(chat = %self.chat, root_id, "directory blob posted");
        Ok(SyncOutcome::Posted { root_id })
    }
}

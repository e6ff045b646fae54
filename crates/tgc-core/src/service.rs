//! Top-level orchestration of a comment placement.
//!
//! Every unit of work opens its own session from the connector, runs against
//! it, and closes it on every exit path; a disconnect failure is logged and
//! never replaces the unit's result. Nothing serializes concurrent units
//! against the same chat, so two racing requests can both pass the duplicate
//! scan and both post.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::directory::{format_directory, DirectoryStore};
use crate::domain::{CommentRequest, Identity, Placement};
use crate::poster::post_comment;
use crate::selector::{Selection, TargetSelector};
use crate::sync::AnchorScanner;
use crate::telegram::port::{ChatTransport, TelegramConnector};
use crate::Result;

pub struct PlacementService {
    connector: Arc<dyn TelegramConnector>,
    store: Arc<dyn DirectoryStore>,
    config: Arc<Config>,
}

/// Soft result of a session probe: an unusable credential is an answer,
/// not an error.
#[derive(Clone, Debug)]
pub struct SessionCheck {
    pub valid: bool,
    pub identity: Option<Identity>,
    pub error: Option<String>,
}

impl PlacementService {
    pub fn new(
        connector: Arc<dyn TelegramConnector>,
        store: Arc<dyn DirectoryStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            connector,
            store,
            config,
        }
    }

    /// Run the full pipeline: sync the directory blob, scan the target chat,
    /// then post or skip.
    pub async fn send_comment(
        &self,
        credential: &str,
        request: &CommentRequest,
    ) -> Result<Placement> {
        let session = self.connector.connect(credential).await?;
        let result = self.send_on_session(session.as_ref(), request).await;
        release(session.as_ref()).await;
        result
    }

    async fn send_on_session(
        &self,
        session: &dyn ChatTransport,
        request: &CommentRequest,
    ) -> Result<Placement> {
        self.sync_directory(session).await;

        let selector = TargetSelector::new(self.config.history_limit, self.config.reply_limit);
        match selector
            .select(session, &request.chat, &request.caption)
            .await?
        {
            Selection::Anchor(anchor) => {
                let message = post_comment(session, &anchor, request).await?;
                info!(chat = %request.chat, message_id = message.id, "comment placed");
                Ok(Placement::Created {
                    message,
                    parent_id: anchor.id,
                })
            }
            Selection::Duplicate {
                existing,
                parent_id,
            } => {
                info!(chat = %request.chat, parent_id, "comment already present, skipping");
                Ok(Placement::Skipped {
                    existing,
                    parent_id,
                })
            }
            Selection::Exhausted => {
                info!(chat = %request.chat, "no commentable message in recent history");
                Ok(Placement::NotFound)
            }
        }
    }

    /// Keep the channel directory comment current. Best effort: a missing
    /// directory chat disables the step, and a store failure only skips it.
    async fn sync_directory(&self, session: &dyn ChatTransport) {
        let Some(chat) = &self.config.directory_chat else {
            return;
        };

        let rows = match self.store.channel_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "directory store unavailable, skipping sync");
                return;
            }
        };

        let scanner = AnchorScanner::new(
            chat.clone(),
            self.config.directory_root_id,
            self.config.sync_retry,
        );
        let outcome = scanner.sync(session, &format_directory(&rows)).await;
        info!(?outcome, "directory sync finished");
    }

    /// Probe whether a credential yields a working session.
    pub async fn validate_session(&self, credential: &str) -> SessionCheck {
        match self.identity(credential).await {
            Ok(identity) => SessionCheck {
                valid: true,
                identity: Some(identity),
                error: None,
            },
            Err(e) => SessionCheck {
                valid: false,
                identity: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Who the credential authenticates as.
    pub async fn identity(&self, credential: &str) -> Result<Identity> {
        let session = self.connector.connect(credential).await?;
        let result = session.who_am_i().await;
        release(session.as_ref()).await;
        result
    }
}

async fn release(session: &dyn ChatTransport) {
    if let Err(e) = session.disconnect().await {
        warn!(error = %e, "session disconnect failed");
    }
}

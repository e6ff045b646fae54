//! Channel directory: store port and the formatted listing.

use async_trait::async_trait;

use crate::Result;

/// One (category, channel) pair from the directory store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryRow {
    pub category: String,
    pub channel: String,
}

/// Read-only port over the category/channel store.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Rows sorted by category then channel; channels without a username are
    /// already excluded.
    async fn channel_rows(&self) -> Result<Vec<DirectoryRow>>;
}

/// Render directory rows into the text blob posted to the anchor thread.
///
/// Categories keep first-seen order; each block is the category name followed
/// by its channels, blocks joined by a blank line. Equal input renders to
/// byte-identical output, so a later run can recognize its own post.
pub fn format_directory(rows: &[DirectoryRow]) -> String {
    let mut blocks: Vec<(String, Vec<String>)> = Vec::new();
    for row in rows {
        match blocks.iter_mut().find(|(cat, _)| cat == &row.category) {
            Some((_, channels)) => channels.push(row.channel.clone()),
            None => blocks.push((row.category.clone(), vec![row.channel.clone()])),
        }
    }

    blocks
        .iter()
        .map(|(cat, channels)| format!("{cat}\n{}", channels.join("\n")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

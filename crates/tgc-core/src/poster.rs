//! Posting a comment under a chosen anchor message.

use std::path::Path;

use tracing::info;

use crate::domain::{CommentRequest, MediaKind, Message, RenderMode};
use crate::telegram::port::ChatTransport;
use crate::Result;

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Decide how to upload a file from its extension alone. The declared payload
/// kind only gates whether media is sent at all; a `.mp4` sent as "photo"
/// still goes out as video.
pub fn media_kind_for(path: &Path) -> MediaKind {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Photo,
        _ => MediaKind::Video,
    }
}

/// Place the request's payload as a comment in `anchor`'s discussion thread.
///
/// The anchor comes from the chat's own history; replying has to go through
/// the linked discussion group, so the anchor is first resolved to its
/// counterpart message there.
pub async fn post_comment(
    transport: &dyn ChatTransport,
    anchor: &Message,
    request: &CommentRequest,
) -> Result<Message> {
    let root = transport
        .get_discussion_message(&request.chat, anchor.id)
        .await?;

    let posted = match (&request.media_path, request.kind.is_media()) {
        (Some(path), true) => {
            let kind = media_kind_for(path);
            info!(chat = %request.chat, anchor_id = anchor.id, ?kind, "posting media comment");
            transport
                .reply_media(&root, kind, path, &request.caption)
                .await?
        }
        _ => {
            info!(chat = %request.chat, anchor_id = anchor.id, "posting text comment");
            transport
                .reply_text(&root, &request.caption, RenderMode::Markdown)
                .await?
        }
    };

    Ok(posted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::domain::{ChatRef, PayloadKind};
    use crate::telegram::memory::{MemoryBackend, PostKind};

    fn anchor() -> Message {
        Message {
            id: 42,
            chat_id: -100,
            date: None,
            text: Some("channel post".to_string()),
            caption: None,
        }
    }

    fn request(kind: PayloadKind, path: Option<&str>, caption: &str) -> CommentRequest {
        CommentRequest {
            chat: ChatRef::from("@promo"),
            kind,
            media_path: path.map(PathBuf::from),
            caption: caption.to_string(),
        }
    }

    fn scripted_backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.add_chat("@promo", -100);
        backend.open_thread("@promo", 42);
        backend
    }

    #[test]
    fn image_extensions_map_to_photo() {
        for name in ["a.png", "a.jpg", "a.jpeg", "a.gif", "a.JPG", "a.PNG"] {
            assert_eq!(media_kind_for(Path::new(name)), MediaKind::Photo, "{name}");
        }
    }

    #[test]
    fn everything_else_maps_to_video() {
        for name in ["a.mp4", "a.mov", "a.webm", "a.pdf", "noext"] {
            assert_eq!(media_kind_for(Path::new(name)), MediaKind::Video, "{name}");
        }
    }

    #[tokio::test]
    async fn text_comments_render_markdown() {
        let backend = scripted_backend();
        let session = backend.session();

        let posted = post_comment(
            &session,
            &anchor(),
            &request(PayloadKind::Text, None, "*bold* pitch"),
        )
        .await
        .unwrap();

        let posts = backend.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].kind, PostKind::Text);
        assert_eq!(posts[0].body, "*bold* pitch");
        assert_eq!(posts[0].mode, Some(RenderMode::Markdown));
        assert_eq!(posts[0].parent_id, 42);
        assert_eq!(posted.text.as_deref(), Some("*bold* pitch"));
    }

    #[tokio::test]
    async fn extension_overrides_declared_kind() {
        let backend = scripted_backend();
        let session = backend.session();

        // Declared as photo, but the file is a video.
        post_comment(
            &session,
            &anchor(),
            &request(PayloadKind::Photo, Some("/tmp/clip.mp4"), "watch this"),
        )
        .await
        .unwrap();
        // Declared as video, but the file is an image.
        post_comment(
            &session,
            &anchor(),
            &request(PayloadKind::Video, Some("/tmp/banner.jpg"), "see this"),
        )
        .await
        .unwrap();

        let posts = backend.posts();
        assert_eq!(posts[0].kind, PostKind::Video);
        assert_eq!(posts[1].kind, PostKind::Photo);
        assert_eq!(posts[1].path.as_deref(), Some(Path::new("/tmp/banner.jpg")));
    }

    #[tokio::test]
    async fn media_kind_without_a_file_falls_back_to_text() {
        let backend = scripted_backend();
        let session = backend.session();

        post_comment(
            &session,
            &anchor(),
            &request(PayloadKind::Photo, None, "caption only"),
        )
        .await
        .unwrap();

        let posts = backend.posts();
        assert_eq!(posts[0].kind, PostKind::Text);
        assert_eq!(posts[0].body, "caption only");
    }

    #[tokio::test]
    async fn closed_thread_propagates() {
        let backend = MemoryBackend::new();
        backend.add_chat("@promo", -100);
        let session = backend.session();

        let err = post_comment(
            &session,
            &anchor(),
            &request(PayloadKind::Text, None, "anything"),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ThreadUnavailable { message_id: 42 }
        ));
    }
}

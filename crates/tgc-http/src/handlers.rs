//! Request handlers for the placement API.
//!
//! Every body is a JSON envelope with a `success` flag. Normal completions
//! answer 200 (including soft-fail validation and duplicate skips), missing
//! required fields answer 400, and failures during a send answer 500 with a
//! human-readable `error` string.

use std::path::PathBuf;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tgc_core::domain::{ChatRef, CommentRequest, Message, PayloadKind, Placement};
use tgc_core::Error;
use tracing::{info, warn};

use crate::server::AppState;

const SERVICE_NAME: &str = "tgc";

#[derive(Deserialize)]
pub struct SessionBody {
    session_string: Option<String>,
}

/// `chat_id` arrives as a JSON number or a string depending on the caller.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChatIdField {
    Id(i64),
    Name(String),
}

impl ChatIdField {
    /// A zero id or a blank string counts as absent.
    fn to_chat_ref(&self) -> Option<ChatRef> {
        match self {
            ChatIdField::Id(0) => None,
            ChatIdField::Id(id) => Some(ChatRef::Id(*id)),
            ChatIdField::Name(name) if name.trim().is_empty() => None,
            ChatIdField::Name(name) => Some(ChatRef::parse(name)),
        }
    }
}

#[derive(Deserialize)]
pub struct SendMessageBody {
    session_string: Option<String>,
    chat_id: Option<ChatIdField>,
    message_type: Option<String>,
    file_path: Option<String>,
    caption: Option<String>,
}

pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "service": SERVICE_NAME })),
    )
        .into_response()
}

pub async fn validate_session(
    State(state): State<AppState>,
    Json(body): Json<SessionBody>,
) -> Response {
    let Some(credential) = body.session_string.filter(|s| !s.is_empty()) else {
        return bad_request("session_string is required");
    };

    let check = state.service.validate_session(&credential).await;
    info!(path = "/validate_session", valid = check.valid, "session probed");

    let mut payload = json!({ "success": true, "valid": check.valid });
    if let Some(identity) = &check.identity {
        payload["user_info"] = json!(identity);
    }
    if let Some(error) = &check.error {
        payload["error"] = json!(error);
    }
    (StatusCode::OK, Json(payload)).into_response()
}

pub async fn get_me(State(state): State<AppState>, Json(body): Json<SessionBody>) -> Response {
    let Some(credential) = body.session_string.filter(|s| !s.is_empty()) else {
        return bad_request("session_string is required");
    };

    match state.service.identity(&credential).await {
        Ok(identity) => (
            StatusCode::OK,
            Json(json!({ "success": true, "user_info": identity })),
        )
            .into_response(),
        Err(e) => error_response("/get_me", &e),
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageBody>,
) -> Response {
    let credential = body.session_string.filter(|s| !s.is_empty());
    let chat = body.chat_id.as_ref().and_then(ChatIdField::to_chat_ref);
    let (Some(credential), Some(chat)) = (credential, chat) else {
        return bad_request("session_string and chat_id are required");
    };

    let request = CommentRequest {
        chat,
        kind: PayloadKind::parse(body.message_type.as_deref().unwrap_or("text")),
        media_path: body.file_path.map(PathBuf::from),
        caption: body.caption.unwrap_or_default(),
    };
    info!(
        path = "/send_message",
        chat = %request.chat,
        kind = ?request.kind,
        has_file = request.media_path.is_some(),
        caption_len = request.caption.len(),
        "send requested"
    );

    match state.service.send_comment(&credential, &request).await {
        Ok(Placement::Created { message, parent_id }) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "skipped": false,
                "data": message_data(&message, parent_id),
            })),
        )
            .into_response(),
        Ok(Placement::Skipped {
            existing,
            parent_id,
        }) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "skipped": true,
                "data": message_data(&existing, parent_id),
            })),
        )
            .into_response(),
        Ok(Placement::NotFound) => {
            warn!(path = "/send_message", chat = %request.chat, "no anchor found");
            failure_response("No suitable message found to comment on")
        }
        Err(e) => error_response("/send_message", &e),
    }
}

fn message_data(message: &Message, parent_id: i32) -> Value {
    json!({
        "message_id": message.id,
        "chat_id": message.chat_id,
        "date": message.date.map(|d| d.to_rfc3339()),
        "parent_message_id": parent_id,
    })
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

fn failure_response(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

fn error_response(path: &str, error: &Error) -> Response {
    warn!(path, error = %error, "request failed");
    let message = match error {
        Error::ChatUnresolvable(_) => "Username not occupied or channel not found".to_string(),
        other => other.to_string(),
    };
    failure_response(&message)
}

use super::state::AppState;
use crate::capture::DeviceEvent;
use crate::conversation::{Message, SessionClosed};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreateChatResponse {
    pub chat_id: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitMessageResponse {
    /// False when the text was empty and nothing was sent
    pub accepted: bool,
}

#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub granted: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn chat_not_found(chat_id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, format!("Chat {} not found", chat_id))
}

fn chat_closed(chat_id: &str, e: SessionClosed) -> Response {
    error!("Chat {} is no longer running: {}", chat_id, e);
    error_response(StatusCode::GONE, format!("Chat {}: {}", chat_id, e))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /chats
/// Open a new chat seeded with the welcome message
pub async fn create_chat(State(state): State<AppState>) -> Response {
    let chat_id = format!("chat-{}", uuid::Uuid::new_v4());
    let entry = state.open_chat();

    let messages = match entry.session.snapshot().await {
        Ok(snapshot) => snapshot.messages,
        Err(e) => return chat_closed(&chat_id, e),
    };

    {
        let mut chats = state.chats.write().await;
        chats.insert(chat_id.clone(), entry);
    }

    info!("Opened chat {}", chat_id);

    (
        StatusCode::CREATED,
        Json(CreateChatResponse { chat_id, messages }),
    )
        .into_response()
}

/// GET /chats/:chat_id
/// Messages plus capture state
pub async fn get_chat(State(state): State<AppState>, Path(chat_id): Path<String>) -> Response {
    let Some(entry) = state.chat(&chat_id).await else {
        return chat_not_found(&chat_id);
    };

    match entry.session.snapshot().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => chat_closed(&chat_id, e),
    }
}

/// GET /chats/:chat_id/messages
pub async fn get_messages(State(state): State<AppState>, Path(chat_id): Path<String>) -> Response {
    let Some(entry) = state.chat(&chat_id).await else {
        return chat_not_found(&chat_id);
    };

    match entry.session.snapshot().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot.messages)).into_response(),
        Err(e) => chat_closed(&chat_id, e),
    }
}

/// POST /chats/:chat_id/messages
/// Submit typed text; the bot reply is appended when it arrives
pub async fn submit_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(req): Json<SubmitMessageRequest>,
) -> Response {
    let Some(entry) = state.chat(&chat_id).await else {
        return chat_not_found(&chat_id);
    };

    let accepted = !req.text.trim().is_empty();

    match entry.session.submit_text(req.text).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(SubmitMessageResponse { accepted })).into_response(),
        Err(e) => chat_closed(&chat_id, e),
    }
}

/// POST /chats/:chat_id/capture/start
pub async fn start_capture(State(state): State<AppState>, Path(chat_id): Path<String>) -> Response {
    let Some(entry) = state.chat(&chat_id).await else {
        return chat_not_found(&chat_id);
    };

    match entry.session.start_capture().await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => chat_closed(&chat_id, e),
    }
}

/// POST /chats/:chat_id/capture/stop
pub async fn stop_capture(State(state): State<AppState>, Path(chat_id): Path<String>) -> Response {
    let Some(entry) = state.chat(&chat_id).await else {
        return chat_not_found(&chat_id);
    };

    match entry.session.stop_capture().await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => chat_closed(&chat_id, e),
    }
}

/// POST /chats/:chat_id/capture/events
/// Forward a recognizer event from the client
pub async fn capture_event(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(event): Json<DeviceEvent>,
) -> Response {
    let Some(entry) = state.chat(&chat_id).await else {
        return chat_not_found(&chat_id);
    };

    match entry.device.emit(event).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            error!("Failed to deliver capture event to chat {}: {}", chat_id, e);
            error_response(StatusCode::GONE, format!("Chat {}: {}", chat_id, e))
        }
    }
}

/// POST /chats/:chat_id/permission
/// Record the client's microphone permission answer
pub async fn set_permission(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(req): Json<PermissionRequest>,
) -> Response {
    let Some(entry) = state.chat(&chat_id).await else {
        return chat_not_found(&chat_id);
    };

    entry.device.set_permission(req.granted);
    StatusCode::NO_CONTENT.into_response()
}

/// DELETE /chats/:chat_id
pub async fn close_chat(State(state): State<AppState>, Path(chat_id): Path<String>) -> Response {
    let entry = {
        let mut chats = state.chats.write().await;
        chats.remove(&chat_id)
    };

    let Some(entry) = entry else {
        return chat_not_found(&chat_id);
    };

    if let Err(e) = entry.session.close().await {
        // Already stopped; removing it from the registry is all that was left
        error!("Chat {} was already closed: {}", chat_id, e);
    }

    info!("Closed chat {}", chat_id);
    StatusCode::NO_CONTENT.into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

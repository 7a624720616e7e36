use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Chat lifecycle
        .route("/chats", post(handlers::create_chat))
        .route(
            "/chats/:chat_id",
            get(handlers::get_chat).delete(handlers::close_chat),
        )
        .route(
            "/chats/:chat_id/messages",
            get(handlers::get_messages).post(handlers::submit_message),
        )
        // Voice capture
        .route(
            "/chats/:chat_id/capture/start",
            post(handlers::start_capture),
        )
        .route("/chats/:chat_id/capture/stop", post(handlers::stop_capture))
        .route(
            "/chats/:chat_id/capture/events",
            post(handlers::capture_event),
        )
        .route("/chats/:chat_id/permission", post(handlers::set_permission))
        // Mobile client runs on another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

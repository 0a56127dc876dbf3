//! Application routing
//!
//! This module defines all HTTP routes for the application. Each playground
//! page has exactly one endpoint under /api.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{
    chat, client_tools, completion, generate_image, generate_speech, health, image_tool, stream,
    structured_data, transcribe, web_search,
};
use crate::middleware::logging::log_request;
use crate::schemas::ui::UI_MESSAGE_STREAM_HEADER;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Health check routes (for monitoring and container orchestration)
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness))
        .route("/liveness", get(health::liveness));

    // Playground API routes, one per UI page
    let api_routes = Router::new()
        .route("/completion", post(completion::generate_completion))
        .route("/stream", post(stream::stream_completion))
        .route("/chat", post(chat::chat))
        .route("/multi-modal-chat", post(chat::multi_modal_chat))
        .route("/structured-data", post(structured_data::stream_recipe))
        .route("/generate-image", post(generate_image::generate_image))
        .route("/generate-image-tool", post(image_tool::chat_with_image_tool))
        .route("/client-side-tools", post(client_tools::chat_with_client_tools))
        .route("/web-search-tool", post(web_search::chat_with_web_search))
        .route("/generate-speech", post(generate_speech::generate_speech))
        .route("/transcribe-audio", post(transcribe::transcribe_audio));

    let max_upload_bytes = state.settings.max_upload_bytes;

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        // Uploaded audio files exceed axum's default 2MB body limit
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(create_cors_layer())
        // Custom request logging with trace IDs
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Create CORS layer with permissive settings for development
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([
            // Expose trace ID headers to clients
            "x-trace-id".parse().unwrap(),
            "x-request-id".parse().unwrap(),
            // The UI stream transport sniffs its protocol header
            UI_MESSAGE_STREAM_HEADER.parse().unwrap(),
        ])
}
